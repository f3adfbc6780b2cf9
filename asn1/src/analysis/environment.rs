use std::collections::HashMap;

use crate::{
    ast::TagDefault,
    compiler::SourceId,
    types::{Identifier, Location, TypeId, Value},
};

/// Reference to a module within the analysis context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub(crate) usize);

/// Name resolution environment of a single module
#[derive(Debug)]
pub struct Environment {
    /// The name of the module as written
    pub name: String,

    /// File the module was defined in
    pub source: SourceId,

    /// Location of the module name
    pub loc: Location,

    pub tag_default: TagDefault,

    /// Structured types without an extension marker are extensible
    pub extensibility_implied: bool,

    /// Type assignments by internal name
    types: HashMap<String, TypeId>,

    /// Type assignments in source order
    type_order: Vec<(Identifier, TypeId)>,

    /// Value assignments by internal name
    values: HashMap<String, ValueAssignment>,

    /// Names of the value assignments in source order
    value_order: Vec<String>,
}

/// `name Type ::= value`
#[derive(Debug, Clone)]
pub struct ValueAssignment {
    pub name: Identifier,
    pub ty: TypeId,
    pub value: Value,
    pub loc: Location,
}

impl Environment {
    /// Create a new empty environment for a given module
    pub(crate) fn new(
        name: String,
        loc: Location,
        tag_default: TagDefault,
        extensibility_implied: bool,
    ) -> Environment {
        Environment {
            name,
            source: loc.source,
            loc,
            tag_default,
            extensibility_implied,
            types: HashMap::new(),
            type_order: vec![],
            values: HashMap::new(),
            value_order: vec![],
        }
    }

    pub(crate) fn add_type(&mut self, name: Identifier, ty: TypeId) {
        self.types.insert(name.name().to_string(), ty);
        self.type_order.push((name, ty));
    }

    pub(crate) fn add_value(&mut self, assignment: ValueAssignment) {
        let name = assignment.name.name().to_string();
        self.value_order.push(name.clone());
        self.values.insert(name, assignment);
    }

    /// Look up a type assignment by name
    pub fn type_named(&self, name: &Identifier) -> Option<TypeId> {
        self.types.get(name.name()).copied()
    }

    /// Look up a value assignment by name
    pub fn value_named(&self, name: &Identifier) -> Option<&ValueAssignment> {
        self.values.get(name.name())
    }

    /// All type assignments in the order they were written
    pub fn types(&self) -> impl Iterator<Item = (&Identifier, TypeId)> + '_ {
        self.type_order.iter().map(|(name, ty)| (name, *ty))
    }

    /// All value assignments in the order they were written
    pub fn values(&self) -> impl Iterator<Item = &ValueAssignment> + '_ {
        self.value_order.iter().filter_map(|name| self.values.get(name))
    }
}
