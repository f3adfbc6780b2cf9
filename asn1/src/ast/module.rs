use crate::types::{Location, Value};

use super::TypeAst;

/// A group of ASN.1 assignments and settings.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    /// Name of the module
    pub name: String,

    /// Location of the module name
    pub loc: Location,

    /// How tags without `IMPLICIT` or `EXPLICIT` are applied
    pub tag_default: TagDefault,

    /// Is extensibility implied in this module
    pub extensibility_implied: bool,

    /// All type and value assignments, in source order
    pub assignments: Vec<Assignment>,
}

/// Tagging policy written in the module header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagDefault {
    #[default]
    Explicit,
    Implicit,
    Automatic,
}

/// `Name ::= Type` or `name Type ::= value`
#[derive(Debug, Clone)]
pub struct Assignment {
    pub name: String,

    /// Location of the assigned name
    pub loc: Location,

    pub kind: AssignmentKind,
}

#[derive(Debug, Clone)]
pub enum AssignmentKind {
    Type(TypeAst),
    Value { ty: TypeAst, value: Value },
}
