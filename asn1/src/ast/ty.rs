use crate::types::{Builtin, CompoundKind, Location, TagClass, TagPlicit, Value};

/// A type as written in the source, with any tags in front of it
#[derive(Debug, Clone)]
pub struct TypeAst {
    /// Tags in the order written, the first tag is the outermost
    pub tags: Vec<TagAst>,
    pub body: TypeBody,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub enum TypeBody {
    Builtin(Builtin),
    Any,
    Structured(CompoundKind, ComponentListsAst),
    SequenceOf(Box<TypeAst>),
    SetOf(Box<TypeAst>),
    Reference(String),
}

/// `[APPLICATION 5] IMPLICIT`
#[derive(Debug, Clone)]
pub struct TagAst {
    pub class: TagClass,
    pub number: TagNumberAst,
    pub plicit: TagPlicit,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub enum TagNumberAst {
    Number(u32),

    /// Name of an INTEGER value assignment
    Reference(String),
}

/// The body of a `SEQUENCE`, `SET` or `CHOICE`
#[derive(Debug, Clone, Default)]
pub struct ComponentListsAst {
    pub root_before: Vec<ComponentAst>,
    pub extension: Option<ExtensionAst>,
    pub root_after: Vec<ComponentAst>,
}

#[derive(Debug, Clone)]
pub enum ComponentAst {
    Named {
        name: String,
        name_loc: Location,
        ty: TypeAst,
        optional: bool,
        default: Option<Value>,
        loc: Location,
    },
    ComponentsOf {
        ty: TypeAst,
        loc: Location,
    },
}

/// `... ! exception, additions`
#[derive(Debug, Clone)]
pub struct ExtensionAst {
    pub exception: Option<ExceptionAst>,
    pub additions: Vec<AdditionAst>,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub enum AdditionAst {
    Component(ComponentAst),
    Group {
        version: Option<Value>,
        components: Vec<ComponentAst>,
        loc: Location,
    },
}

/// `! Type : value` or `! value`
#[derive(Debug, Clone)]
pub struct ExceptionAst {
    pub ty: Option<Box<TypeAst>>,
    pub value: Value,
    pub loc: Location,
}
