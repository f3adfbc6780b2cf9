//! Semantic model of ASN.1 types: the arena holding all types and fields,
//! structured type components, tags, identifiers and values.

mod arena;
mod components;
mod identifier;
mod tag;
mod value;

use std::{fmt::Display, ops::Range};

use crate::{analysis::ModuleId, compiler::SourceId};

pub use self::{
    arena::TypeArena,
    components::{
        ComponentTypeElement, ComponentTypeList, ComponentsOfInclusion, ExceptionSpec,
        ExtensionBlock, ExtensionElement, ExtensionGroup, ResolutionState,
        StructuredTypeComponents,
    },
    identifier::Identifier,
    tag::{Tag, TagClass, TagCollection, TagPlicit},
    value::{Value, ValueKind},
};

pub(crate) use self::components::{ElementPath, FlattenedComponents};

/// A byte range within a single source file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// The source file
    pub source: SourceId,

    /// Byte range into the source text
    pub span: Range<usize>,
}

impl Location {
    pub(crate) fn new(source: SourceId, span: Range<usize>) -> Self {
        Location { source, span }
    }
}

/// Reference to a type stored within the type arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) usize);

/// Reference to a field stored within the type arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub(crate) usize);

/// A single ASN.1 type
#[derive(Debug)]
pub struct Type {
    /// What kind of type this is
    pub kind: TypeKind,

    /// Tags applied to the type, index 0 is the innermost tag
    pub tags: Vec<Tag>,

    /// Where the type was written
    pub loc: Location,

    /// The module the type was defined within
    pub module: ModuleId,

    /// Generated name, used for the names of nested types and default values
    pub genname: String,

    /// The structured type containing this type as a field, if any
    pub parent: Option<TypeId>,

    /// The type this one was copied from, if it is a copy
    pub origin: Option<TypeId>,

    /// Has this type been through semantic checking
    pub(crate) checked: bool,
}

/// The possible kinds of type
#[derive(Debug)]
pub enum TypeKind {
    /// A type with no components
    Builtin(Builtin),

    /// `ANY`, which can hold a value of any tag
    Any,

    /// `SEQUENCE`, `SET` or `CHOICE` with their components
    Structured(CompoundKind, StructuredTypeComponents),

    /// `SEQUENCE OF` the contained type
    SequenceOf(TypeId),

    /// `SET OF` the contained type
    SetOf(TypeId),

    /// Reference to a type assignment.  The target is filled in once all
    /// assignments in the module are known.
    Reference {
        name: Identifier,
        target: Option<TypeId>,
    },

    /// Type that could not be analysed, used to suppress follow-on errors
    Error,
}

/// Builtin types that have no nested types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Builtin {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Real,
    Utf8String,
    NumericString,
    PrintableString,
    Ia5String,
    UtcTime,
    GeneralizedTime,
    VisibleString,
    BmpString,
}

/// Kinds of type that contain named components
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompoundKind {
    Sequence,
    Set,
    Choice,
}

/// A named member of a structured type
#[derive(Debug, Clone)]
pub struct Field {
    /// Name of the component or alternative
    pub name: Identifier,

    /// Declared type, owned by this field
    pub ty: TypeId,

    /// Was the field declared `OPTIONAL`
    pub optional: bool,

    /// Value given with `DEFAULT`
    pub default: Option<Value>,

    /// Where the field was declared, or where it was included by
    /// `COMPONENTS OF`
    pub loc: Location,
}

impl Type {
    /// Create a new, unchecked, untagged type
    pub(crate) fn new(kind: TypeKind, loc: Location, module: ModuleId) -> Self {
        Type {
            kind,
            tags: vec![],
            loc,
            module,
            genname: String::new(),
            parent: None,
            origin: None,
            checked: false,
        }
    }

    /// The components of a structured type
    pub fn components(&self) -> Option<&StructuredTypeComponents> {
        match &self.kind {
            TypeKind::Structured(_, components) => Some(components),
            _ => None,
        }
    }

    /// Is this a `SEQUENCE`, `SET` or `CHOICE` type
    pub fn compound_kind(&self) -> Option<CompoundKind> {
        match &self.kind {
            TypeKind::Structured(kind, _) => Some(*kind),
            _ => None,
        }
    }
}

impl TypeKind {
    /// Copy the kind without copying any of the types or fields it owns, the
    /// caller is responsible for replacing those with copies.
    pub(crate) fn duplicate(&self) -> TypeKind {
        match self {
            TypeKind::Builtin(b) => TypeKind::Builtin(*b),
            TypeKind::Any => TypeKind::Any,
            TypeKind::Structured(kind, components) => {
                TypeKind::Structured(*kind, components.duplicate())
            }
            TypeKind::SequenceOf(ty) => TypeKind::SequenceOf(*ty),
            TypeKind::SetOf(ty) => TypeKind::SetOf(*ty),
            TypeKind::Reference { name, target } => TypeKind::Reference {
                name: name.clone(),
                target: *target,
            },
            TypeKind::Error => TypeKind::Error,
        }
    }
}

impl Builtin {
    /// Number of the universal tag for this type
    pub fn universal_tag(self) -> u32 {
        match self {
            Builtin::Boolean => 1,
            Builtin::Integer => 2,
            Builtin::BitString => 3,
            Builtin::OctetString => 4,
            Builtin::Null => 5,
            Builtin::ObjectIdentifier => 6,
            Builtin::Real => 9,
            Builtin::Utf8String => 12,
            Builtin::NumericString => 18,
            Builtin::PrintableString => 19,
            Builtin::Ia5String => 22,
            Builtin::UtcTime => 23,
            Builtin::GeneralizedTime => 24,
            Builtin::VisibleString => 26,
            Builtin::BmpString => 30,
        }
    }

    /// Is this one of the character string or time types
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Builtin::Utf8String
                | Builtin::NumericString
                | Builtin::PrintableString
                | Builtin::Ia5String
                | Builtin::UtcTime
                | Builtin::GeneralizedTime
                | Builtin::VisibleString
                | Builtin::BmpString
        )
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Builtin::Boolean => "BOOLEAN",
            Builtin::Integer => "INTEGER",
            Builtin::BitString => "BIT STRING",
            Builtin::OctetString => "OCTET STRING",
            Builtin::Null => "NULL",
            Builtin::ObjectIdentifier => "OBJECT IDENTIFIER",
            Builtin::Real => "REAL",
            Builtin::Utf8String => "UTF8String",
            Builtin::NumericString => "NumericString",
            Builtin::PrintableString => "PrintableString",
            Builtin::Ia5String => "IA5String",
            Builtin::UtcTime => "UTCTime",
            Builtin::GeneralizedTime => "GeneralizedTime",
            Builtin::VisibleString => "VisibleString",
            Builtin::BmpString => "BMPString",
        })
    }
}

impl CompoundKind {
    /// What the members of this kind of type are called in diagnostics
    pub fn member_name(self) -> &'static str {
        match self {
            CompoundKind::Sequence | CompoundKind::Set => "component",
            CompoundKind::Choice => "alternative",
        }
    }
}

impl Display for CompoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CompoundKind::Sequence => "SEQUENCE",
            CompoundKind::Set => "SET",
            CompoundKind::Choice => "CHOICE",
        })
    }
}

impl Field {
    /// A field that is neither `OPTIONAL` nor has a `DEFAULT` value
    pub fn is_mandatory(&self) -> bool {
        !self.optional && self.default.is_none()
    }
}
