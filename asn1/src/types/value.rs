use std::fmt::Display;

use super::{Identifier, Location};

/// A value written in the source.  Values are only compared against the type
/// they are used with, never evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub kind: ValueKind,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Integer(i64),
    Boolean(bool),
    Null,

    /// Quoted character string, with `""` escapes removed
    CString(String),

    /// `'0101'B`, the digits only
    BString(String),

    /// `'CAFE'H`, the digits only
    HString(String),

    /// Reference to a value assignment in the same module
    Reference(Identifier),

    /// A value enclosed in braces, e.g. a `SEQUENCE` value or an object
    /// identifier.  The contents are not analysed.
    Braced,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Integer(i) => write!(f, "{i}"),
            ValueKind::Boolean(true) => write!(f, "TRUE"),
            ValueKind::Boolean(false) => write!(f, "FALSE"),
            ValueKind::Null => write!(f, "NULL"),
            ValueKind::CString(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            ValueKind::BString(s) => write!(f, "'{s}'B"),
            ValueKind::HString(s) => write!(f, "'{s}'H"),
            ValueKind::Reference(name) => write!(f, "{name}"),
            ValueKind::Braced => write!(f, "{{...}}"),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
