use std::{error::Error, fmt::Display};

use crate::types::TypeId;

/// An inconsistency in the analysed types.  If reported to the user, this
/// would be a bug in our code, not the user's code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InternalError {
    /// The components of a structured type do not point back at the type
    MissingOwner { ty: TypeId },

    /// A structured type operation was run on some other kind of type
    NotStructured { ty: TypeId },

    /// A `CHOICE` has alternatives after the second extension marker
    ChoiceRootAfter { ty: TypeId },

    /// A `CHOICE` without any alternatives
    EmptyChoice { ty: TypeId },

    /// `COMPONENTS OF` found within a `CHOICE`
    ComponentsOfInChoice { ty: TypeId },

    /// A `COMPONENTS OF` inclusion could not be found at its recorded position
    MissingInclusion { ty: TypeId },

    /// Field index past the end of the flattened components
    FieldIndexOutOfRange {
        ty: TypeId,
        index: usize,
        count: usize,
    },
}

pub type Result<T = (), E = InternalError> = std::result::Result<T, E>;

impl Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalError::MissingOwner { ty } => {
                write!(f, "components of type {} have no owner", ty.0)
            }
            InternalError::NotStructured { ty } => {
                write!(f, "type {} is not a SEQUENCE, SET or CHOICE", ty.0)
            }
            InternalError::ChoiceRootAfter { ty } => write!(
                f,
                "CHOICE type {} has alternatives after the extension end marker",
                ty.0
            ),
            InternalError::EmptyChoice { ty } => {
                write!(f, "CHOICE type {} has no alternatives", ty.0)
            }
            InternalError::ComponentsOfInChoice { ty } => {
                write!(f, "CHOICE type {} contains COMPONENTS OF", ty.0)
            }
            InternalError::MissingInclusion { ty } => {
                write!(f, "COMPONENTS OF inclusion of type {} not found", ty.0)
            }
            InternalError::FieldIndexOutOfRange { ty, index, count } => write!(
                f,
                "field index {index} out of range for type {} with {count} fields",
                ty.0
            ),
        }
    }
}

impl Error for InternalError {}
