use std::{error::Error, fmt::Display};

use crate::{
    compiler::SourceId,
    diagnostic::{Diagnostic, Label},
    lexer::LexerError,
    token::TokenKind,
    util::CowVec,
};

/// Any error that can be emitted by the parser
#[derive(Debug, Clone)]
pub enum ParserError {
    /// Unable to find one of the token kinds at a given offset into a file
    Expected {
        kind: CowVec<TokenKind>,
        got: TokenKind,
        offset: usize,
        id: SourceId,
    },

    /// Recursion depth limit reached in the parser (try to avoid stack overflow)
    ParserDepthExceeded { offset: usize, id: SourceId },

    /// An error occurred within the lexer
    LexerError(LexerError),

    /// A number does not fit the range allowed in its position
    NumberTooLarge { offset: usize, id: SourceId },

    /// Syntax that is valid elsewhere but not allowed in this position
    Restriction {
        message: &'static str,
        offset: usize,
        id: SourceId,
    },
}

pub type Result<T = (), E = ParserError> = std::result::Result<T, E>;

impl From<LexerError> for ParserError {
    fn from(value: LexerError) -> Self {
        ParserError::LexerError(value)
    }
}

impl ParserError {
    /// File and offset the error occurred at
    pub fn location(&self) -> (SourceId, usize) {
        match *self {
            ParserError::Expected { offset, id, .. }
            | ParserError::ParserDepthExceeded { offset, id }
            | ParserError::NumberTooLarge { offset, id }
            | ParserError::Restriction { offset, id, .. } => (id, offset),
            ParserError::LexerError(
                LexerError::Unrecognised { offset, file }
                | LexerError::NonTerminatedComment { offset, file }
                | LexerError::NonTerminatedString { offset, file }
                | LexerError::InvalidNumber { offset, file }
                | LexerError::InvalidString { offset, file },
            ) => (file, offset),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ParserError::Expected { .. } => "0001",
            ParserError::ParserDepthExceeded { .. } => "0002",
            ParserError::LexerError(_) => "0003",
            ParserError::NumberTooLarge { .. } => "0004",
            ParserError::Restriction { .. } => "0005",
        }
    }
}

impl Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserError::Expected { kind, got, .. } => {
                write!(f, "Expected {}, found {got}", kind.describe())
            }
            ParserError::ParserDepthExceeded { .. } => write!(f, "Types are nested too deeply"),
            ParserError::LexerError(LexerError::Unrecognised { .. }) => {
                write!(f, "Unrecognised character")
            }
            ParserError::LexerError(LexerError::NonTerminatedComment { .. }) => {
                write!(f, "Comment is not terminated")
            }
            ParserError::LexerError(LexerError::NonTerminatedString { .. }) => {
                write!(f, "String is not terminated")
            }
            ParserError::LexerError(LexerError::InvalidNumber { .. }) => {
                write!(f, "Numbers cannot have leading zeros")
            }
            ParserError::LexerError(LexerError::InvalidString { .. }) => {
                write!(f, "Invalid binary or hexadecimal string")
            }
            ParserError::NumberTooLarge { .. } => write!(f, "Number is too large"),
            ParserError::Restriction { message, .. } => write!(f, "{message}"),
        }
    }
}

impl Error for ParserError {}

impl From<&ParserError> for Diagnostic {
    fn from(value: &ParserError) -> Self {
        let (source, offset) = value.location();
        let message = value.to_string();

        Diagnostic::error(value.code())
            .name(message.clone())
            .label(Label::new().source(source).loc(offset..offset).message(message))
    }
}
