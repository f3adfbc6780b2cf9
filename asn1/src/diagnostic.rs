use std::{error::Error, fmt::Display, ops::Range};

use crate::{compiler::SourceId, types::Location};

/// Any kind of error reported by the compiler
#[derive(Debug)]
pub struct Diagnostic {
    /// Unique error code reference
    pub error_code: String,

    /// Severity of the error
    pub level: Level,

    /// Name of the diagnostic
    pub name: String,

    /// All labels with information about this diagnostic
    pub labels: Vec<Label>,
}

/// Reference to a source file
#[derive(Debug)]
pub struct Label {
    /// The source file
    pub source: Option<SourceId>,

    /// Location within the source file that the diagnostic should be shown at.
    /// If the range is present but empty, that indicates a single character
    /// position rather than a range of characters.
    /// The range is a byte range into the source string, not a code point or
    /// character range.
    /// There is no guarantee that the range represents a valid index into the
    /// source file.
    pub location: Option<Range<usize>>,

    /// The message to display to the user.
    pub message: String,
}

/// Severity of a given diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// A fatal error
    Error,

    /// Should be fixed but the compiler can still continue.
    Warning,

    /// Notice about some code
    Note,
}

/// A result containing a diagnostic, the default error type for the compiler
pub type Result<T = ()> = std::result::Result<T, Diagnostic>;

impl Diagnostic {
    /// Create a new diagnostic
    fn new(level: Level, code: String) -> Self {
        Diagnostic {
            error_code: code,
            level,
            name: String::new(),
            labels: vec![],
        }
    }

    /// Create an error diagnostic
    pub(crate) fn error(code: impl Into<String>) -> Self {
        Self::new(Level::Error, code.into())
    }

    /// Create a warning diagnostic
    pub(crate) fn warning(code: impl Into<String>) -> Self {
        Self::new(Level::Warning, code.into())
    }

    /// Is this diagnostic an error
    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// The first label that points into a source file
    pub fn primary_location(&self) -> Option<(SourceId, Range<usize>)> {
        self.labels
            .iter()
            .find_map(|l| Some((l.source?, l.location.clone()?)))
    }

    /// Set the descriptive name of an error
    pub(crate) fn name(self, value: impl Into<String>) -> Self {
        Self {
            name: value.into(),
            ..self
        }
    }

    /// Add a label to the diagnostic
    pub(crate) fn label(mut self, label: impl Into<Label>) -> Self {
        self.labels.push(label.into());
        self
    }
}

impl Label {
    /// Create a new source label
    pub(crate) fn new() -> Label {
        Label {
            source: None,
            location: None,
            message: String::new(),
        }
    }

    /// Create a label pointing at a location
    pub(crate) fn at(loc: &Location) -> Label {
        Label::new().source(loc.source).loc(loc.span.clone())
    }

    /// Set the message for this label
    pub(crate) fn message(self, value: impl Into<String>) -> Self {
        Self {
            message: value.into(),
            ..self
        }
    }

    /// Set the source file for this label
    pub fn source(self, id: SourceId) -> Self {
        Self {
            source: Some(id),
            ..self
        }
    }

    /// Set the location within the source file for this label
    pub fn loc(self, loc: Range<usize>) -> Self {
        Self {
            location: Some(loc),
            ..self
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:04}: {}", self.level, self.error_code, self.name)?;

        for label in &self.labels {
            if let Some(source) = label.source {
                writeln!(f)?;

                write!(f, "\t{:?} [{source:?}", self.level)?;
                if let Some(location) = &label.location {
                    write!(f, "@{}..{}", location.start, location.end)?;
                }
                write!(f, "]: {}", label.message)?;
            }
        }

        for label in &self.labels {
            if label.source.is_none() {
                writeln!(f)?;
                write!(f, "\t{:?}: {}", self.level, label.message)?;
            }
        }

        Ok(())
    }
}

impl Error for Diagnostic {}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::new().message(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::new().message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_located_labels_first() {
        let diag = Diagnostic::error("0200")
            .name("Duplicate component identifier")
            .label("In type of SEQUENCE component `a'")
            .label(Label::new().source(SourceId(0)).loc(4..5).message("defined here"));

        assert_eq!(
            diag.to_string(),
            "Error 0200: Duplicate component identifier\n\
             \tError [SourceId(0)@4..5]: defined here\n\
             \tError: In type of SEQUENCE component `a'"
        );
        assert_eq!(diag.primary_location(), Some((SourceId(0), 4..5)));
    }
}
