//! The primary interface to parsing and analysing ASN.1 specifications.

use std::ops::{Deref, DerefMut};

use crate::{
    analysis::{AnalysisContext, InternalError},
    ast::ModuleDefinition,
    lexer::Lexer,
    parser::{Parser, ParserError},
};

/// Store of all information relating to a whole ASN.1 specification, including
/// multiple files and their analysis.
#[derive(Debug, Clone, Default)]
pub struct AsnCompiler {
    /// List of all included source files.
    sources: Vec<Source>,

    /// The enabled features.
    features: Features,
}

/// All features that can be enabled within the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Features {
    /// Allow both upper and lowercase keywords.
    pub lowercase_keywords: bool,

    /// Allow non-ascii characters in identifiers
    pub unicode_identifiers: bool,

    /// Allow further whitespace characters
    pub unicode_whitespace: bool,

    /// Only check the source, do not collect the data needed to generate
    /// code, such as default value constants.
    pub semantic_check_only: bool,
}

/// Information relating to a single source file
#[derive(Debug, Clone)]
pub(crate) struct Source {
    /// File name and path.
    pub(crate) file_name: String,

    /// Source text of the file
    pub(crate) source: String,

    /// The modules defined in the file.
    pub(crate) modules: Vec<ModuleDefinition>,

    /// ID of the source
    pub(crate) id: SourceId,
}

/// Reference to a single source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub(crate) usize);

impl AsnCompiler {
    /// Create a new compiler
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a new file to the compiler.  The file is parsed, but no analysis
    /// is run until [`AsnCompiler::analysis`] is called.
    pub fn add_file(&mut self, file_name: String, source: String) -> Result<SourceId, ParserError> {
        let id = SourceId(self.sources.len());

        let lexer = Lexer::new(id, &source, self.features);
        let modules = Parser::new(lexer).run()?;

        tracing::debug!(file = %file_name, modules = modules.len(), "parsed source file");

        self.sources.push(Source {
            file_name,
            source,
            modules,
            id,
        });

        Ok(id)
    }

    /// Get an iterator over all source IDs
    pub(crate) fn all_sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().map(|s| s.id)
    }

    /// Get the source associated with a source id
    #[inline]
    pub(crate) fn source(&self, file: SourceId) -> &Source {
        &self.sources[file.0]
    }

    /// The file name a source was added with
    pub fn source_name(&self, file: SourceId) -> &str {
        &self.source(file).file_name
    }

    /// The text of a source file
    pub fn source_text(&self, file: SourceId) -> &str {
        &self.source(file).source
    }

    /// Run static analysis of all the provided source files.  Problems in the
    /// source are reported as diagnostics on the returned context, an error
    /// is only returned for internal compiler errors.
    pub fn analysis(&mut self) -> Result<AnalysisContext<'_>, InternalError> {
        AnalysisContext::new(self)
    }
}

impl Deref for AsnCompiler {
    type Target = Features;

    fn deref(&self) -> &Self::Target {
        &self.features
    }
}

impl DerefMut for AsnCompiler {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.features
    }
}
