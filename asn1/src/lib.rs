#![forbid(unsafe_code)]

//! Semantic analysis of structured ASN.1 types: `COMPONENTS OF` expansion,
//! flattening of component lists, automatic tagging and tag checking.

mod analysis;
mod ast;
mod compiler;
mod diagnostic;
mod lexer;
mod parser;
mod token;
pub mod types;
mod util;

pub use analysis::{
    AnalysisContext, DefaultConstant, Environment, InternalError, ModuleId, ValueAssignment,
};
pub use ast::TagDefault;
pub use compiler::{AsnCompiler, Features, SourceId};
pub use diagnostic::{Diagnostic, Label, Level};
pub use lexer::LexerError;
pub use parser::ParserError;
pub use token::TokenKind;
pub use util::CowVec;
