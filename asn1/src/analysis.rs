//! Semantic analysis of ASN.1 modules: name resolution, `COMPONENTS OF`
//! expansion, flattening of structured types and tag checking.

mod auto_tags;
mod check;
mod components_of;
mod context;
mod dump;
mod environment;
mod error;
mod flatten;
mod lower;
mod tags;
mod value;

pub use self::{
    context::{AnalysisContext, DefaultConstant},
    environment::{Environment, ModuleId, ValueAssignment},
    error::InternalError,
};
