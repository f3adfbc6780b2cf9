//! Syntax tree produced by the parser, before any names are resolved.

mod module;
mod ty;

pub use self::{
    module::{Assignment, AssignmentKind, ModuleDefinition, TagDefault},
    ty::{
        AdditionAst, ComponentAst, ComponentListsAst, ExceptionAst, ExtensionAst, TagAst,
        TagNumberAst, TypeAst, TypeBody,
    },
};
