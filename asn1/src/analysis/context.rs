use std::ops::Deref;

use tracing::debug;

use crate::{
    compiler::SourceId,
    diagnostic::{Diagnostic, Label, Level},
    types::{
        CompoundKind, FieldId, Identifier, Location, StructuredTypeComponents, TypeArena, TypeId,
        TypeKind, Value,
    },
    AsnCompiler,
};

use super::{
    environment::{Environment, ModuleId},
    error::{InternalError, Result},
};

/// Data used and produced by static analysis of source files
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    compiler: &'a mut AsnCompiler,

    /// Every type and field of all modules
    pub(super) arena: TypeArena,

    /// All modules, in the order they were found
    pub(super) modules: Vec<Environment>,

    /// All problems found in the source, in the order they were found
    pub(super) diagnostics: Vec<Diagnostic>,

    /// Description of what is being checked, outermost first.  Added to
    /// every diagnostic.
    pub(super) context: Vec<String>,

    /// Types whose `COMPONENTS OF` inclusions are being resolved
    pub(super) compsof_chain: Vec<TypeId>,

    /// Tag numbers given by value references, resolved after the module has
    /// been lowered
    pub(super) pending_tag_values: Vec<PendingTagValue>,

    /// Default values that need a generated constant
    pub(super) default_constants: Vec<DefaultConstant>,
}

/// Tag of a type whose number is the value of an INTEGER value assignment
#[derive(Debug)]
pub(super) struct PendingTagValue {
    pub(super) ty: TypeId,

    /// Index into the tags of the type
    pub(super) index: usize,

    pub(super) name: Identifier,
}

/// A default value of a component registered for code generation
#[derive(Debug, Clone)]
pub struct DefaultConstant {
    /// Name of the generated constant, `const_<type>_defval_`
    pub name: String,

    /// The type of the component with the default value
    pub ty: TypeId,

    pub value: Value,
}

impl<'a> AnalysisContext<'a> {
    /// Analyse all the sources of the compiler.  Problems found in the sources
    /// are recorded as diagnostics.
    pub(crate) fn new(compiler: &'a mut AsnCompiler) -> Result<Self> {
        let mut this = Self {
            compiler,
            arena: TypeArena::new(),
            modules: vec![],
            diagnostics: vec![],
            context: vec![],
            compsof_chain: vec![],
            pending_tag_values: vec![],
            default_constants: vec![],
        };

        let sources: Vec<_> = this.compiler.all_sources().collect();
        for file in sources {
            this.add_source(file);
        }

        this.check_modules()?;

        debug!(
            modules = this.modules.len(),
            types = this.arena.len(),
            diagnostics = this.diagnostics.len(),
            "analysis finished"
        );

        Ok(this)
    }

    /// All diagnostics produced by the analysis
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Did the analysis find any errors in the source
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Storage of every analysed type and field
    pub fn types(&self) -> &TypeArena {
        &self.arena
    }

    pub fn modules(&self) -> &[Environment] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &Environment {
        &self.modules[id.0]
    }

    /// Find a type assignment by module and type name
    pub fn type_named(&self, module: &str, name: &str) -> Option<TypeId> {
        self.modules
            .iter()
            .find(|m| m.name == module)?
            .type_named(&Identifier::new(name))
    }

    /// Default values registered for generating constants
    pub fn default_constants(&self) -> &[DefaultConstant] {
        &self.default_constants
    }

    /// Number of fields of a structured type, flattening it if needed
    pub fn field_count(&mut self, ty: TypeId) -> Result<usize> {
        self.flatten_and_check(ty)?;
        Ok(self.structured(ty)?.1.field_count())
    }

    /// Field of a structured type at a position in declaration order
    pub fn field_at(&mut self, ty: TypeId, index: usize) -> Result<FieldId> {
        self.flatten_and_check(ty)?;

        let components = self.structured(ty)?.1;
        components
            .field_at(index)
            .ok_or(InternalError::FieldIndexOutOfRange {
                ty,
                index,
                count: components.field_count(),
            })
    }

    /// Field of a structured type with the given name.  If several fields
    /// have the name, the first is returned.
    pub fn field_named(&mut self, ty: TypeId, name: &str) -> Result<Option<FieldId>> {
        self.flatten_and_check(ty)?;
        Ok(self.structured(ty)?.1.field_named(name))
    }

    /// Add a new source file to the context and lower its modules
    fn add_source(&mut self, file: SourceId) {
        let modules = self.compiler.source(file).modules.clone();

        for module in &modules {
            self.lower_module(module);
        }
    }

    /// Check every assignment of every module, in source order
    fn check_modules(&mut self) -> Result {
        for module in 0..self.modules.len() {
            let types: Vec<_> = self.modules[module]
                .types()
                .map(|(name, ty)| (name.clone(), ty))
                .collect();
            for (name, ty) in types {
                debug!(module = %self.modules[module].name, %name, "checking type assignment");
                self.check_type(ty)?;
            }

            let values: Vec<_> = self.modules[module].values().cloned().collect();
            for assignment in values {
                self.check_type(assignment.ty)?;
                let context = format!("In value assignment `{}'", assignment.name);
                self.in_context(context, |this| {
                    this.check_value(assignment.ty, &assignment.value)
                });
            }
        }

        Ok(())
    }

    /// The kind and components of a structured type
    pub(super) fn structured(&self, ty: TypeId) -> Result<(CompoundKind, &StructuredTypeComponents)> {
        match &self.arena.get(ty).kind {
            TypeKind::Structured(kind, components) if components.owner() == Some(ty) => {
                Ok((*kind, components))
            }
            TypeKind::Structured(..) => Err(InternalError::MissingOwner { ty }),
            _ => Err(InternalError::NotStructured { ty }),
        }
    }

    pub(super) fn structured_mut(&mut self, ty: TypeId) -> Result<&mut StructuredTypeComponents> {
        match self.arena.components_mut(ty) {
            Some(components) if components.owner == Some(ty) => Ok(components),
            Some(_) => Err(InternalError::MissingOwner { ty }),
            None => Err(InternalError::NotStructured { ty }),
        }
    }

    /// Name of a type for use in diagnostics
    pub(super) fn type_name(&self, ty: TypeId) -> String {
        let genname = &self.arena.get(ty).genname;
        if genname.is_empty() {
            self.arena.describe(ty)
        } else {
            genname.clone()
        }
    }

    /// Run a check with an extra line of context added to its diagnostics
    pub(super) fn in_context<T>(
        &mut self,
        message: String,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.context.push(message);
        let result = f(self);
        self.context.pop();
        result
    }

    /// Record a diagnostic, adding the current context
    pub(super) fn report(&mut self, diagnostic: Diagnostic) {
        let diagnostic = self
            .context
            .iter()
            .fold(diagnostic, |d, context| d.label(context.as_str()));

        if diagnostic.level == Level::Error {
            debug!(code = %diagnostic.error_code, name = %diagnostic.name, "error reported");
        }

        self.diagnostics.push(diagnostic);
    }

    /// Report an error at a location
    pub(super) fn error(&mut self, code: &str, loc: &Location, message: String) {
        let diagnostic = Diagnostic::error(code)
            .name(message.as_str())
            .label(Label::at(loc).message(message));
        self.report(diagnostic);
    }

    /// Report a warning at a location
    pub(super) fn warning(&mut self, code: &str, loc: &Location, message: String) {
        let diagnostic = Diagnostic::warning(code)
            .name(message.as_str())
            .label(Label::at(loc).message(message));
        self.report(diagnostic);
    }
}

impl Deref for AnalysisContext<'_> {
    type Target = AsnCompiler;

    fn deref(&self) -> &Self::Target {
        self.compiler
    }
}
