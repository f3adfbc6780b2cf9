use tracing::trace;

use crate::{
    ast::TagDefault,
    types::{CompoundKind, TagClass, TagPlicit, TypeId, TypeKind},
};

use super::{
    context::AnalysisContext,
    error::{InternalError, Result},
};

impl AnalysisContext<'_> {
    /// Check a type and every type nested within it.  Each type is only
    /// checked once.
    pub fn check_type(&mut self, ty: TypeId) -> Result {
        if self.arena.get(ty).checked {
            return Ok(());
        }
        self.arena.get_mut(ty).checked = true;

        trace!(ty = ty.0, name = %self.type_name(ty), "checking type");

        self.check_plicitness(ty);

        match &self.arena.get(ty).kind {
            TypeKind::Structured(CompoundKind::Choice, _) => {
                if self.needs_auto_tags(ty)? {
                    self.assign_auto_tags(ty)?;
                }

                self.flatten_and_check(ty)?;
                if self.structured(ty)?.1.field_count() == 0 {
                    return Err(InternalError::EmptyChoice { ty });
                }

                self.check_exception(ty)?;
                self.check_tags(ty)?;
            }
            TypeKind::Structured(..) => {
                self.resolve_components_of(ty)?;
                self.flatten_and_check(ty)?;
                self.check_exception(ty)?;
                self.check_tags(ty)?;
            }
            &TypeKind::SequenceOf(element) | &TypeKind::SetOf(element) => {
                let genname = format!("{}_0", self.arena.get(ty).genname);
                let element_ty = self.arena.get_mut(element);
                element_ty.genname = genname;
                element_ty.parent = Some(ty);

                self.check_type(element)?;
            }
            &TypeKind::Reference {
                target: Some(target),
                ..
            } => self.check_type(target)?,
            _ => (),
        }

        Ok(())
    }

    /// Decide whether each tag written without `IMPLICIT` or `EXPLICIT` is
    /// implicit or explicit.  The innermost tag is explicit when the tagged
    /// type has no tag of its own that could be replaced.
    fn check_plicitness(&mut self, ty: TypeId) {
        let module = self.arena.get(ty).module;
        let explicit_default = self.modules[module.0].tag_default == TagDefault::Explicit;
        let needs_explicit = self.arena.needs_explicit_tag(ty);

        let mut implicit_errors = vec![];
        for (index, tag) in self.arena.get_mut(ty).tags.iter_mut().enumerate() {
            if tag.class == TagClass::Error {
                continue;
            }

            let inner_needs_explicit = index == 0 && needs_explicit;
            tag.plicit = match tag.plicit {
                TagPlicit::Default if explicit_default || inner_needs_explicit => {
                    TagPlicit::Explicit
                }
                TagPlicit::Default => TagPlicit::Implicit,
                TagPlicit::Implicit if inner_needs_explicit => {
                    implicit_errors.push(tag.loc.clone());
                    TagPlicit::Explicit
                }
                plicit => plicit,
            };
        }

        for loc in implicit_errors {
            let loc = loc.unwrap_or_else(|| self.arena.get(ty).loc.clone());
            self.error("0103", &loc, "Type cannot have IMPLICIT tag".to_string());
        }
    }

    /// Check the type and value of the exception specification of a
    /// structured type
    fn check_exception(&mut self, ty: TypeId) -> Result {
        let exception = self
            .structured(ty)?
            .1
            .extension()
            .and_then(|e| e.exception.as_ref())
            .map(|e| (e.ty, e.value.clone()));

        if let Some((exception_ty, value)) = exception {
            self.in_context("In exception specification".to_string(), |this| {
                this.check_type(exception_ty)?;
                this.check_value(exception_ty, &value);
                Ok(())
            })?;
        }

        Ok(())
    }
}
