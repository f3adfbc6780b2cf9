use tracing::{debug, trace};

use crate::types::{CompoundKind, ElementPath, ResolutionState, TypeId};

use super::{
    context::AnalysisContext,
    error::{InternalError, Result},
};

impl AnalysisContext<'_> {
    /// Replace every `COMPONENTS OF` inclusion of a `SEQUENCE` or `SET` with
    /// copies of the root components of the referenced type.  Runs once per
    /// type.
    ///
    /// Whether automatic tags are needed is decided before any components are
    /// included, so included components do not count as tagged.  Automatic
    /// tags are assigned once all inclusions are resolved.
    pub fn resolve_components_of(&mut self, ty: TypeId) -> Result {
        let (kind, components) = self.structured(ty)?;

        if kind == CompoundKind::Choice {
            let has_inclusions = !components.inclusion_paths(true).is_empty()
                || !components.inclusion_paths(false).is_empty();
            if has_inclusions {
                return Err(InternalError::ComponentsOfInChoice { ty });
            }
            return Ok(());
        }

        if components.progress.components_of != ResolutionState::Unresolved {
            return Ok(());
        }

        let auto_tags = self.needs_auto_tags(ty)?;

        self.structured_mut(ty)?.progress.components_of = ResolutionState::InProgress;
        self.compsof_chain.push(ty);

        let root = self.structured(ty)?.1.inclusion_paths(true);
        for path in root {
            self.resolve_inclusion(ty, kind, path)?;
        }

        self.structured_mut(ty)?.progress.components_of = ResolutionState::Resolved;

        let extension = self.structured(ty)?.1.inclusion_paths(false);
        for path in extension {
            self.resolve_inclusion(ty, kind, path)?;
        }

        self.compsof_chain.pop();

        if auto_tags {
            self.assign_auto_tags(ty)?;
        }

        trace!(ty = ty.0, name = %self.type_name(ty), "resolved COMPONENTS OF");
        Ok(())
    }

    /// Resolve a single inclusion.  On any problem the inclusion is resolved
    /// to no components.
    fn resolve_inclusion(&mut self, owner: TypeId, kind: CompoundKind, path: ElementPath) -> Result {
        let inclusion = self
            .structured(owner)?
            .1
            .inclusion(path)
            .ok_or(InternalError::MissingInclusion { ty: owner })?;

        if inclusion.state() != ResolutionState::Unresolved {
            return Ok(());
        }

        let referenced = inclusion.referenced;
        let loc = inclusion.loc.clone();

        self.structured_mut(owner)?
            .inclusion_mut(path)
            .ok_or(InternalError::MissingInclusion { ty: owner })?
            .begin();

        let target = self.arena.type_refd_last(referenced);
        let target_kind = self.arena.get(target).compound_kind();

        let mut fields = vec![];
        if self.arena.is_error(target) {
            // already reported
        } else if target_kind != Some(kind) {
            let message = format!(
                "COMPONENTS OF in a {kind} type shall refer to another {kind} type instead of `{}'",
                self.arena.describe(target)
            );
            self.error("0300", &loc, message);
        } else if self.structured(target)?.1.progress.components_of == ResolutionState::InProgress {
            let start = self
                .compsof_chain
                .iter()
                .position(|&t| t == target)
                .unwrap_or(self.compsof_chain.len().saturating_sub(1));

            let names: Vec<_> = self.compsof_chain[start..]
                .iter()
                .chain([&target])
                .map(|&t| format!("`{}'", self.type_name(t)))
                .collect();

            let message = format!("Circular reference in COMPONENTS OF: {}", names.join(" -> "));
            self.error("0301", &loc, message);
        } else if let Some(cycle) = self.nested_cycle(owner, target) {
            let names: Vec<_> = cycle
                .iter()
                .chain([&target])
                .map(|&t| format!("`{}'", self.type_name(t)))
                .collect();

            let message = format!("Circular reference in COMPONENTS OF: {}", names.join(" -> "));
            self.error("0301", &loc, message);
        } else {
            self.resolve_components_of(target)?;

            let root: Vec<_> = self.structured(target)?.1.root_fields().collect();
            for field in root {
                let copy = self.arena.clone_field(field);
                let copy_ty = self.arena.field(copy).ty;
                self.arena.cut_auto_tags(copy_ty);
                self.arena.field_mut(copy).loc = loc.clone();
                fields.push(copy);
            }
        }

        debug!(
            owner = %self.type_name(owner),
            referenced = %self.type_name(target),
            fields = fields.len(),
            "included components"
        );

        self.structured_mut(owner)?
            .inclusion_mut(path)
            .ok_or(InternalError::MissingInclusion { ty: owner })?
            .finish(fields);

        Ok(())
    }

    /// Find a type nested within itself through `COMPONENTS OF`, which would
    /// expand forever.  Either the included type encloses the owner, or the
    /// owner is a copy of one of the types enclosing it.  Returns the
    /// enclosing types from the repeated one down to the owner.
    fn nested_cycle(&self, owner: TypeId, target: TypeId) -> Option<Vec<TypeId>> {
        let mut enclosing = vec![owner];
        let mut current = owner;
        while let Some(parent) = self.arena.get(current).parent {
            if enclosing.contains(&parent) {
                break;
            }
            enclosing.push(parent);
            current = parent;
        }
        enclosing.reverse();

        let origin = |ty: TypeId| self.arena.get(ty).origin.unwrap_or(ty);
        let owner_origin = origin(owner);
        let outer = &enclosing[..enclosing.len() - 1];

        let start = outer
            .iter()
            .position(|&ty| ty == target)
            .or_else(|| outer.iter().position(|&ty| origin(ty) == owner_origin))?;

        Some(enclosing[start..].to_vec())
    }
}
