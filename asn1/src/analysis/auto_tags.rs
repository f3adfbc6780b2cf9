use tracing::debug;

use crate::{
    ast::TagDefault,
    types::{FieldId, Tag, TypeId},
};

use super::{context::AnalysisContext, error::Result};

impl AnalysisContext<'_> {
    /// Should the components of the type be given automatic tags.  This is
    /// the case in modules with `AUTOMATIC TAGS` when no root component has a
    /// tag.  Tagged extension additions are reported and prevent automatic
    /// tagging.
    ///
    /// The decision is made once per type.
    pub fn needs_auto_tags(&mut self, ty: TypeId) -> Result<bool> {
        let components = self.structured(ty)?.1;
        if let Some(decision) = components.progress.auto_tagging {
            return Ok(decision);
        }

        let module = self.arena.get(ty).module;
        let decision = if self.modules[module.0].tag_default != TagDefault::Automatic {
            false
        } else if components
            .root_fields()
            .any(|f| self.arena.is_tagged(self.arena.field(f).ty))
        {
            false
        } else {
            let tagged: Vec<FieldId> = components
                .extension_fields()
                .filter(|&f| self.arena.is_tagged(self.arena.field(f).ty))
                .collect();

            for &field in &tagged {
                let field = self.arena.field(field);
                let loc = self.arena.get(field.ty).loc.clone();
                let message = format!(
                    "Extension addition `{}' cannot have tags because the extension root has no tags",
                    field.name
                );
                self.error("0404", &loc, message);
            }

            tagged.is_empty()
        };

        debug!(ty = %self.type_name(ty), decision, "automatic tagging");

        self.structured_mut(ty)?.progress.auto_tagging = Some(decision);
        Ok(decision)
    }

    /// Give every component a context specific tag, numbered from zero in
    /// declaration order: the root components before the extension marker,
    /// the extension additions, then the root components after the second
    /// extension marker.  Only runs once per type.
    pub fn assign_auto_tags(&mut self, ty: TypeId) -> Result {
        let components = self.structured(ty)?.1;
        if components.progress.auto_tagged {
            return Ok(());
        }

        let fields: Vec<FieldId> = components
            .root_before()
            .fields()
            .chain(components.extension_fields())
            .chain(components.root_after().fields())
            .collect();

        for (number, &field) in (0..).zip(&fields) {
            let field_ty = self.arena.field(field).ty;
            self.arena.get_mut(field_ty).tags.push(Tag::automatic(number));
        }

        self.structured_mut(ty)?.progress.auto_tagged = true;

        debug!(ty = %self.type_name(ty), tags = fields.len(), "assigned automatic tags");
        Ok(())
    }
}
