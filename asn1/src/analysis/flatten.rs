use std::collections::HashMap;

use tracing::debug;

use crate::{
    diagnostic::{Diagnostic, Label},
    types::{FieldId, FlattenedComponents, TypeId},
};

use super::{
    context::{AnalysisContext, DefaultConstant},
    error::Result,
};

impl AnalysisContext<'_> {
    /// Collect the fields of a structured type into one list in declaration
    /// order and check their names are unique.  The type of each field and
    /// any default value are checked.
    ///
    /// A field with a repeated name is reported and kept in the list, but
    /// can not be found by name.
    pub fn flatten_and_check(&mut self, ty: TypeId) -> Result {
        let (kind, components) = self.structured(ty)?;
        if components.is_flattened() || components.progress.flattening {
            return Ok(());
        }

        let fields: Vec<FieldId> = components.all_fields().collect();
        self.structured_mut(ty)?.progress.flattening = true;

        let member = kind.member_name();
        let mut ordered = Vec::with_capacity(fields.len());
        let mut by_name: HashMap<String, FieldId> = HashMap::new();

        for field in fields {
            let name = self.arena.field(field).name.clone();

            match by_name.get(name.name()) {
                Some(&first) => {
                    let first_loc = self.arena.field(first).loc.clone();
                    let loc = self.arena.field(field).loc.clone();
                    let diagnostic = Diagnostic::error("0200")
                        .name(format!("Duplicate {member} identifier in {kind}: `{name}'"))
                        .label(
                            Label::at(&loc)
                                .message(format!("Duplicate {member} identifier in {kind}: `{name}'")),
                        )
                        .label(
                            Label::at(&first_loc)
                                .message(format!("{member} `{name}' is already defined here")),
                        );
                    self.report(diagnostic);
                }
                None => {
                    by_name.insert(name.name().to_string(), field);

                    if !name.is_reachable_from_ttcn() {
                        let loc = self.arena.field(field).loc.clone();
                        self.warning(
                            "0201",
                            &loc,
                            format!("The identifier `{name}' is not reachable from TTCN-3"),
                        );
                    }
                }
            }

            ordered.push(field);
        }

        debug!(
            ty = %self.type_name(ty),
            fields = ordered.len(),
            unique = by_name.len(),
            "flattened components"
        );

        let components = self.structured_mut(ty)?;
        components.flattened = Some(FlattenedComponents {
            ordered: ordered.clone(),
            by_name,
        });

        for field in ordered {
            self.check_field(ty, field)?;
        }

        self.structured_mut(ty)?.progress.flattening = false;
        Ok(())
    }

    /// Name and check the type and default value of a single field
    fn check_field(&mut self, owner: TypeId, field: FieldId) -> Result {
        let kind = self.structured(owner)?.0;
        let member = kind.member_name();

        let field = self.arena.field(field).clone();
        let genname = format!("{}_{}", self.arena.get(owner).genname, field.name.name());

        let ty = self.arena.get_mut(field.ty);
        ty.genname = genname.clone();
        ty.parent = Some(owner);

        let context = format!("In type of {kind} {member} `{}'", field.name);
        self.in_context(context, |this| this.check_type(field.ty))?;

        if let Some(default) = field.default {
            let context = format!("In default value of {kind} {member} `{}'", field.name);
            self.in_context(context, |this| this.check_value(field.ty, &default));

            if !self.semantic_check_only {
                self.default_constants.push(DefaultConstant {
                    name: format!("const_{genname}_defval_"),
                    ty: field.ty,
                    value: default,
                });
            }
        }

        Ok(())
    }
}
