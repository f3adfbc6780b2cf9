use tracing::trace;

use crate::types::{
    CompoundKind, FieldId, Location, Tag, TagClass, TagCollection, TypeId, TypeKind,
};

use super::{
    context::AnalysisContext,
    error::{InternalError, Result},
};

/// Fields of a structured type split by where they were declared
struct Segments {
    root_before: Vec<FieldId>,
    extension: Option<Vec<FieldId>>,
    root_after: Vec<FieldId>,
}

impl AnalysisContext<'_> {
    /// Check that the tags of the components of a structured type allow
    /// every component to be identified when decoding.  Only runs once per
    /// type.
    pub fn check_tags(&mut self, ty: TypeId) -> Result {
        let (kind, components) = self.structured(ty)?;
        if components.progress.tags_checked {
            return Ok(());
        }

        let segments = Segments {
            root_before: components.root_before().fields().collect(),
            extension: components
                .extension()
                .map(|extension| extension.fields().collect()),
            root_after: components.root_after().fields().collect(),
        };

        self.structured_mut(ty)?.progress.tags_checked = true;

        trace!(ty = %self.type_name(ty), %kind, "checking tags");

        match kind {
            CompoundKind::Choice => self.check_tags_choice(ty, segments),
            CompoundKind::Sequence => self.check_tags_sequence(ty, segments),
            CompoundKind::Set => self.check_tags_set(ty, segments),
        }
    }

    /// Alternatives of a `CHOICE` must have distinct tags, and extension
    /// alternatives must be in canonical order
    fn check_tags_choice(&mut self, ty: TypeId, segments: Segments) -> Result {
        let loc = self.arena.get(ty).loc.clone();
        let mut collection = TagCollection::new();

        for field in segments.root_before {
            self.add_distinct(ty, field, &mut collection, &loc, "0400", |name| {
                format!("Alternative `{name}' in CHOICE has non-distinct tag")
            })?;
        }

        if !segments.root_after.is_empty() {
            return Err(InternalError::ChoiceRootAfter { ty });
        }

        if let Some(extension) = segments.extension {
            self.set_extensible(&mut collection, &loc);
            self.check_extension_order(ty, &extension, &mut collection)?;
        }

        Ok(())
    }

    /// Components of a `SEQUENCE` must be identifiable within each run of
    /// optional components and the mandatory component following them
    fn check_tags_sequence(&mut self, ty: TypeId, segments: Segments) -> Result {
        let loc = self.arena.get(ty).loc.clone();
        let mut forbidden = TagCollection::new();

        for field in segments.root_before {
            let mandatory = self.arena.field(field).is_mandatory();
            self.sequence_component(ty, &mut forbidden, field, mandatory, &loc)?;
        }

        let mut root_after = segments.root_after.into_iter().peekable();

        if let Some(extension) = segments.extension {
            self.set_extensible(&mut forbidden, &loc);

            let mut window = TagCollection::new();
            self.set_extensible(&mut window, &loc);

            // root components up to and including the first mandatory one can
            // follow any of the extension additions
            while let Some(field) = root_after.next() {
                let mandatory = self.arena.field(field).is_mandatory();
                self.sequence_component(ty, &mut forbidden, field, false, &loc)?;
                self.sequence_component(ty, &mut window, field, false, &loc)?;

                if mandatory {
                    break;
                }
            }

            for field in extension {
                let mandatory = self.arena.field(field).is_mandatory();
                self.sequence_component(ty, &mut forbidden, field, mandatory, &loc)?;

                if mandatory {
                    forbidden.clear();
                    self.add_tags(&mut forbidden, &window, &loc);
                }
            }
        }

        forbidden.clear();
        for field in root_after {
            let mandatory = self.arena.field(field).is_mandatory();
            self.sequence_component(ty, &mut forbidden, field, mandatory, &loc)?;
        }

        Ok(())
    }

    /// Add the tags of one component of a `SEQUENCE` to the forbidden tags.
    /// A mandatory component ends the current window.
    fn sequence_component(
        &mut self,
        ty: TypeId,
        forbidden: &mut TagCollection,
        field: FieldId,
        mandatory: bool,
        loc: &Location,
    ) -> Result {
        let was_empty = forbidden.is_empty();

        if !mandatory || !was_empty {
            self.add_distinct(ty, field, forbidden, loc, "0402", |name| {
                format!("Tag of component `{name}' is not allowed in this context of SEQUENCE type")
            })?;
        }

        if mandatory && !was_empty {
            forbidden.clear();
        }

        Ok(())
    }

    /// Components of a `SET` must all have distinct tags, and extension
    /// components must be in canonical order
    fn check_tags_set(&mut self, ty: TypeId, segments: Segments) -> Result {
        let loc = self.arena.get(ty).loc.clone();
        let mut collection = TagCollection::new();

        for field in segments.root_before.into_iter().chain(segments.root_after) {
            self.add_distinct(ty, field, &mut collection, &loc, "0400", |name| {
                format!("Component `{name}' in SET has non-distinct tag")
            })?;
        }

        if let Some(extension) = segments.extension {
            self.set_extensible(&mut collection, &loc);
            self.check_extension_order(ty, &extension, &mut collection)?;
        }

        Ok(())
    }

    /// Add the tag or tags of a field to a collection, reporting a tag that
    /// is already present
    fn add_distinct(
        &mut self,
        container: TypeId,
        field: FieldId,
        collection: &mut TagCollection,
        loc: &Location,
        code: &str,
        message: impl FnOnce(&str) -> String,
    ) -> Result {
        let field = self.arena.field(field);
        let (name, field_ty) = (field.name.to_string(), field.ty);

        if self.arena.has_multiple_tags(field_ty) {
            let context = format!("While checking tags of `{name}'");
            return self.in_context(context, |this| {
                this.multiple_tags(container, field_ty, collection, loc)
            });
        }

        let tag = self.arena.tag(field_ty);
        if collection.has_tag(&tag) {
            let field_loc = self.arena.get(field_ty).loc.clone();
            self.error(code, &field_loc, message(&name));
        } else {
            collection.add_tag(&tag);
        }

        Ok(())
    }

    /// Extension additions of a `CHOICE` or `SET` must have distinct tags
    /// that are greater than the tags of all previous extension additions
    fn check_extension_order(
        &mut self,
        container: TypeId,
        extension: &[FieldId],
        collection: &mut TagCollection,
    ) -> Result {
        let (member, kind, previous) = match self.arena.get(container).compound_kind() {
            Some(CompoundKind::Choice) => ("Alternative", "CHOICE", "extension alternatives"),
            _ => ("Component", "SET", "extension components"),
        };
        let duplicate = |name: &str| format!("{member} `{name}' in {kind} has non-distinct tag");

        let mut greatest = Tag::new(TagClass::None, 0);

        for &field in extension {
            let (name, field_ty) = {
                let field = self.arena.field(field);
                (field.name.to_string(), field.ty)
            };
            let field_loc = self.arena.get(field_ty).loc.clone();

            if self.arena.has_multiple_tags(field_ty) {
                let mut tags = TagCollection::new();
                self.multiple_tags(container, field_ty, &mut tags, &field_loc)?;

                let (Some(smallest), Some(largest)) = (tags.smallest_tag(), tags.greatest_tag())
                else {
                    continue;
                };
                let (smallest, largest) = (smallest.clone(), largest.clone());

                if collection.has_tags(&tags) {
                    self.error("0400", &field_loc, format!("{}(s)", duplicate(&name)));
                } else {
                    self.add_tags(collection, &tags, &field_loc);
                }

                if greatest < smallest {
                    greatest = largest;
                } else {
                    let message = format!(
                        "{member} `{name}' must have canonically greater tag(s) than all previously added {previous}"
                    );
                    self.error("0401", &field_loc, message);
                }
            } else {
                let tag = self.arena.tag(field_ty);

                if collection.has_tag(&tag) {
                    self.error("0400", &field_loc, duplicate(&name));
                } else {
                    collection.add_tag(&tag);
                }

                if tag.class == TagClass::Error {
                    continue;
                }

                if greatest < tag {
                    greatest = tag;
                } else {
                    let message = format!(
                        "{member} `{name}' must have canonically greater tag than all previously added {previous}"
                    );
                    self.error("0401", &field_loc, message);
                }
            }
        }

        Ok(())
    }

    /// Collect all tags of an untagged `CHOICE` used as a component
    fn multiple_tags(
        &mut self,
        container: TypeId,
        ty: TypeId,
        collection: &mut TagCollection,
        loc: &Location,
    ) -> Result {
        let choice = self.arena.type_refd_last(ty);

        let mut chain = vec![];
        if self.arena.get(container).compound_kind() == Some(CompoundKind::Choice) {
            chain.push(container);
        }

        self.get_tags(choice, collection, &mut chain, loc)
    }

    /// Add the tags of every alternative of a `CHOICE` to a collection,
    /// following alternatives that are themselves untagged `CHOICE` types.
    /// Types already in the chain are skipped.
    pub(super) fn get_tags(
        &mut self,
        choice: TypeId,
        collection: &mut TagCollection,
        chain: &mut Vec<TypeId>,
        loc: &Location,
    ) -> Result {
        if chain.contains(&choice) {
            return Ok(());
        }
        chain.push(choice);

        if !matches!(self.arena.get(choice).kind, TypeKind::Structured(CompoundKind::Choice, _)) {
            return Err(InternalError::NotStructured { ty: choice });
        }

        self.check_type(choice)?;

        let components = self.structured(choice)?.1;
        let extensible = components.has_ellipsis();
        let alternatives: Vec<FieldId> = if components.is_flattened() {
            components.flattened_fields().to_vec()
        } else {
            components.all_fields().collect()
        };

        let choice_loc = self.arena.get(choice).loc.clone();
        for field in alternatives {
            let (name, field_ty) = {
                let field = self.arena.field(field);
                (field.name.to_string(), field.ty)
            };

            if self.arena.has_multiple_tags(field_ty) {
                let nested = self.arena.type_refd_last(field_ty);
                self.get_tags(nested, collection, chain, loc)?;
                continue;
            }

            let tag = self.arena.tag(field_ty);
            if collection.has_tag(&tag) {
                self.error(
                    "0400",
                    &choice_loc,
                    format!("Alternative `{name}' in CHOICE has non-distinct tag"),
                );
            } else {
                collection.add_tag(&tag);
            }
        }

        if extensible {
            self.set_extensible(collection, loc);
        }

        Ok(())
    }

    /// Merge the tags of a nested type into a collection, reporting two
    /// extensible sets of tags meeting
    fn add_tags(
        &mut self,
        collection: &mut TagCollection,
        tags: &TagCollection,
        loc: &Location,
    ) {
        if !collection.add_tags(tags) {
            self.error(
                "0403",
                loc,
                "Illegal use of extensibility notation (possible tag conflict)".to_string(),
            );
        }
    }

    /// Mark a collection as extensible, reporting if it already was
    fn set_extensible(&mut self, collection: &mut TagCollection, loc: &Location) {
        if !collection.set_extensible() {
            self.error(
                "0403",
                loc,
                "Illegal use of extensibility notation (possible tag conflict)".to_string(),
            );
        }
    }
}
