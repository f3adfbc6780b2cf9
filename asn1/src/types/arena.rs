use super::{
    CompoundKind, Field, FieldId, StructuredTypeComponents, Tag, Type, TypeId, TypeKind,
};

/// Storage for every type and field known to the analysis.  Types and fields
/// refer to each other by id, a type owns the types of its fields and any
/// nested types.
#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<Type>,
    fields: Vec<Field>,
}

impl TypeArena {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Store a new type.  Components of a structured type are pointed back at
    /// the new type.
    pub(crate) fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(ty);

        if let TypeKind::Structured(_, components) = &mut self.types[id.0].kind {
            components.owner = Some(id);
        }

        id
    }

    pub(crate) fn alloc_field(&mut self, field: Field) -> FieldId {
        let id = FieldId(self.fields.len());
        self.fields.push(field);
        id
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0]
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0]
    }

    #[inline]
    pub(crate) fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id.0]
    }

    /// Number of types stored
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn components(&self, id: TypeId) -> Option<&StructuredTypeComponents> {
        self.get(id).components()
    }

    pub(crate) fn components_mut(&mut self, id: TypeId) -> Option<&mut StructuredTypeComponents> {
        match &mut self.get_mut(id).kind {
            TypeKind::Structured(_, components) => Some(components),
            _ => None,
        }
    }

    /// Follow type references until reaching a type that is not a reference.
    /// Unresolved references are returned as they are.
    pub fn type_refd_last(&self, id: TypeId) -> TypeId {
        let mut current = id;

        // reference cycles are broken while lowering, the bound only protects
        // against types that are still being built
        for _ in 0..=self.types.len() {
            match &self.get(current).kind {
                TypeKind::Reference {
                    target: Some(target),
                    ..
                } => current = *target,
                _ => break,
            }
        }

        current
    }

    /// Is the type erroneous, or a reference to an erroneous type
    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.type_refd_last(id)).kind,
            TypeKind::Error | TypeKind::Reference { .. }
        )
    }

    /// Was a tag written on the type itself
    pub fn is_tagged(&self, id: TypeId) -> bool {
        !self.get(id).tags.is_empty()
    }

    /// The outermost tag of the type, or its default tag if it was not tagged
    pub fn tag(&self, id: TypeId) -> Tag {
        match self.get(id).tags.last() {
            Some(tag) => tag.clone(),
            None => self.default_tag(id),
        }
    }

    /// Tag of the type when no tags are written.  An untagged `CHOICE` does
    /// not have a single tag, see [`TypeArena::has_multiple_tags`].
    pub fn default_tag(&self, id: TypeId) -> Tag {
        match &self.get(id).kind {
            TypeKind::Builtin(builtin) => Tag::universal(builtin.universal_tag()),
            TypeKind::Any => Tag::all(),
            TypeKind::Structured(CompoundKind::Sequence, _) | TypeKind::SequenceOf(_) => {
                Tag::universal(16)
            }
            TypeKind::Structured(CompoundKind::Set, _) | TypeKind::SetOf(_) => Tag::universal(17),
            TypeKind::Reference {
                target: Some(target),
                ..
            } => self.tag(*target),
            TypeKind::Structured(CompoundKind::Choice, _)
            | TypeKind::Reference { target: None, .. }
            | TypeKind::Error => Tag::error(),
        }
    }

    /// Untagged `CHOICE` types can be identified by the tag of any of their
    /// alternatives.
    pub fn has_multiple_tags(&self, id: TypeId) -> bool {
        if self.is_tagged(id) {
            return false;
        }

        match &self.get(id).kind {
            TypeKind::Structured(CompoundKind::Choice, _) => true,
            TypeKind::Reference {
                target: Some(target),
                ..
            } => self.has_multiple_tags(*target),
            _ => false,
        }
    }

    /// Can a tag on this type only be explicit, because the type itself does
    /// not have a single tag that could be replaced
    pub fn needs_explicit_tag(&self, id: TypeId) -> bool {
        match &self.get(id).kind {
            TypeKind::Any | TypeKind::Structured(CompoundKind::Choice, _) => true,
            TypeKind::Reference {
                target: Some(target),
                ..
            } => !self.is_tagged(*target) && self.needs_explicit_tag(*target),
            _ => false,
        }
    }

    /// Short description of a type for use in diagnostics
    pub fn describe(&self, id: TypeId) -> String {
        match &self.get(id).kind {
            TypeKind::Builtin(builtin) => builtin.to_string(),
            TypeKind::Any => "ANY".to_string(),
            TypeKind::Structured(kind, _) => kind.to_string(),
            TypeKind::SequenceOf(_) => "SEQUENCE OF".to_string(),
            TypeKind::SetOf(_) => "SET OF".to_string(),
            TypeKind::Reference { name, .. } => name.to_string(),
            TypeKind::Error => "<erroneous type>".to_string(),
        }
    }

    /// Deep copy of a type, including all types and fields it owns.  Type
    /// references still point at the original assignments.  The copy has not
    /// been checked and has no name or parent.  Copies of copies keep the
    /// first type as their origin.
    pub(crate) fn clone_type(&mut self, id: TypeId) -> TypeId {
        let source = self.get(id);
        let mut ty = Type {
            kind: source.kind.duplicate(),
            tags: source.tags.clone(),
            loc: source.loc.clone(),
            module: source.module,
            genname: String::new(),
            parent: None,
            origin: Some(source.origin.unwrap_or(id)),
            checked: false,
        };

        match &mut ty.kind {
            TypeKind::SequenceOf(element) | TypeKind::SetOf(element) => {
                *element = self.clone_type(*element)
            }
            TypeKind::Structured(_, components) => components.copy_owned(self),
            _ => (),
        }

        self.alloc(ty)
    }

    /// Deep copy of a field and its type
    pub(crate) fn clone_field(&mut self, id: FieldId) -> FieldId {
        let field = self.field(id).clone();
        let ty = self.clone_type(field.ty);

        self.alloc_field(Field { ty, ..field })
    }

    /// Remove all automatic tags from a type
    pub(crate) fn cut_auto_tags(&mut self, id: TypeId) {
        self.get_mut(id).tags.retain(|tag| !tag.automatic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ModuleId,
        compiler::SourceId,
        types::{
            Builtin, ComponentTypeElement, ComponentTypeList, Identifier, Location, TagClass,
        },
    };

    fn loc() -> Location {
        Location::new(SourceId(0), 0..0)
    }

    fn builtin(arena: &mut TypeArena, builtin: Builtin) -> TypeId {
        arena.alloc(Type::new(TypeKind::Builtin(builtin), loc(), ModuleId(0)))
    }

    fn field(arena: &mut TypeArena, name: &str, ty: TypeId) -> FieldId {
        arena.alloc_field(Field {
            name: Identifier::new(name),
            ty,
            optional: false,
            default: None,
            loc: loc(),
        })
    }

    fn sequence(arena: &mut TypeArena, fields: &[FieldId]) -> TypeId {
        let mut list = ComponentTypeList::new();
        for &f in fields {
            list.append(ComponentTypeElement::Field(f));
        }

        let components = StructuredTypeComponents::new(list, None, ComponentTypeList::new());
        arena.alloc(Type::new(
            TypeKind::Structured(CompoundKind::Sequence, components),
            loc(),
            ModuleId(0),
        ))
    }

    #[test]
    fn default_tags() {
        let mut arena = TypeArena::new();
        let int = builtin(&mut arena, Builtin::Integer);
        let seq = sequence(&mut arena, &[]);
        let any = arena.alloc(Type::new(TypeKind::Any, loc(), ModuleId(0)));

        assert_eq!(arena.tag(int), Tag::universal(2));
        assert_eq!(arena.tag(seq), Tag::universal(16));
        assert_eq!(arena.tag(any).class, TagClass::All);

        arena.get_mut(int).tags.push(Tag::new(TagClass::Application, 3));
        assert_eq!(arena.tag(int), Tag::new(TagClass::Application, 3));
    }

    #[test]
    fn references_use_target_tag() {
        let mut arena = TypeArena::new();
        let target = builtin(&mut arena, Builtin::Boolean);
        let reference = arena.alloc(Type::new(
            TypeKind::Reference {
                name: Identifier::new("B"),
                target: Some(target),
            },
            loc(),
            ModuleId(0),
        ));

        assert_eq!(arena.type_refd_last(reference), target);
        assert_eq!(arena.tag(reference), Tag::universal(1));
        assert!(!arena.has_multiple_tags(reference));
        assert!(!arena.is_error(reference));
    }

    #[test]
    fn cloned_fields_are_independent() {
        let mut arena = TypeArena::new();
        let int = builtin(&mut arena, Builtin::Integer);
        let inner = field(&mut arena, "inner", int);
        let seq = sequence(&mut arena, &[inner]);
        let outer = field(&mut arena, "outer", seq);

        let copy = arena.clone_field(outer);
        assert_ne!(copy, outer);

        let copy_ty = arena.field(copy).ty;
        assert_ne!(copy_ty, seq);
        assert_eq!(arena.components(copy_ty).and_then(|c| c.owner()), Some(copy_ty));

        let copy_inner = arena
            .components(copy_ty)
            .and_then(|c| c.root_before().field_at(0))
            .unwrap();
        assert_ne!(copy_inner, inner);
        assert_eq!(arena.field(copy_inner).name, Identifier::new("inner"));

        arena.get_mut(copy_ty).tags.push(Tag::automatic(0));
        arena.field_mut(copy).optional = true;
        assert!(arena.get(seq).tags.is_empty());
        assert!(!arena.field(outer).optional);
    }

    #[test]
    fn cut_auto_tags_keeps_written_tags() {
        let mut arena = TypeArena::new();
        let int = builtin(&mut arena, Builtin::Integer);
        arena.get_mut(int).tags.push(Tag::new(TagClass::Private, 1));
        arena.get_mut(int).tags.push(Tag::automatic(4));

        arena.cut_auto_tags(int);
        assert_eq!(arena.get(int).tags, [Tag::new(TagClass::Private, 1)]);
    }
}
