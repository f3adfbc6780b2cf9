use std::collections::HashMap;

use super::{FieldId, Identifier, Location, TypeArena, TypeId, Value};

/// Progress of resolving a `COMPONENTS OF` inclusion.  Only ever moves
/// forwards, `Unresolved` to `InProgress` to `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResolutionState {
    #[default]
    Unresolved,
    InProgress,
    Resolved,
}

/// `COMPONENTS OF Type` within a component list
#[derive(Debug)]
pub struct ComponentsOfInclusion {
    /// The type named after `COMPONENTS OF`
    pub referenced: TypeId,

    /// Location of the whole inclusion
    pub loc: Location,

    /// Copies of the root components of the referenced type
    expansion: Vec<FieldId>,

    state: ResolutionState,
}

/// Entry of a root component list
#[derive(Debug)]
pub enum ComponentTypeElement {
    /// A named component
    Field(FieldId),

    /// Components copied from another type
    ComponentsOf(ComponentsOfInclusion),
}

/// Ordered list of components and `COMPONENTS OF` inclusions
#[derive(Debug, Default)]
pub struct ComponentTypeList {
    elements: Vec<ComponentTypeElement>,
}

/// Versioned group of extension additions, `[[ 2: a INTEGER, b BOOLEAN ]]`
#[derive(Debug)]
pub struct ExtensionGroup {
    pub version: Option<Value>,
    pub members: ComponentTypeList,
    pub loc: Location,
}

/// Entry in the list of extension additions
#[derive(Debug)]
pub enum ExtensionElement {
    Component(ComponentTypeElement),
    Group(ExtensionGroup),
}

/// Exception specification following an extension marker, `... ! Type : value`
#[derive(Debug)]
pub struct ExceptionSpec {
    /// The declared type, `INTEGER` if no type was written
    pub ty: TypeId,
    pub value: Value,
    pub loc: Location,
}

/// Everything between the extension markers of a structured type
#[derive(Debug)]
pub struct ExtensionBlock {
    pub exception: Option<ExceptionSpec>,
    pub additions: Vec<ExtensionElement>,

    /// Location of the first extension marker
    pub loc: Location,
}

/// The components of a `SEQUENCE`, `SET` or `CHOICE`.
///
/// Components are split into the root components written before the
/// extension marker, the extension additions and the root components after
/// the second extension marker.  `root_after` can only contain components if
/// an extension is present, and is always empty for a `CHOICE`.
#[derive(Debug, Default)]
pub struct StructuredTypeComponents {
    root_before: ComponentTypeList,
    extension: Option<ExtensionBlock>,
    root_after: ComponentTypeList,

    /// The type that contains these components
    pub(crate) owner: Option<TypeId>,

    /// Result of flattening, computed once
    pub(crate) flattened: Option<FlattenedComponents>,

    pub(crate) progress: Progress,
}

/// All fields of a structured type in declaration order, with a lookup by
/// name.  Fields with a repeated name are kept in the order but not in the
/// lookup.
#[derive(Debug, Default)]
pub(crate) struct FlattenedComponents {
    pub(crate) ordered: Vec<FieldId>,
    pub(crate) by_name: HashMap<String, FieldId>,
}

/// Memoised state of each analysis step run over a structured type
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Progress {
    /// `COMPONENTS OF` resolution of the whole type
    pub(crate) components_of: ResolutionState,

    /// Cached decision of whether automatic tags are required
    pub(crate) auto_tagging: Option<bool>,

    pub(crate) auto_tagged: bool,
    pub(crate) flattening: bool,
    pub(crate) tags_checked: bool,
}

/// Position of a single element within the component lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementPath {
    RootBefore(usize),
    RootAfter(usize),
    Extension(usize),
    Group(usize, usize),
}

impl ComponentsOfInclusion {
    pub fn new(referenced: TypeId, loc: Location) -> Self {
        ComponentsOfInclusion {
            referenced,
            loc,
            expansion: vec![],
            state: ResolutionState::Unresolved,
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// Fields inlined from the referenced type, empty until resolved
    pub fn expansion(&self) -> &[FieldId] {
        &self.expansion
    }

    pub(crate) fn begin(&mut self) {
        self.state = ResolutionState::InProgress;
    }

    pub(crate) fn finish(&mut self, fields: Vec<FieldId>) {
        self.expansion = fields;
        self.state = ResolutionState::Resolved;
    }

    fn duplicate(&self) -> Self {
        let (expansion, state) = match self.state {
            ResolutionState::Resolved => (self.expansion.clone(), ResolutionState::Resolved),
            _ => (vec![], ResolutionState::Unresolved),
        };

        ComponentsOfInclusion {
            referenced: self.referenced,
            loc: self.loc.clone(),
            expansion,
            state,
        }
    }
}

impl ComponentTypeElement {
    /// Number of fields, inclusions count zero fields while unresolved
    pub fn field_count(&self) -> usize {
        self.fields().len()
    }

    pub fn fields(&self) -> &[FieldId] {
        match self {
            ComponentTypeElement::Field(field) => std::slice::from_ref(field),
            ComponentTypeElement::ComponentsOf(inclusion) => &inclusion.expansion,
        }
    }

    fn duplicate(&self) -> Self {
        match self {
            ComponentTypeElement::Field(field) => ComponentTypeElement::Field(*field),
            ComponentTypeElement::ComponentsOf(inclusion) => {
                ComponentTypeElement::ComponentsOf(inclusion.duplicate())
            }
        }
    }

    /// Replace every owned field and type with a fresh copy
    fn copy_owned(&mut self, arena: &mut TypeArena) {
        match self {
            ComponentTypeElement::Field(field) => *field = arena.clone_field(*field),
            ComponentTypeElement::ComponentsOf(inclusion) => {
                inclusion.referenced = arena.clone_type(inclusion.referenced);
                for field in &mut inclusion.expansion {
                    *field = arena.clone_field(*field);
                }
            }
        }
    }
}

impl ComponentTypeList {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn append(&mut self, element: ComponentTypeElement) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[ComponentTypeElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of fields in the list, including resolved inclusions
    pub fn total_field_count(&self) -> usize {
        self.elements.iter().map(ComponentTypeElement::field_count).sum()
    }

    /// Get the field at the given index, counting the fields of inclusions at
    /// the position the inclusion was written.
    pub fn field_at(&self, mut index: usize) -> Option<FieldId> {
        for element in &self.elements {
            let fields = element.fields();
            if index < fields.len() {
                return Some(fields[index]);
            }
            index -= fields.len();
        }

        None
    }

    /// Iterate all fields in order
    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.elements.iter().flat_map(|e| e.fields().iter().copied())
    }

    pub fn has_field_named(&self, arena: &TypeArena, name: &str) -> bool {
        self.field_named(arena, name).is_some()
    }

    /// First field with the given name
    pub fn field_named(&self, arena: &TypeArena, name: &str) -> Option<FieldId> {
        let name = Identifier::new(name);
        self.fields().find(|&field| arena.field(field).name == name)
    }

    fn duplicate(&self) -> Self {
        ComponentTypeList {
            elements: self.elements.iter().map(ComponentTypeElement::duplicate).collect(),
        }
    }
}

impl ExtensionElement {
    /// The component elements, a group has one per member
    pub fn elements(&self) -> &[ComponentTypeElement] {
        match self {
            ExtensionElement::Component(element) => std::slice::from_ref(element),
            ExtensionElement::Group(group) => group.members.elements(),
        }
    }

    fn elements_mut(&mut self) -> &mut [ComponentTypeElement] {
        match self {
            ExtensionElement::Component(element) => std::slice::from_mut(element),
            ExtensionElement::Group(group) => &mut group.members.elements,
        }
    }

    pub fn field_count(&self) -> usize {
        self.elements().iter().map(ComponentTypeElement::field_count).sum()
    }

    fn duplicate(&self) -> Self {
        match self {
            ExtensionElement::Component(element) => ExtensionElement::Component(element.duplicate()),
            ExtensionElement::Group(group) => ExtensionElement::Group(ExtensionGroup {
                version: group.version.clone(),
                members: group.members.duplicate(),
                loc: group.loc.clone(),
            }),
        }
    }
}

impl ExtensionBlock {
    pub fn new(loc: Location) -> Self {
        ExtensionBlock {
            exception: None,
            additions: vec![],
            loc,
        }
    }

    pub fn append(&mut self, element: ExtensionElement) {
        self.additions.push(element);
    }

    /// All fields of the extension additions, with groups flattened in place
    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.additions
            .iter()
            .flat_map(ExtensionElement::elements)
            .flat_map(|e| e.fields().iter().copied())
    }

    pub fn field_count(&self) -> usize {
        self.additions.iter().map(ExtensionElement::field_count).sum()
    }

    fn duplicate(&self) -> Self {
        ExtensionBlock {
            exception: self.exception.as_ref().map(|e| ExceptionSpec {
                ty: e.ty,
                value: e.value.clone(),
                loc: e.loc.clone(),
            }),
            additions: self.additions.iter().map(ExtensionElement::duplicate).collect(),
            loc: self.loc.clone(),
        }
    }
}

impl StructuredTypeComponents {
    pub fn new(
        root_before: ComponentTypeList,
        extension: Option<ExtensionBlock>,
        root_after: ComponentTypeList,
    ) -> Self {
        StructuredTypeComponents {
            root_before,
            extension,
            root_after,
            ..Default::default()
        }
    }

    pub fn root_before(&self) -> &ComponentTypeList {
        &self.root_before
    }

    pub fn extension(&self) -> Option<&ExtensionBlock> {
        self.extension.as_ref()
    }

    pub fn root_after(&self) -> &ComponentTypeList {
        &self.root_after
    }

    /// The structured type these components belong to
    pub fn owner(&self) -> Option<TypeId> {
        self.owner
    }

    /// Was an extension marker written
    pub fn has_ellipsis(&self) -> bool {
        self.extension.is_some()
    }

    pub fn is_flattened(&self) -> bool {
        self.flattened.is_some()
    }

    /// Number of fields after flattening, zero before flattening
    pub fn field_count(&self) -> usize {
        self.flattened.as_ref().map_or(0, |f| f.ordered.len())
    }

    /// Field at a given position after flattening
    pub fn field_at(&self, index: usize) -> Option<FieldId> {
        self.flattened.as_ref()?.ordered.get(index).copied()
    }

    /// Look up a field by name after flattening
    pub fn field_named(&self, name: &str) -> Option<FieldId> {
        let name = Identifier::new(name);
        self.flattened.as_ref()?.by_name.get(name.name()).copied()
    }

    /// All flattened fields, empty before flattening
    pub fn flattened_fields(&self) -> &[FieldId] {
        match &self.flattened {
            Some(flattened) => &flattened.ordered,
            None => &[],
        }
    }

    /// Number of fields in the extension root, both before and after the
    /// extension additions
    pub fn root_field_count(&self) -> usize {
        self.root_before.total_field_count() + self.root_after.total_field_count()
    }

    pub fn root_field_at(&self, index: usize) -> Option<FieldId> {
        let before = self.root_before.total_field_count();
        if index < before {
            self.root_before.field_at(index)
        } else {
            self.root_after.field_at(index - before)
        }
    }

    /// Fields of the extension root, never extension additions
    pub fn root_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.root_before.fields().chain(self.root_after.fields())
    }

    /// All fields in declaration order, whether or not flattening has run
    pub fn all_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.root_before
            .fields()
            .chain(self.extension.iter().flat_map(ExtensionBlock::fields))
            .chain(self.root_after.fields())
    }

    /// Fields of the extension additions
    pub fn extension_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.extension.iter().flat_map(ExtensionBlock::fields)
    }

    /// Paths to all inclusions in the root lists, or in the extension
    pub(crate) fn inclusion_paths(&self, root: bool) -> Vec<ElementPath> {
        let is_inclusion = |e: &ComponentTypeElement| matches!(e, ComponentTypeElement::ComponentsOf(_));
        let mut paths = vec![];

        if root {
            for (i, e) in self.root_before.elements.iter().enumerate() {
                if is_inclusion(e) {
                    paths.push(ElementPath::RootBefore(i));
                }
            }
            for (i, e) in self.root_after.elements.iter().enumerate() {
                if is_inclusion(e) {
                    paths.push(ElementPath::RootAfter(i));
                }
            }
        } else if let Some(extension) = &self.extension {
            for (i, addition) in extension.additions.iter().enumerate() {
                match addition {
                    ExtensionElement::Component(e) if is_inclusion(e) => {
                        paths.push(ElementPath::Extension(i))
                    }
                    ExtensionElement::Component(_) => (),
                    ExtensionElement::Group(group) => {
                        for (j, e) in group.members.elements.iter().enumerate() {
                            if is_inclusion(e) {
                                paths.push(ElementPath::Group(i, j));
                            }
                        }
                    }
                }
            }
        }

        paths
    }

    fn element(&self, path: ElementPath) -> Option<&ComponentTypeElement> {
        match path {
            ElementPath::RootBefore(i) => self.root_before.elements.get(i),
            ElementPath::RootAfter(i) => self.root_after.elements.get(i),
            ElementPath::Extension(i) => match self.extension.as_ref()?.additions.get(i)? {
                ExtensionElement::Component(e) => Some(e),
                ExtensionElement::Group(_) => None,
            },
            ElementPath::Group(i, j) => match self.extension.as_ref()?.additions.get(i)? {
                ExtensionElement::Group(group) => group.members.elements.get(j),
                ExtensionElement::Component(_) => None,
            },
        }
    }

    fn element_mut(&mut self, path: ElementPath) -> Option<&mut ComponentTypeElement> {
        match path {
            ElementPath::RootBefore(i) => self.root_before.elements.get_mut(i),
            ElementPath::RootAfter(i) => self.root_after.elements.get_mut(i),
            ElementPath::Extension(i) => match self.extension.as_mut()?.additions.get_mut(i)? {
                ExtensionElement::Component(e) => Some(e),
                ExtensionElement::Group(_) => None,
            },
            ElementPath::Group(i, j) => match self.extension.as_mut()?.additions.get_mut(i)? {
                ExtensionElement::Group(group) => group.members.elements.get_mut(j),
                ExtensionElement::Component(_) => None,
            },
        }
    }

    pub(crate) fn inclusion(&self, path: ElementPath) -> Option<&ComponentsOfInclusion> {
        match self.element(path)? {
            ComponentTypeElement::ComponentsOf(inclusion) => Some(inclusion),
            ComponentTypeElement::Field(_) => None,
        }
    }

    pub(crate) fn inclusion_mut(&mut self, path: ElementPath) -> Option<&mut ComponentsOfInclusion> {
        match self.element_mut(path)? {
            ComponentTypeElement::ComponentsOf(inclusion) => Some(inclusion),
            ComponentTypeElement::Field(_) => None,
        }
    }

    /// Shallow copy that still refers to the original fields and types.
    /// Cached results are dropped so the copy is checked again.
    pub(crate) fn duplicate(&self) -> Self {
        let components_of = match self.progress.components_of {
            ResolutionState::Resolved => ResolutionState::Resolved,
            _ => ResolutionState::Unresolved,
        };

        StructuredTypeComponents {
            root_before: self.root_before.duplicate(),
            extension: self.extension.as_ref().map(ExtensionBlock::duplicate),
            root_after: self.root_after.duplicate(),
            owner: None,
            flattened: None,
            progress: Progress {
                components_of,
                auto_tagging: self.progress.auto_tagging,
                auto_tagged: self.progress.auto_tagged,
                flattening: false,
                tags_checked: false,
            },
        }
    }

    /// Replace all fields and types referred to by a duplicate with fresh
    /// copies from the arena.
    pub(crate) fn copy_owned(&mut self, arena: &mut TypeArena) {
        for element in &mut self.root_before.elements {
            element.copy_owned(arena);
        }

        if let Some(extension) = &mut self.extension {
            if let Some(exception) = &mut extension.exception {
                exception.ty = arena.clone_type(exception.ty);
            }

            for addition in &mut extension.additions {
                for element in addition.elements_mut() {
                    element.copy_owned(arena);
                }
            }
        }

        for element in &mut self.root_after.elements {
            element.copy_owned(arena);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SourceId;

    fn loc() -> Location {
        Location::new(SourceId(0), 0..0)
    }

    fn resolved(fields: &[usize]) -> ComponentTypeElement {
        let mut inclusion = ComponentsOfInclusion::new(TypeId(0), loc());
        inclusion.finish(fields.iter().copied().map(FieldId).collect());
        ComponentTypeElement::ComponentsOf(inclusion)
    }

    #[test]
    fn counts_include_resolved_inclusions() {
        let mut list = ComponentTypeList::new();
        list.append(ComponentTypeElement::Field(FieldId(1)));
        list.append(resolved(&[10, 11, 12]));
        list.append(ComponentTypeElement::ComponentsOf(ComponentsOfInclusion::new(
            TypeId(0),
            loc(),
        )));
        list.append(ComponentTypeElement::Field(FieldId(2)));

        assert_eq!(list.total_field_count(), 5);
        assert_eq!(list.field_at(0), Some(FieldId(1)));
        assert_eq!(list.field_at(1), Some(FieldId(10)));
        assert_eq!(list.field_at(3), Some(FieldId(12)));
        assert_eq!(list.field_at(4), Some(FieldId(2)));
        assert_eq!(list.field_at(5), None);
    }

    #[test]
    fn extension_groups_are_flattened_in_place() {
        let mut group = ComponentTypeList::new();
        group.append(ComponentTypeElement::Field(FieldId(3)));
        group.append(ComponentTypeElement::Field(FieldId(4)));

        let mut extension = ExtensionBlock::new(loc());
        extension.append(ExtensionElement::Component(ComponentTypeElement::Field(FieldId(2))));
        extension.append(ExtensionElement::Group(ExtensionGroup {
            version: None,
            members: group,
            loc: loc(),
        }));
        extension.append(ExtensionElement::Component(ComponentTypeElement::Field(FieldId(5))));

        let mut before = ComponentTypeList::new();
        before.append(ComponentTypeElement::Field(FieldId(1)));
        let mut after = ComponentTypeList::new();
        after.append(ComponentTypeElement::Field(FieldId(6)));

        let components = StructuredTypeComponents::new(before, Some(extension), after);
        let all: Vec<_> = components.all_fields().map(|f| f.0).collect();
        assert_eq!(all, [1, 2, 3, 4, 5, 6]);

        let root: Vec<_> = components.root_fields().map(|f| f.0).collect();
        assert_eq!(root, [1, 6]);
        assert_eq!(components.root_field_count(), 2);
        assert_eq!(components.root_field_at(1), Some(FieldId(6)));
        assert!(components.has_ellipsis());
    }

    #[test]
    fn inclusion_paths_find_groups() {
        let mut group = ComponentTypeList::new();
        group.append(ComponentTypeElement::Field(FieldId(3)));
        group.append(resolved(&[]));

        let mut extension = ExtensionBlock::new(loc());
        extension.append(ExtensionElement::Group(ExtensionGroup {
            version: None,
            members: group,
            loc: loc(),
        }));

        let mut before = ComponentTypeList::new();
        before.append(resolved(&[]));

        let components = StructuredTypeComponents::new(before, Some(extension), ComponentTypeList::new());
        assert_eq!(components.inclusion_paths(true), [ElementPath::RootBefore(0)]);
        assert_eq!(components.inclusion_paths(false), [ElementPath::Group(0, 1)]);
        assert!(components.inclusion(ElementPath::Group(0, 0)).is_none());
        assert!(components.inclusion(ElementPath::Group(0, 1)).is_some());
    }
}
