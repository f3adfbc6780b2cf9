use std::{collections::HashMap, ops::Range};

use tracing::{debug, trace};

use crate::{
    ast::{
        AdditionAst, Assignment, AssignmentKind, ComponentAst, ComponentListsAst, ExtensionAst,
        ModuleDefinition, TagAst, TagNumberAst, TypeAst, TypeBody,
    },
    diagnostic::{Diagnostic, Label},
    types::{
        Builtin, ComponentTypeElement, ComponentTypeList, ComponentsOfInclusion, ExceptionSpec,
        ExtensionBlock, ExtensionElement, ExtensionGroup, Field, Identifier, Location,
        StructuredTypeComponents, Tag, TagClass, Type, TypeId, TypeKind, ValueKind,
    },
};

use super::{
    context::{AnalysisContext, PendingTagValue},
    environment::{Environment, ModuleId, ValueAssignment},
};

impl AnalysisContext<'_> {
    /// Convert the syntax tree of a module into types in the arena, then
    /// resolve the names used within the module.
    pub(super) fn lower_module(&mut self, ast: &ModuleDefinition) {
        let id = ModuleId(self.modules.len());
        let first_type = self.arena.len();

        if let Some(first) = self.modules.iter().find(|m| m.name == ast.name) {
            let diagnostic = Diagnostic::error("0104")
                .name(format!("Duplicate module `{}'", ast.name))
                .label(Label::at(&ast.loc).message("Duplicate module definition"))
                .label(Label::at(&first.loc).message("Module first defined here"));
            self.report(diagnostic);
        }

        self.modules.push(Environment::new(
            ast.name.clone(),
            ast.loc.clone(),
            ast.tag_default,
            ast.extensibility_implied,
        ));

        let mut defined: HashMap<String, Location> = HashMap::new();
        for assignment in &ast.assignments {
            let name = Identifier::new(&assignment.name);

            if let Some(first) = defined.get(name.name()) {
                let diagnostic = Diagnostic::error("0105")
                    .name(format!(
                        "Duplicate assignment `{name}' in module `{}'",
                        ast.name
                    ))
                    .label(Label::at(&assignment.loc).message("Duplicate definition"))
                    .label(Label::at(first).message(format!("`{name}' is already defined here")));
                self.report(diagnostic);
                continue;
            }

            defined.insert(name.name().to_string(), assignment.loc.clone());
            self.lower_assignment(id, name, assignment);
        }

        let types = first_type..self.arena.len();
        self.resolve_type_references(id, types.clone());
        self.check_circular_references(types);
        self.resolve_tag_values(id);

        debug!(
            module = %ast.name,
            assignments = ast.assignments.len(),
            types = self.arena.len() - first_type,
            "lowered module"
        );
    }

    fn lower_assignment(&mut self, module: ModuleId, name: Identifier, assignment: &Assignment) {
        match &assignment.kind {
            AssignmentKind::Type(ty) => {
                let ty = self.lower_type(module, ty);
                self.arena.get_mut(ty).genname = name.name().to_string();
                self.modules[module.0].add_type(name, ty);
            }
            AssignmentKind::Value { ty, value } => {
                let ty = self.lower_type(module, ty);
                self.arena.get_mut(ty).genname = name.name().to_string();
                self.modules[module.0].add_value(ValueAssignment {
                    name,
                    ty,
                    value: value.clone(),
                    loc: assignment.loc.clone(),
                });
            }
        }
    }

    fn lower_type(&mut self, module: ModuleId, ast: &TypeAst) -> TypeId {
        let kind = match &ast.body {
            TypeBody::Builtin(builtin) => TypeKind::Builtin(*builtin),
            TypeBody::Any => TypeKind::Any,
            TypeBody::SequenceOf(element) => TypeKind::SequenceOf(self.lower_type(module, element)),
            TypeBody::SetOf(element) => TypeKind::SetOf(self.lower_type(module, element)),
            TypeBody::Reference(name) => TypeKind::Reference {
                name: Identifier::new(name),
                target: None,
            },
            TypeBody::Structured(kind, lists) => {
                TypeKind::Structured(*kind, self.lower_components(module, lists, &ast.loc))
            }
        };

        // tags are written outermost first, but stored innermost first
        let mut ty = Type::new(kind, ast.loc.clone(), module);
        ty.tags = ast.tags.iter().rev().map(lower_tag).collect();
        let id = self.arena.alloc(ty);

        for (index, tag) in ast.tags.iter().rev().enumerate() {
            if let TagNumberAst::Reference(name) = &tag.number {
                self.pending_tag_values.push(PendingTagValue {
                    ty: id,
                    index,
                    name: Identifier::new(name),
                });
            }
        }

        id
    }

    fn lower_components(
        &mut self,
        module: ModuleId,
        lists: &ComponentListsAst,
        loc: &Location,
    ) -> StructuredTypeComponents {
        let root_before = self.lower_component_list(module, &lists.root_before);

        let extension = match &lists.extension {
            Some(extension) => Some(self.lower_extension(module, extension)),
            None if self.modules[module.0].extensibility_implied => {
                Some(ExtensionBlock::new(loc.clone()))
            }
            None => None,
        };

        let root_after = self.lower_component_list(module, &lists.root_after);

        StructuredTypeComponents::new(root_before, extension, root_after)
    }

    fn lower_component_list(&mut self, module: ModuleId, ast: &[ComponentAst]) -> ComponentTypeList {
        let mut list = ComponentTypeList::new();
        for component in ast {
            list.append(self.lower_component(module, component));
        }
        list
    }

    fn lower_component(&mut self, module: ModuleId, ast: &ComponentAst) -> ComponentTypeElement {
        match ast {
            ComponentAst::Named {
                name,
                name_loc,
                ty,
                optional,
                default,
                ..
            } => {
                let ty = self.lower_type(module, ty);
                let field = self.arena.alloc_field(Field {
                    name: Identifier::new(name),
                    ty,
                    optional: *optional,
                    default: default.clone(),
                    loc: name_loc.clone(),
                });
                ComponentTypeElement::Field(field)
            }
            ComponentAst::ComponentsOf { ty, loc } => {
                let ty = self.lower_type(module, ty);
                ComponentTypeElement::ComponentsOf(ComponentsOfInclusion::new(ty, loc.clone()))
            }
        }
    }

    fn lower_extension(&mut self, module: ModuleId, ast: &ExtensionAst) -> ExtensionBlock {
        let mut block = ExtensionBlock::new(ast.loc.clone());

        if let Some(exception) = &ast.exception {
            let ty = match &exception.ty {
                Some(ty) => self.lower_type(module, ty),
                None => self.arena.alloc(Type::new(
                    TypeKind::Builtin(Builtin::Integer),
                    exception.loc.clone(),
                    module,
                )),
            };

            block.exception = Some(ExceptionSpec {
                ty,
                value: exception.value.clone(),
                loc: exception.loc.clone(),
            });
        }

        for addition in &ast.additions {
            let element = match addition {
                AdditionAst::Component(component) => {
                    ExtensionElement::Component(self.lower_component(module, component))
                }
                AdditionAst::Group {
                    version,
                    components,
                    loc,
                } => ExtensionElement::Group(ExtensionGroup {
                    version: version.clone(),
                    members: self.lower_component_list(module, components),
                    loc: loc.clone(),
                }),
            };
            block.append(element);
        }

        block
    }

    /// Point every type reference created for the module at its assignment
    fn resolve_type_references(&mut self, module: ModuleId, types: Range<usize>) {
        for index in types {
            let id = TypeId(index);
            let TypeKind::Reference { name, target: None } = &self.arena.get(id).kind else {
                continue;
            };
            let name = name.clone();

            let target = match self.modules[module.0].type_named(&name) {
                Some(target) => target,
                None => {
                    let loc = self.arena.get(id).loc.clone();
                    let message = format!(
                        "There is no assignment with name `{name}' in module `{}'",
                        self.modules[module.0].name
                    );
                    self.error("0100", &loc, message);
                    self.arena.alloc(Type::new(TypeKind::Error, loc, module))
                }
            };

            trace!(%name, from = id.0, to = target.0, "resolved type reference");
            if let TypeKind::Reference { target: t, .. } = &mut self.arena.get_mut(id).kind {
                *t = Some(target);
            }
        }
    }

    /// Find type assignments that refer back to themselves, e.g. `A ::= B`
    /// and `B ::= A`.  The first type of each cycle is redirected to an error
    /// type.
    fn check_circular_references(&mut self, types: Range<usize>) {
        for index in types {
            let start = TypeId(index);
            let mut chain = vec![start];
            let mut current = start;

            loop {
                let TypeKind::Reference {
                    target: Some(next), ..
                } = self.arena.get(current).kind
                else {
                    break;
                };

                if next == start {
                    let names: Vec<_> = chain
                        .iter()
                        .chain([&start])
                        .map(|&ty| format!("`{}'", self.type_name(ty)))
                        .collect();
                    let loc = self.arena.get(start).loc.clone();
                    self.error(
                        "0101",
                        &loc,
                        format!("Circular type reference: {}", names.join(" -> ")),
                    );

                    let module = self.arena.get(start).module;
                    let error = self.arena.alloc(Type::new(TypeKind::Error, loc, module));
                    if let TypeKind::Reference { target, .. } = &mut self.arena.get_mut(start).kind {
                        *target = Some(error);
                    }
                    break;
                }

                if chain.contains(&next) {
                    break;
                }

                chain.push(next);
                current = next;
            }
        }
    }

    /// Replace tag numbers written as value references with the value
    fn resolve_tag_values(&mut self, module: ModuleId) {
        let pending = std::mem::take(&mut self.pending_tag_values);

        for PendingTagValue { ty, index, name } in pending {
            let result = self.tag_value(module, &name);
            let Some(tag) = self.arena.get_mut(ty).tags.get_mut(index) else {
                continue;
            };

            match result {
                Ok(number) => tag.number = number,
                Err((code, message)) => {
                    tag.class = TagClass::Error;
                    let loc = tag.loc.clone().unwrap_or_else(|| self.arena.get(ty).loc.clone());
                    self.error(code, &loc, message);
                }
            }
        }
    }

    /// Find the value of an INTEGER value assignment used as a tag number
    fn tag_value(&self, module: ModuleId, name: &Identifier) -> Result<u32, (&'static str, String)> {
        let env = &self.modules[module.0];
        let expected = || ("0102", "INTEGER value was expected for tag value".to_string());

        let mut name = name.clone();
        for _ in 0..=env.values().count() {
            let Some(assignment) = env.value_named(&name) else {
                return Err((
                    "0100",
                    format!("There is no assignment with name `{name}' in module `{}'", env.name),
                ));
            };

            let ty = self.arena.type_refd_last(assignment.ty);
            if !matches!(self.arena.get(ty).kind, TypeKind::Builtin(Builtin::Integer)) {
                return Err(expected());
            }

            match &assignment.value.kind {
                ValueKind::Integer(number) => {
                    return u32::try_from(*number).map_err(|_| {
                        (
                            "0102",
                            format!("A non-negative INTEGER value was expected for tag value instead of {number}"),
                        )
                    })
                }
                ValueKind::Reference(next) => name = next.clone(),
                _ => return Err(expected()),
            }
        }

        Err(expected())
    }
}

fn lower_tag(ast: &TagAst) -> Tag {
    let number = match ast.number {
        TagNumberAst::Number(number) => number,
        TagNumberAst::Reference(_) => 0,
    };

    Tag {
        plicit: ast.plicit,
        loc: Some(ast.loc.clone()),
        ..Tag::new(ast.class, number)
    }
}
