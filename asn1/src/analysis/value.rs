use crate::types::{Builtin, CompoundKind, TypeId, TypeKind, Value, ValueKind};

use super::context::AnalysisContext;

impl AnalysisContext<'_> {
    /// Check that a value can be used with a type.  Values are not
    /// evaluated, only their form is compared to the type.  References are
    /// followed to the referenced value.
    pub(super) fn check_value(&mut self, ty: TypeId, value: &Value) {
        let module = self.arena.get(ty).module;
        let mut value = value.clone();

        // a chain of references can be no longer than the number of values
        for _ in 0..=self.modules[module.0].values().count() {
            let ValueKind::Reference(name) = &value.kind else {
                break;
            };

            match self.modules[module.0].value_named(name) {
                Some(assignment) => {
                    value = Value {
                        kind: assignment.value.kind.clone(),
                        loc: value.loc,
                    }
                }
                None => {
                    let message = format!(
                        "There is no assignment with name `{name}' in module `{}'",
                        self.modules[module.0].name
                    );
                    self.error("0100", &value.loc, message);
                    return;
                }
            }
        }

        if let ValueKind::Reference(name) = &value.kind {
            self.error("0101", &value.loc, format!("Circular reference in value `{name}'"));
            return;
        }

        if !self.value_matches(ty, &value.kind) {
            let message = format!(
                "{} value was expected instead of {}",
                self.type_description(ty),
                value.kind
            );
            self.error("0500", &value.loc, message);
        }
    }

    /// Can a value of the given form be used with the type
    fn value_matches(&self, ty: TypeId, value: &ValueKind) -> bool {
        let target = self.arena.type_refd_last(ty);

        match (&self.arena.get(target).kind, value) {
            (TypeKind::Error | TypeKind::Reference { .. } | TypeKind::Any, _) => true,

            (TypeKind::Builtin(Builtin::Integer | Builtin::Real), ValueKind::Integer(_)) => true,
            (TypeKind::Builtin(Builtin::Boolean), ValueKind::Boolean(_)) => true,
            (TypeKind::Builtin(Builtin::Null), ValueKind::Null) => true,
            (TypeKind::Builtin(b), ValueKind::CString(_)) => b.is_string(),
            (
                TypeKind::Builtin(Builtin::BitString | Builtin::OctetString),
                ValueKind::BString(_) | ValueKind::HString(_),
            ) => true,
            (
                TypeKind::Builtin(Builtin::BitString | Builtin::ObjectIdentifier | Builtin::Real),
                ValueKind::Braced,
            ) => true,
            (
                TypeKind::Structured(CompoundKind::Sequence | CompoundKind::Set, _)
                | TypeKind::SequenceOf(_)
                | TypeKind::SetOf(_),
                ValueKind::Braced,
            ) => true,
            _ => false,
        }
    }

    /// Name of the kind of value a type expects
    fn type_description(&self, ty: TypeId) -> String {
        let target = self.arena.type_refd_last(ty);
        self.arena.describe(target)
    }
}
