use std::fmt::{self, Write};

use crate::types::{ComponentTypeList, ExtensionBlock, FieldId, TypeId, TypeKind};

use super::context::AnalysisContext;

impl AnalysisContext<'_> {
    /// Describe the components and tags of every structured type assignment,
    /// one line per component.  Nested structured types are indented below
    /// the component that contains them.
    pub fn dump_components(&self) -> String {
        let mut out = String::new();

        // writing to a string can not fail
        let _ = self.write_components(&mut out);

        out
    }

    fn write_components(&self, out: &mut impl Write) -> fmt::Result {
        for module in &self.modules {
            for (name, ty) in module.types() {
                let target = self.arena.type_refd_last(ty);
                if self.arena.get(target).components().is_none() {
                    continue;
                }

                writeln!(out, "{}.{name} ::= {}", module.name, self.describe_type(ty))?;
                self.write_structured(out, target, 1)?;
            }
        }

        Ok(())
    }

    fn write_structured(&self, out: &mut impl Write, ty: TypeId, depth: usize) -> fmt::Result {
        let Some(components) = self.arena.components(ty) else {
            return Ok(());
        };

        self.write_list(out, components.root_before(), depth)?;

        if let Some(extension) = components.extension() {
            self.write_extension(out, extension, depth)?;

            if !components.root_after().is_empty() {
                writeln!(out, "{:indent$}...", "", indent = depth * 2)?;
                self.write_list(out, components.root_after(), depth)?;
            }
        }

        Ok(())
    }

    fn write_extension(
        &self,
        out: &mut impl Write,
        extension: &ExtensionBlock,
        depth: usize,
    ) -> fmt::Result {
        write!(out, "{:indent$}...", "", indent = depth * 2)?;
        if let Some(exception) = &extension.exception {
            write!(out, " ! {} : {}", self.describe_type(exception.ty), exception.value)?;
        }
        writeln!(out)?;

        for field in extension.fields() {
            self.write_field(out, field, depth)?;
        }

        Ok(())
    }

    fn write_list(&self, out: &mut impl Write, list: &ComponentTypeList, depth: usize) -> fmt::Result {
        for field in list.fields() {
            self.write_field(out, field, depth)?;
        }

        Ok(())
    }

    fn write_field(&self, out: &mut impl Write, field: FieldId, depth: usize) -> fmt::Result {
        let field = self.arena.field(field);

        write!(
            out,
            "{:indent$}{} {}",
            "",
            field.name,
            self.describe_type(field.ty),
            indent = depth * 2
        )?;
        if field.optional {
            write!(out, " OPTIONAL")?;
        }
        if let Some(default) = &field.default {
            write!(out, " DEFAULT {default}")?;
        }
        writeln!(out)?;

        if let TypeKind::Structured(..) = self.arena.get(field.ty).kind {
            self.write_structured(out, field.ty, depth + 1)?;
        }

        Ok(())
    }

    /// Tags of a type, outermost first, followed by the type itself
    fn describe_type(&self, ty: TypeId) -> String {
        let mut out = String::new();

        for tag in self.arena.get(ty).tags.iter().rev() {
            out.push_str(&tag.to_string());
            out.push(' ');
        }

        out.push_str(&self.arena.describe(ty));
        out
    }
}
