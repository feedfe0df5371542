//! Python Emitter (`python-models-v1`)
//!
//! Renders the module graph as pydantic v2 models. Objects become
//! `BaseModel` classes with a `ConfigDict` extensibility line, top-level
//! aliases become `RootModel` wrappers, enums subclass `(str, Enum)` or
//! `(int, Enum)`, inheritance renders as subclassing with `Literal` tag
//! overrides, and unions render as module-level assignments (`Annotated`
//! with a `Field(discriminator=...)` when the union is discriminated).
//!
//! Recursion needs no special treatment: the header's
//! `from __future__ import annotations` makes every annotation lazy.
//!
//! Imports are derived from a feature-flag pass: each construct records the
//! names it needs while rendering, and the header is assembled afterwards.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::ir::{
    Constraints, Discriminator, EnumBase, EnumValue, Extensible, Field, Module, NodeId, NodeKind,
};
use crate::options::{CompileOptions, SemanticFormat};

use super::Profile;

pub fn render(module: &Module, profile: &Profile, options: &CompileOptions) -> Result<String> {
    let mut renderer = Renderer {
        module,
        profile,
        options,
        flags: Flags::default(),
    };

    let mut body = String::new();
    for &decl in &module.decls {
        body.push_str(&renderer.render_decl(decl)?);
    }

    let mut output = String::from("from __future__ import annotations\n\n");
    output.push_str(&renderer.header());
    output.push_str(&body);
    while output.ends_with("\n\n") {
        output.pop();
    }
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

/// Import requirements collected while rendering
#[derive(Debug, Default)]
struct Flags {
    typing: BTreeSet<&'static str>,
    uuid: bool,
    enum_: bool,
    datetime: BTreeSet<&'static str>,
    pydantic: BTreeSet<&'static str>,
}

struct Renderer<'a> {
    module: &'a Module,
    profile: &'a Profile,
    options: &'a CompileOptions,
    flags: Flags,
}

impl<'a> Renderer<'a> {
    // =========================================================================
    // Header
    // =========================================================================

    fn header(&self) -> String {
        let mut out = String::new();

        if !self.flags.typing.is_empty() {
            let names: Vec<&str> = self.flags.typing.iter().copied().collect();
            out.push_str(&format!("from typing import {}\n", names.join(", ")));
        }
        if self.flags.uuid {
            out.push_str("from uuid import UUID\n");
        }
        if self.flags.enum_ {
            out.push_str("from enum import Enum\n");
        }
        if !self.flags.datetime.is_empty() {
            let names: Vec<&str> = self.flags.datetime.iter().copied().collect();
            out.push_str(&format!("from datetime import {}\n", names.join(", ")));
        }
        if !self.flags.pydantic.is_empty() {
            let names: Vec<&str> = self.flags.pydantic.iter().copied().collect();
            out.push_str(&format!("from pydantic import {}\n", names.join(", ")));
        }

        out
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn render_decl(&mut self, id: NodeId) -> Result<String> {
        let node = self.module.node(id);
        let name = node.name.clone().unwrap_or_default();
        let doc = node.doc.clone();

        match &node.kind {
            NodeKind::Object {
                fields,
                extends: None,
                extensible,
            } => self.struct_chunk(&name, doc.as_deref(), fields, *extensible, &node.pointer),
            NodeKind::Object {
                fields,
                extends: Some(base),
                ..
            } => {
                let base_name = self
                    .module
                    .name_of(*base)
                    .unwrap_or_default()
                    .to_string();
                self.subclass_chunk(&name, doc.as_deref(), &base_name, fields, &node.pointer)
            }
            NodeKind::Enum { base, values } => {
                Ok(self.enum_chunk(&name, doc.as_deref(), *base, values))
            }
            NodeKind::Union {
                variants,
                discriminator,
            } => Ok(self.union_chunk(&name, variants, discriminator.as_ref())),
            NodeKind::Newtype { inner } => Ok(self.newtype_chunk(&name, doc.as_deref(), *inner)),
            // Remaining kinds never appear at declaration position
            _ => Ok(String::new()),
        }
    }

    fn struct_chunk(
        &mut self,
        name: &str,
        doc: Option<&str>,
        fields: &[Field],
        extensible: Extensible,
        pointer: &str,
    ) -> Result<String> {
        self.flags.pydantic.insert("BaseModel");
        self.flags.pydantic.insert("ConfigDict");

        let extra = match extensible {
            Extensible::Forbid => "forbid",
            Extensible::Allow => "allow",
            Extensible::Ignore => "ignore",
        };

        let mut out = String::from("\n");
        if let Some(doc) = doc.filter(|_| self.options.emit_docstrings) {
            out.push_str(&docstring(doc, ""));
        }
        out.push_str(&format!("class {}(BaseModel):\n", name));
        out.push_str(&format!(
            "    model_config = ConfigDict(extra=\"{}\")\n\n",
            extra
        ));

        let mut sorted: Vec<&Field> = fields.iter().collect();
        sorted.sort_by(|a, b| a.ir_name.cmp(&b.ir_name));

        let rendered: Vec<String> = sorted
            .iter()
            .map(|f| {
                self.profile
                    .escape_keyword(&f.ir_name, &self.options.reserved_suffix)
            })
            .collect();
        super::check_rendered_names(&rendered, pointer)?;

        for field in sorted {
            out.push_str(&self.field_line(field));
        }
        Ok(out)
    }

    /// Inheritance renders as subclassing: the `Literal` tag overrides come
    /// first, then the added fields
    fn subclass_chunk(
        &mut self,
        name: &str,
        doc: Option<&str>,
        base: &str,
        fields: &[Field],
        pointer: &str,
    ) -> Result<String> {
        self.flags.pydantic.insert("BaseModel");

        let mut out = String::from("\n");
        if let Some(doc) = doc.filter(|_| self.options.emit_docstrings) {
            out.push_str(&docstring(doc, ""));
        }
        out.push_str(&format!("class {}({}):\n", name, base));

        let mut tags: Vec<&Field> = fields.iter().filter(|f| f.literal.is_some()).collect();
        let mut rest: Vec<&Field> = fields.iter().filter(|f| f.literal.is_none()).collect();
        rest.sort_by(|a, b| a.ir_name.cmp(&b.ir_name));
        tags.extend(rest);

        let rendered: Vec<String> = tags
            .iter()
            .map(|f| {
                self.profile
                    .escape_keyword(&f.ir_name, &self.options.reserved_suffix)
            })
            .collect();
        super::check_rendered_names(&rendered, pointer)?;

        if tags.is_empty() {
            out.push_str("    pass\n");
        }
        for field in tags {
            out.push_str(&self.field_line(field));
        }
        Ok(out)
    }

    fn enum_chunk(
        &mut self,
        name: &str,
        doc: Option<&str>,
        base: EnumBase,
        values: &[EnumValue],
    ) -> String {
        self.flags.enum_ = true;

        let base_ty = match base {
            EnumBase::String => "str",
            EnumBase::Integer => "int",
        };

        let mut out = String::from("\n");
        if let Some(doc) = doc.filter(|_| self.options.emit_docstrings) {
            out.push_str(&docstring(doc, ""));
        }
        out.push_str(&format!("class {}({}, Enum):\n", name, base_ty));
        for value in values {
            out.push_str(&format!(
                "    {} = {}\n",
                value.symbol,
                py_literal(&value.literal)
            ));
        }
        out.push('\n');
        out
    }

    fn union_chunk(
        &mut self,
        name: &str,
        variants: &[NodeId],
        discriminator: Option<&Discriminator>,
    ) -> String {
        let rendered: Vec<String> = variants.iter().map(|&v| self.type_expr(v)).collect();

        match discriminator {
            Some(discriminator) => {
                self.flags.typing.insert("Annotated");
                self.flags.typing.insert("Union");
                self.flags.pydantic.insert("Field");
                format!(
                    "\n{} = Annotated[\n    Union[{}],\n    Field(discriminator=\"{}\"),\n]\n\n",
                    name,
                    rendered.join(", "),
                    discriminator.field
                )
            }
            None => {
                self.flags.typing.insert("Union");
                format!("\n{} = Union[{}]\n\n", name, rendered.join(", "))
            }
        }
    }

    fn newtype_chunk(&mut self, name: &str, doc: Option<&str>, inner: NodeId) -> String {
        let inner = self.module.resolve(inner);

        // Alias to another named declaration
        if let Some(target) = self.module.node(inner).name.clone() {
            return format!("\n{} = {}\n\n", name, target);
        }

        self.flags.pydantic.insert("RootModel");
        let ty = self.type_expr(inner);

        let mut out = String::new();
        if let Some(doc) = doc.filter(|_| self.options.emit_docstrings) {
            out.push_str(&docstring(doc, ""));
        }
        out.push_str(&format!("class {}(RootModel[{}]):\n    pass\n\n", name, ty));
        out
    }

    // =========================================================================
    // Fields
    // =========================================================================

    fn field_line(&mut self, field: &Field) -> String {
        let mut out = String::new();
        if let Some(doc) = field.doc.as_deref().filter(|_| self.options.emit_docstrings) {
            out.push_str(&docstring(doc, "    "));
        }

        let rendered_name = self
            .profile
            .escape_keyword(&field.ir_name, &self.options.reserved_suffix);

        let mut ty = match &field.literal {
            Some(literal) => {
                self.flags.typing.insert("Literal");
                format!("Literal[{}]", py_literal(literal))
            }
            None => self.type_expr(field.ty),
        };

        let optional = !field.required || field.nullable;
        if optional {
            ty = format!("{} | None", ty);
        }

        let mut args = Vec::new();
        if rendered_name != field.wire_name {
            args.push(format!("alias=\"{}\"", field.wire_name));
        }
        args.extend(constraint_args(&self.effective_constraints(field)));

        let suffix = if args.is_empty() {
            match (&field.default, field.required) {
                (Some(default), _) => format!(" = {}", py_literal(default)),
                (None, false) => " = None".to_string(),
                (None, true) => String::new(),
            }
        } else {
            self.flags.pydantic.insert("Field");
            match (&field.default, field.required) {
                (Some(default), _) => args.push(format!("default={}", py_literal(default))),
                (None, false) => args.push("default=None".to_string()),
                (None, true) => {}
            }
            format!(" = Field({})", args.join(", "))
        };

        out.push_str(&format!("    {}: {}{}\n", rendered_name, ty, suffix));
        out
    }

    /// Constraints visible at a use site: the annotated type's own
    /// constraints overlaid with use-site constraints from the field
    fn effective_constraints(&self, field: &Field) -> Constraints {
        let resolved = self.module.resolve(field.ty);
        let node = self.module.node(resolved);
        let base = if node.name.is_none() {
            match &node.kind {
                NodeKind::Primitive { constraints, .. } | NodeKind::Array { constraints, .. } => {
                    constraints.clone()
                }
                _ => Constraints::default(),
            }
        } else {
            Constraints::default()
        };
        base.merged_with(&field.constraints)
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn type_expr(&mut self, id: NodeId) -> String {
        let node = self.module.node(self.module.resolve(id));
        if let Some(name) = &node.name {
            return name.clone();
        }

        match &node.kind {
            NodeKind::Primitive { kind, format, .. } => {
                use crate::ir::PrimitiveKind::*;
                if let Some(format) = format {
                    return self.format_expr(*format);
                }
                match kind {
                    String => self.profile.types.string.to_string(),
                    Integer => self.profile.types.integer.to_string(),
                    Number => self.profile.types.number.to_string(),
                    Boolean => self.profile.types.boolean.to_string(),
                    Bytes => self.profile.types.bytes.to_string(),
                    Any => {
                        self.flags.typing.insert("Any");
                        self.profile.types.any.to_string()
                    }
                }
            }
            NodeKind::Array { items, .. } => {
                self.flags.typing.insert("List");
                format!("List[{}]", self.type_expr(*items))
            }
            NodeKind::Map { values } => {
                self.flags.typing.insert("Dict");
                format!("Dict[str, {}]", self.type_expr(*values))
            }
            NodeKind::Union { variants, .. } => {
                let rendered: Vec<String> = variants.iter().map(|&v| self.type_expr(v)).collect();
                rendered.join(" | ")
            }
            NodeKind::Newtype { inner } => self.type_expr(*inner),
            // Objects and enums are always promoted to named declarations
            _ => {
                self.flags.typing.insert("Any");
                self.profile.types.any.to_string()
            }
        }
    }

    fn format_expr(&mut self, format: SemanticFormat) -> String {
        match format {
            SemanticFormat::Uuid => {
                self.flags.uuid = true;
                self.profile.types.uuid.to_string()
            }
            SemanticFormat::Email => {
                self.flags.pydantic.insert("EmailStr");
                self.profile.types.email.to_string()
            }
            SemanticFormat::Uri => {
                self.flags.pydantic.insert("AnyUrl");
                self.profile.types.uri.to_string()
            }
            SemanticFormat::DateTime => {
                self.flags.datetime.insert("datetime");
                self.profile.types.datetime.to_string()
            }
            SemanticFormat::Date => {
                self.flags.datetime.insert("date");
                self.profile.types.date.to_string()
            }
            SemanticFormat::Time => {
                self.flags.datetime.insert("time");
                self.profile.types.time.to_string()
            }
            SemanticFormat::Bytes => self.profile.types.bytes.to_string(),
        }
    }
}

// =============================================================================
// Rendering helpers
// =============================================================================

/// `Field(...)` keyword arguments in canonical order
fn constraint_args(constraints: &Constraints) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(v) = constraints.minimum {
        args.push(format!("ge={}", format_number(v)));
    }
    if let Some(v) = constraints.exclusive_minimum {
        args.push(format!("gt={}", format_number(v)));
    }
    if let Some(v) = constraints.maximum {
        args.push(format!("le={}", format_number(v)));
    }
    if let Some(v) = constraints.exclusive_maximum {
        args.push(format!("lt={}", format_number(v)));
    }
    if let Some(v) = constraints.min_length.or(constraints.min_items) {
        args.push(format!("min_length={}", v));
    }
    if let Some(v) = constraints.max_length.or(constraints.max_items) {
        args.push(format!("max_length={}", v));
    }
    if let Some(v) = constraints.multiple_of {
        args.push(format!("multiple_of={}", format_number(v)));
    }
    if let Some(pattern) = &constraints.pattern {
        args.push(format!("pattern={}", py_raw_string(pattern)));
    }
    args
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn py_raw_string(value: &str) -> String {
    if !value.contains('"') && !value.ends_with('\\') {
        format!("r\"{}\"", value)
    } else {
        py_literal(&serde_json::Value::String(value.to_string()))
    }
}

/// Render a JSON literal as Python source
fn py_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(_) => serde_json::to_string(value).expect("string literal"),
        serde_json::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        serde_json::Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}: {}",
                        serde_json::to_string(k).expect("object key"),
                        py_literal(v)
                    )
                })
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

/// Triple-quoted docstring, single- or multi-line, at the given indent
fn docstring(doc: &str, indent: &str) -> String {
    let escaped = doc.replace("\"\"\"", "\\\"\\\"\\\"");
    if !escaped.contains('\n') {
        return format!("{}\"\"\"{}\"\"\"\n", indent, escaped);
    }

    let mut out = format!("{}\"\"\"\n", indent);
    for line in escaped.lines() {
        if line.is_empty() {
            out.push_str(indent);
            out.push('\n');
        } else {
            out.push_str(&format!("{}{}\n", indent, line));
        }
    }
    out.push_str(&format!("{}\"\"\"\n", indent));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_literal() {
        assert_eq!(py_literal(&serde_json::json!("created")), "\"created\"");
        assert_eq!(py_literal(&serde_json::json!(true)), "True");
        assert_eq!(py_literal(&serde_json::json!(null)), "None");
        assert_eq!(py_literal(&serde_json::json!(3)), "3");
        assert_eq!(py_literal(&serde_json::json!([1, 2])), "[1, 2]");
    }

    #[test]
    fn test_format_number_drops_trailing_zero() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(150.0), "150");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn test_constraint_arg_order() {
        let constraints = Constraints {
            minimum: Some(0.0),
            maximum: Some(100.0),
            multiple_of: Some(0.5),
            ..Constraints::default()
        };
        assert_eq!(
            constraint_args(&constraints),
            vec!["ge=0", "le=100", "multiple_of=0.5"]
        );
    }

    #[test]
    fn test_docstring_single_line() {
        assert_eq!(
            docstring("The id of the task.", "    "),
            "    \"\"\"The id of the task.\"\"\"\n"
        );
    }

    #[test]
    fn test_docstring_multi_line() {
        let rendered = docstring("First.\n\nSecond.", "    ");
        assert_eq!(
            rendered,
            "    \"\"\"\n    First.\n    \n    Second.\n    \"\"\"\n"
        );
    }
}
