//! Rust Emitter (`rust-models-v1`)
//!
//! Renders the module graph as serde structs and enums. Objects become
//! `pub struct` declarations deriving `Serialize`/`Deserialize`/`JsonSchema`,
//! inheritance renders as `#[serde(flatten)]` embedding, discriminated
//! unions as internally tagged enums, open unions as `#[serde(untagged)]`
//! enums, and back-edges are broken with `Box<T>`.
//!
//! Constraints render as schemars validation attributes; constraint kinds
//! without a schemars spelling (exclusive bounds, `multipleOf`) fail with
//! `ProfileMismatch`.

use std::collections::HashSet;

use crate::error::{CompileError, Result};
use crate::ir::{
    Constraints, Discriminator, EnumBase, EnumValue, Field, Module, NodeId, NodeKind,
};
use crate::normalize::names;
use crate::options::{CompileOptions, SemanticFormat};

use super::Profile;

const DERIVE: &str = "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]";

pub fn render(module: &Module, profile: &Profile, options: &CompileOptions) -> Result<String> {
    let renderer = Renderer {
        module,
        profile,
        options,
        tagged_variants: tagged_variant_set(module),
    };

    let mut output = String::from(
        "//! Generated by typegen - DO NOT EDIT\n\nuse serde::{Deserialize, Serialize};\nuse schemars::JsonSchema;\n",
    );

    for &decl in &module.decls {
        output.push('\n');
        output.push_str(&renderer.render_decl(decl)?);
    }

    Ok(output)
}

/// Members of discriminated unions: their structs drop the literal tag
/// field because the enclosing enum's internal tag carries it
fn tagged_variant_set(module: &Module) -> HashSet<NodeId> {
    let mut set = HashSet::new();
    for node in module.iter() {
        if let NodeKind::Union {
            variants,
            discriminator: Some(_),
        } = &node.kind
        {
            for &variant in variants {
                set.insert(module.resolve(variant));
            }
        }
    }
    set
}

struct Renderer<'a> {
    module: &'a Module,
    profile: &'a Profile,
    options: &'a CompileOptions,
    tagged_variants: HashSet<NodeId>,
}

impl<'a> Renderer<'a> {
    fn render_decl(&self, id: NodeId) -> Result<String> {
        let node = self.module.node(id);
        let name = node.name.clone().unwrap_or_default();

        match &node.kind {
            NodeKind::Object {
                fields,
                extends,
                extensible,
            } => self.render_struct(id, &name, node.doc.as_deref(), fields, *extends, *extensible),
            NodeKind::Enum { base, values } => {
                self.render_enum(&name, node.doc.as_deref(), *base, values, &node.pointer)
            }
            NodeKind::Union {
                variants,
                discriminator,
            } => self.render_union(&name, node.doc.as_deref(), variants, discriminator.as_ref()),
            NodeKind::Newtype { inner } => self.render_newtype(&name, node.doc.as_deref(), *inner),
            _ => Ok(String::new()),
        }
    }

    fn render_struct(
        &self,
        id: NodeId,
        name: &str,
        doc: Option<&str>,
        fields: &[Field],
        extends: Option<NodeId>,
        extensible: crate::ir::Extensible,
    ) -> Result<String> {
        let mut out = String::new();
        push_doc(&mut out, doc, self.options, "");
        out.push_str(DERIVE);
        out.push('\n');
        if extensible == crate::ir::Extensible::Forbid {
            out.push_str("#[serde(deny_unknown_fields)]\n");
        }
        out.push_str(&format!("pub struct {} {{\n", name));

        if let Some(base) = extends {
            let base_name = self.module.name_of(base).unwrap_or_default().to_string();
            out.push_str("    #[serde(flatten)]\n");
            out.push_str(&format!(
                "    pub {}: {},\n",
                names::field_name(&base_name),
                base_name
            ));
        }

        let drop_tags = self.tagged_variants.contains(&id);
        let mut sorted: Vec<&Field> = fields
            .iter()
            .filter(|f| !(drop_tags && f.literal.is_some()))
            .collect();
        sorted.sort_by(|a, b| a.ir_name.cmp(&b.ir_name));

        let rendered: Vec<String> = sorted
            .iter()
            .map(|f| {
                self.profile
                    .escape_keyword(&f.ir_name, &self.options.reserved_suffix)
            })
            .collect();
        super::check_rendered_names(&rendered, &self.module.node(id).pointer)?;

        for field in sorted {
            out.push_str(&self.render_field(id, field)?);
        }

        out.push_str("}\n");
        Ok(out)
    }

    fn render_field(&self, owner: NodeId, field: &Field) -> Result<String> {
        let mut out = String::new();
        push_doc(&mut out, field.doc.as_deref(), self.options, "    ");

        let rendered_name = self
            .profile
            .escape_keyword(&field.ir_name, &self.options.reserved_suffix);

        if field.wire_name != field.ir_name {
            out.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.wire_name));
        }

        let optional = !field.required || field.nullable;
        if optional {
            out.push_str("    #[serde(skip_serializing_if = \"Option::is_none\")]\n");
        }

        let constraints = self.effective_constraints(field);
        for attr in schemars_attrs(&constraints, self.profile, &field.wire_name)? {
            out.push_str(&format!("    {}\n", attr));
        }

        let mut ty = self.type_expr(field.ty, Some(owner))?;
        if optional {
            ty = format!("Option<{}>", ty);
        }

        out.push_str(&format!("    pub {}: {},\n", rendered_name, ty));
        Ok(out)
    }

    fn render_enum(
        &self,
        name: &str,
        doc: Option<&str>,
        base: EnumBase,
        values: &[EnumValue],
        pointer: &str,
    ) -> Result<String> {
        if base == EnumBase::Integer {
            return Err(CompileError::ProfileMismatch {
                profile: self.profile.name.to_string(),
                feature: "integer-backed enums".to_string(),
                pointer: pointer.to_string(),
            });
        }

        let mut out = String::new();
        push_doc(&mut out, doc, self.options, "");
        out.push_str(DERIVE);
        out.push('\n');
        out.push_str(&format!("pub enum {} {{\n", name));

        for value in values {
            let literal = value.literal.as_str().expect("string enum literal");
            let variant = names::pascal_case(&literal.to_lowercase());
            if variant != literal {
                out.push_str(&format!("    #[serde(rename = \"{}\")]\n", literal));
            }
            out.push_str(&format!("    {},\n", variant));
        }

        out.push_str("}\n");
        Ok(out)
    }

    fn render_union(
        &self,
        name: &str,
        doc: Option<&str>,
        variants: &[NodeId],
        discriminator: Option<&Discriminator>,
    ) -> Result<String> {
        let mut out = String::new();
        push_doc(&mut out, doc, self.options, "");
        out.push_str(DERIVE);
        out.push('\n');

        match discriminator {
            Some(discriminator) => {
                out.push_str(&format!("#[serde(tag = \"{}\")]\n", discriminator.field));
                out.push_str(&format!("pub enum {} {{\n", name));
                for (tag, variant) in &discriminator.mapping {
                    let variant_name = names::pascal_case(&tag.to_lowercase());
                    if variant_name != *tag {
                        out.push_str(&format!("    #[serde(rename = \"{}\")]\n", tag));
                    }
                    let ty = self.type_expr(*variant, None)?;
                    out.push_str(&format!("    {}({}),\n", variant_name, ty));
                }
            }
            None => {
                out.push_str("#[serde(untagged)]\n");
                out.push_str(&format!("pub enum {} {{\n", name));
                for (index, &variant) in variants.iter().enumerate() {
                    let ty = self.type_expr(variant, None)?;
                    let variant_name = self
                        .module
                        .name_of(variant)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("Variant{}", index + 1));
                    out.push_str(&format!("    {}({}),\n", variant_name, ty));
                }
            }
        }

        out.push_str("}\n");
        Ok(out)
    }

    fn render_newtype(&self, name: &str, doc: Option<&str>, inner: NodeId) -> Result<String> {
        let inner = self.module.resolve(inner);
        let mut out = String::new();
        push_doc(&mut out, doc, self.options, "");

        if let Some(target) = self.module.node(inner).name.clone() {
            out.push_str(&format!("pub type {} = {};\n", name, target));
            return Ok(out);
        }

        let ty = self.type_expr(inner, None)?;
        out.push_str(DERIVE);
        out.push('\n');
        out.push_str(&format!("pub struct {}(pub {});\n", name, ty));
        Ok(out)
    }

    /// Render a type reference. `owner` is the declaration whose field uses
    /// the type; a direct reference that closes a cycle gets boxed.
    fn type_expr(&self, id: NodeId, owner: Option<NodeId>) -> Result<String> {
        let resolved = self.module.resolve(id);
        let node = self.module.node(resolved);

        if let Some(name) = &node.name {
            if let Some(owner) = owner {
                if self.module.is_back_edge(owner, resolved) {
                    return Ok(format!("Box<{}>", name));
                }
            }
            return Ok(name.clone());
        }

        match &node.kind {
            NodeKind::Primitive { kind, format, .. } => {
                use crate::ir::PrimitiveKind::*;
                if let Some(format) = format {
                    return Ok(self.format_expr(*format).to_string());
                }
                Ok(match kind {
                    String => self.profile.types.string,
                    Integer => self.profile.types.integer,
                    Number => self.profile.types.number,
                    Boolean => self.profile.types.boolean,
                    Bytes => self.profile.types.bytes,
                    Any => self.profile.types.any,
                }
                .to_string())
            }
            // Vec and HashMap already provide indirection; no boxing inside
            NodeKind::Array { items, .. } => {
                Ok(format!("Vec<{}>", self.type_expr(*items, None)?))
            }
            NodeKind::Map { values } => Ok(format!(
                "std::collections::HashMap<String, {}>",
                self.type_expr(*values, None)?
            )),
            NodeKind::Union { .. } => Err(CompileError::ProfileMismatch {
                profile: self.profile.name.to_string(),
                feature: "anonymous union types".to_string(),
                pointer: node.pointer.clone(),
            }),
            NodeKind::Newtype { inner } => self.type_expr(*inner, owner),
            _ => Ok(self.profile.types.any.to_string()),
        }
    }

    fn format_expr(&self, format: SemanticFormat) -> &'static str {
        match format {
            SemanticFormat::Uuid => self.profile.types.uuid,
            SemanticFormat::Email => self.profile.types.email,
            SemanticFormat::Uri => self.profile.types.uri,
            SemanticFormat::DateTime => self.profile.types.datetime,
            SemanticFormat::Date => self.profile.types.date,
            SemanticFormat::Time => self.profile.types.time,
            SemanticFormat::Bytes => self.profile.types.bytes,
        }
    }

    /// Constraints visible at a use site (type-node constraints overlaid with
    /// use-site constraints)
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
}

// =============================================================================
// Helpers
// =============================================================================

fn push_doc(out: &mut String, doc: Option<&str>, options: &CompileOptions, indent: &str) {
    let Some(doc) = doc.filter(|_| options.emit_docstrings) else {
        return;
    };
    for line in doc.lines() {
        if line.is_empty() {
            out.push_str(&format!("{}///\n", indent));
        } else {
            out.push_str(&format!("{}/// {}\n", indent, line));
        }
    }
}

/// schemars validation attributes for the constraint set
fn schemars_attrs(
    constraints: &Constraints,
    profile: &Profile,
    field: &str,
) -> Result<Vec<String>> {
    let mut attrs = Vec::new();

    let unsupported = |feature: &str| CompileError::ProfileMismatch {
        profile: profile.name.to_string(),
        feature: feature.to_string(),
        pointer: format!("field '{}'", field),
    };

    if constraints.exclusive_minimum.is_some() || constraints.exclusive_maximum.is_some() {
        return Err(unsupported("exclusive numeric bounds"));
    }
    if constraints.multiple_of.is_some() {
        return Err(unsupported("multipleOf constraints"));
    }

    if constraints.minimum.is_some() || constraints.maximum.is_some() {
        let mut parts = Vec::new();
        if let Some(v) = constraints.minimum {
            parts.push(format!("min = {}", format_number(v)));
        }
        if let Some(v) = constraints.maximum {
            parts.push(format!("max = {}", format_number(v)));
        }
        attrs.push(format!("#[schemars(range({}))]", parts.join(", ")));
    }

    let min_len = constraints.min_length.or(constraints.min_items);
    let max_len = constraints.max_length.or(constraints.max_items);
    if min_len.is_some() || max_len.is_some() {
        let mut parts = Vec::new();
        if let Some(v) = min_len {
            parts.push(format!("min = {}", v));
        }
        if let Some(v) = max_len {
            parts.push(format!("max = {}", v));
        }
        attrs.push(format!("#[schemars(length({}))]", parts.join(", ")));
    }

    if let Some(pattern) = &constraints.pattern {
        attrs.push(format!("#[schemars(regex(pattern = r\"{}\"))]", pattern));
    }

    Ok(attrs)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemars_attrs() {
        let profile = Profile::rust_models_v1();
        let constraints = Constraints {
            minimum: Some(0.0),
            maximum: Some(150.0),
            ..Constraints::default()
        };
        let attrs = schemars_attrs(&constraints, &profile, "age").unwrap();
        assert_eq!(attrs, vec!["#[schemars(range(min = 0, max = 150))]"]);
    }

    #[test]
    fn test_exclusive_bounds_unsupported() {
        let profile = Profile::rust_models_v1();
        let constraints = Constraints {
            exclusive_minimum: Some(0.0),
            ..Constraints::default()
        };
        let err = schemars_attrs(&constraints, &profile, "rating").unwrap_err();
        assert!(matches!(err, CompileError::ProfileMismatch { .. }));
    }
}
