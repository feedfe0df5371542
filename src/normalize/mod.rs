//! Normalizer
//!
//! Turns the loader's resolved tree into the canonical module graph. Runs, in
//! order: name assignment, composition lowering, recursion analysis,
//! top-level alias detection, identifier sanitization, constraint
//! propagation, and topological ordering.
//!
//! The normalizer halts on the first error; every failure carries the JSON
//! Pointer of the offending schema node.

pub mod compose;
pub mod names;
pub mod recursion;

use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{CompileError, Result};
use crate::ir::{
    Constraints, EnumBase, EnumValue, Extensible, Field, Module, NodeId, NodeKind, PrimitiveKind,
};
use crate::loader::{Additional, Resolved, ResolvedDocument, SchemaNode};
use crate::options::{CompileOptions, ExtraPolicy, SemanticFormat};

use names::{NameCtx, NameTable};

/// Normalize a resolved document into an ordered module graph
pub fn normalize(
    doc: &ResolvedDocument,
    options: &CompileOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Module> {
    let mut normalizer = Normalizer {
        options,
        diagnostics,
        module: Module::new(),
        def_nodes: Vec::with_capacity(doc.defs.len()),
        decl_ids: Vec::with_capacity(doc.defs.len()),
        names: NameTable::new(),
        pending_unions: Vec::new(),
    };
    normalizer.run(doc)?;

    let mut module = normalizer.module;
    let analysis = recursion::analyze(&module, &normalizer.decl_ids);
    module.decls = analysis.order;
    module.back_edges = analysis.back_edges;

    tracing::info!(
        declarations = module.decls.len(),
        nodes = module.len(),
        "normalization complete"
    );

    Ok(module)
}

pub(crate) struct Normalizer<'a> {
    pub(crate) options: &'a CompileOptions,
    pub(crate) diagnostics: &'a mut Diagnostics,
    pub(crate) module: Module,
    /// DefId index -> declaration node
    pub(crate) def_nodes: Vec<NodeId>,
    /// All declarations (definitions plus promoted subtrees) in source order
    pub(crate) decl_ids: Vec<NodeId>,
    pub(crate) names: NameTable,
    /// Unions awaiting discriminator synthesis (runs after all definitions
    /// have lowered, since variants may be forward references)
    pub(crate) pending_unions: Vec<PendingUnion>,
}

pub(crate) struct PendingUnion {
    pub node: NodeId,
    pub declared: Option<String>,
    pub pointer: String,
}

impl<'a> Normalizer<'a> {
    fn run(&mut self, doc: &ResolvedDocument) -> Result<()> {
        // Pass (a): assign names and allocate declaration nodes up front so
        // forward and recursive references resolve to stable ids
        for (index, def) in doc.defs.iter().enumerate() {
            let is_root = doc.root == Some(crate::loader::DefId(index));
            let name = if is_root {
                self.options
                    .root_name
                    .clone()
                    .unwrap_or_else(|| names::pascal_case(&def.key))
            } else {
                names::pascal_case(&def.key)
            };

            let id = self.module.alloc(
                Some(name.clone()),
                None,
                def.pointer.clone(),
                NodeKind::Primitive {
                    kind: PrimitiveKind::Any,
                    format: None,
                    constraints: Constraints::default(),
                },
            );
            self.names.register(&name, id, &def.pointer)?;
            self.def_nodes.push(id);
            self.decl_ids.push(id);
        }

        // Pass (b): lower each definition body in place
        for (index, def) in doc.defs.iter().enumerate() {
            let id = self.def_nodes[index];
            let name = self
                .module
                .node(id)
                .name
                .clone()
                .expect("declarations are named");
            let (kind, doc_text) = self.lower_def(&def.schema, &name)?;
            let node = self.module.node_mut(id);
            node.kind = kind;
            node.doc = doc_text;

            if let NodeKind::Union { .. } = self.module.node(id).kind {
                if let Resolved::Node(schema) = &def.schema {
                    self.pending_unions.push(PendingUnion {
                        node: id,
                        declared: schema.discriminator.clone(),
                        pointer: schema.pointer.clone(),
                    });
                }
            }
        }

        // Pass (d): top-level primitive/array/map declarations become newtypes
        self.wrap_alias_decls();
        self.collapse_newtype_chains();

        // Discriminator synthesis now that every variant has a body
        compose::resolve_discriminators(self)?;
        self.validate_extends()?;
        self.validate_constraint_attachment()?;
        self.check_patterns();

        Ok(())
    }

    /// Lower a definition body, returning its kind and docstring
    fn lower_def(&mut self, schema: &Resolved, decl_name: &str) -> Result<(NodeKind, Option<String>)> {
        match schema {
            Resolved::Any => {
                let inner = self.alloc_any();
                Ok((NodeKind::Newtype { inner }, None))
            }
            Resolved::Nothing => {
                self.diagnostics.warning(
                    "",
                    DiagnosticKind::NothingSchema,
                    format!("'{}' is a false schema; treated as any value", decl_name),
                );
                let inner = self.alloc_any();
                Ok((NodeKind::Newtype { inner }, None))
            }
            Resolved::Node(node) => {
                if let Some(reference) = node.reference {
                    let inner = self.def_nodes[reference.0];
                    return Ok((NodeKind::Newtype { inner }, node.description.clone()));
                }
                let ctx = NameCtx::root(decl_name);
                let kind = self.lower_kind(node, &ctx)?;
                Ok((kind, node.description.clone()))
            }
        }
    }

    /// Pass (b)/(f): lower one schema node to an IR kind
    pub(crate) fn lower_kind(&mut self, node: &SchemaNode, ctx: &NameCtx) -> Result<NodeKind> {
        if !node.all_of.is_empty() {
            let kind = compose::lower_all_of(self, node, ctx)?;
            return Ok(kind);
        }
        if !node.one_of.is_empty() || !node.any_of.is_empty() {
            return compose::lower_union(self, node, ctx);
        }
        if node.enum_values.is_some() {
            return self.lower_enum(node);
        }
        if let Some(value) = &node.const_value {
            return self.lower_const(value, &node.pointer);
        }

        match node.ty.as_deref() {
            Some("object") => self.lower_object(node, ctx),
            None if !node.properties.is_empty() => self.lower_object(node, ctx),
            Some("array") => {
                let items = match &node.items {
                    Some(items) => self.lower_nested(items, &ctx.items())?,
                    None => self.alloc_any(),
                };
                Ok(NodeKind::Array {
                    items,
                    constraints: node.constraints.clone(),
                })
            }
            Some("string") => {
                let format = node
                    .format
                    .as_deref()
                    .and_then(|f| self.options.semantic_format(f));
                if format == Some(SemanticFormat::Bytes) {
                    return Ok(NodeKind::Primitive {
                        kind: PrimitiveKind::Bytes,
                        format: None,
                        constraints: node.constraints.clone(),
                    });
                }
                Ok(NodeKind::Primitive {
                    kind: PrimitiveKind::String,
                    format,
                    constraints: node.constraints.clone(),
                })
            }
            Some("integer") => Ok(self.primitive(PrimitiveKind::Integer, node)),
            Some("number") => Ok(self.primitive(PrimitiveKind::Number, node)),
            Some("boolean") => Ok(self.primitive(PrimitiveKind::Boolean, node)),
            Some("null") | None => Ok(self.primitive(PrimitiveKind::Any, node)),
            Some(other) => Err(CompileError::CannotLower {
                reason: format!("unsupported type '{}'", other),
                pointer: node.pointer.clone(),
            }),
        }
    }

    fn primitive(&self, kind: PrimitiveKind, node: &SchemaNode) -> NodeKind {
        NodeKind::Primitive {
            kind,
            format: None,
            constraints: node.constraints.clone(),
        }
    }

    fn lower_object(&mut self, node: &SchemaNode, ctx: &NameCtx) -> Result<NodeKind> {
        if node.properties.is_empty() {
            return match &node.additional {
                Some(Additional::Bool(false)) => Ok(NodeKind::Object {
                    fields: Vec::new(),
                    extends: None,
                    extensible: Extensible::Forbid,
                }),
                Some(Additional::Schema(values)) => {
                    let values = self.lower_nested(values, &ctx.map_value())?;
                    Ok(NodeKind::Map { values })
                }
                Some(Additional::Bool(true)) | None => {
                    let values = self.alloc_any();
                    Ok(NodeKind::Map { values })
                }
            };
        }

        let fields = self.build_fields(&node.properties, &node.required, ctx, &node.pointer)?;
        Ok(NodeKind::Object {
            fields,
            extends: None,
            extensible: self.extensible_of(node.additional.as_ref()),
        })
    }

    pub(crate) fn extensible_of(&self, additional: Option<&Additional>) -> Extensible {
        match additional {
            Some(Additional::Bool(false)) => Extensible::Forbid,
            Some(Additional::Bool(true)) | Some(Additional::Schema(_)) => Extensible::Allow,
            None => match self.options.extra_policy {
                ExtraPolicy::Forbid => Extensible::Forbid,
                ExtraPolicy::Allow => Extensible::Allow,
                ExtraPolicy::Ignore => Extensible::Ignore,
            },
        }
    }

    /// Pass (e) is folded in here: wire names are sanitized into canonical IR
    /// names as fields are built
    pub(crate) fn build_fields(
        &mut self,
        properties: &IndexMap<String, Resolved>,
        required: &[String],
        ctx: &NameCtx,
        owner_pointer: &str,
    ) -> Result<Vec<Field>> {
        let mut fields: Vec<Field> = Vec::with_capacity(properties.len());

        for (wire, prop) in properties {
            let ir_name = names::field_name(wire);
            if fields.iter().any(|f| f.ir_name == ir_name) {
                return Err(CompileError::NameCollision {
                    name: ir_name,
                    pointer: format!("{}/properties/{}", owner_pointer, wire),
                });
            }

            let mut field = Field {
                ir_name,
                wire_name: wire.clone(),
                ty: NodeId(0),
                required: required.iter().any(|r| r == wire),
                default: None,
                literal: None,
                nullable: false,
                constraints: Constraints::default(),
                doc: None,
            };

            match prop {
                Resolved::Any => {
                    field.ty = self.alloc_any();
                    self.warn_any_content(owner_pointer, wire);
                }
                Resolved::Nothing => {
                    field.ty = self.alloc_any();
                    self.diagnostics.warning(
                        format!("{}/properties/{}", owner_pointer, wire),
                        DiagnosticKind::NothingSchema,
                        "false schema used as a field type; treated as any value",
                    );
                }
                Resolved::Node(node) => {
                    field.nullable = node.nullable;
                    field.default = node.default.clone();
                    field.doc = node.description.clone();

                    if let Some(value) = &node.const_value {
                        // Literal tag field
                        field.literal = Some(value.clone());
                        field.required = true;
                        field.ty = self.alloc_literal_type(value);
                    } else if let Some(reference) = node.reference {
                        field.ty = self.def_nodes[reference.0];
                        // Use-site constraints attach to the field, per the
                        // constraint-propagation rule for $ref targets
                        field.constraints = node.constraints.clone();
                    } else {
                        field.ty = self.lower_nested(prop, &ctx.property(wire))?;
                        if node.ty.is_none() && !node.has_shape() {
                            self.warn_any_content(owner_pointer, wire);
                        }
                    }
                }
            }

            fields.push(field);
        }

        Ok(fields)
    }

    fn warn_any_content(&mut self, owner_pointer: &str, wire: &str) {
        self.diagnostics.warning(
            format!("{}/properties/{}", owner_pointer, wire),
            DiagnosticKind::AnyContent,
            format!("field '{}' is unconstrained; emitted as any", wire),
        );
    }

    /// Lower a nested schema position to a node id, promoting anonymous
    /// objects and enums to named declarations
    pub(crate) fn lower_nested(&mut self, schema: &Resolved, ctx: &NameCtx) -> Result<NodeId> {
        match schema {
            Resolved::Any => Ok(self.alloc_any()),
            Resolved::Nothing => Ok(self.alloc_any()),
            Resolved::Node(node) => {
                if let Some(reference) = node.reference {
                    return Ok(self.def_nodes[reference.0]);
                }

                let kind = self.lower_kind(node, ctx)?;
                let promote = matches!(kind, NodeKind::Object { .. } | NodeKind::Enum { .. });
                let id = if promote {
                    let name = ctx.synthesized();
                    let id = self.module.alloc(
                        Some(name.clone()),
                        node.description.clone(),
                        node.pointer.clone(),
                        kind,
                    );
                    self.names.register(&name, id, &node.pointer)?;
                    self.decl_ids.push(id);
                    id
                } else {
                    self.module
                        .alloc(None, node.description.clone(), node.pointer.clone(), kind)
                };

                if matches!(self.module.node(id).kind, NodeKind::Union { .. }) {
                    self.pending_unions.push(PendingUnion {
                        node: id,
                        declared: node.discriminator.clone(),
                        pointer: node.pointer.clone(),
                    });
                }

                Ok(id)
            }
        }
    }

    fn lower_enum(&mut self, node: &SchemaNode) -> Result<NodeKind> {
        let values = node.enum_values.as_ref().expect("checked by caller");
        if values.is_empty() {
            return Err(CompileError::EmptyEnum {
                pointer: node.pointer.clone(),
            });
        }
        self.enum_from_literals(values, &node.pointer)
    }

    fn lower_const(&mut self, value: &serde_json::Value, pointer: &str) -> Result<NodeKind> {
        self.enum_from_literals(std::slice::from_ref(value), pointer)
    }

    pub(crate) fn enum_from_literals(
        &mut self,
        values: &[serde_json::Value],
        pointer: &str,
    ) -> Result<NodeKind> {
        let base = if values.iter().all(|v| v.is_string()) {
            EnumBase::String
        } else if values.iter().all(|v| v.is_i64()) {
            EnumBase::Integer
        } else {
            return Err(CompileError::CannotLower {
                reason: "enum values must be all strings or all integers".to_string(),
                pointer: pointer.to_string(),
            });
        };

        let mut out = Vec::with_capacity(values.len());
        for value in values {
            let symbol = match base {
                EnumBase::String => names::enum_symbol(value.as_str().expect("string literal")),
                EnumBase::Integer => names::int_enum_symbol(value.as_i64().expect("int literal")),
            };
            if out.iter().any(|v: &EnumValue| v.symbol == symbol) {
                return Err(CompileError::NameCollision {
                    name: symbol,
                    pointer: pointer.to_string(),
                });
            }
            out.push(EnumValue {
                literal: value.clone(),
                symbol,
            });
        }

        Ok(NodeKind::Enum { base, values: out })
    }

    fn alloc_any(&mut self) -> NodeId {
        self.module.alloc(
            None,
            None,
            String::new(),
            NodeKind::Primitive {
                kind: PrimitiveKind::Any,
                format: None,
                constraints: Constraints::default(),
            },
        )
    }

    fn alloc_literal_type(&mut self, literal: &serde_json::Value) -> NodeId {
        let kind = match literal {
            serde_json::Value::String(_) => PrimitiveKind::String,
            serde_json::Value::Bool(_) => PrimitiveKind::Boolean,
            serde_json::Value::Number(n) if n.is_i64() => PrimitiveKind::Integer,
            serde_json::Value::Number(_) => PrimitiveKind::Number,
            _ => PrimitiveKind::Any,
        };
        self.module.alloc(
            None,
            None,
            String::new(),
            NodeKind::Primitive {
                kind,
                format: None,
                constraints: Constraints::default(),
            },
        )
    }

    /// Pass (d): a definition whose body is a bare primitive, array, or map
    /// becomes a transparent named wrapper
    fn wrap_alias_decls(&mut self) {
        for index in 0..self.def_nodes.len() {
            let id = self.def_nodes[index];
            let wrap = matches!(
                self.module.node(id).kind,
                NodeKind::Primitive { .. } | NodeKind::Array { .. } | NodeKind::Map { .. }
            );
            if !wrap {
                continue;
            }
            let node = self.module.node(id);
            let (doc, pointer, kind) = (node.doc.clone(), node.pointer.clone(), node.kind.clone());
            let inner = self.module.alloc(None, doc, pointer, kind);
            self.module.node_mut(id).kind = NodeKind::Newtype { inner };
        }
    }

    /// Invariant 5: a newtype's inner is never another newtype
    fn collapse_newtype_chains(&mut self) {
        for index in 0..self.decl_ids.len() {
            let id = self.decl_ids[index];
            loop {
                let NodeKind::Newtype { inner } = self.module.node(id).kind else {
                    break;
                };
                let target = self.module.resolve(inner);
                let NodeKind::Newtype { inner: deeper } = self.module.node(target).kind else {
                    break;
                };
                self.module.node_mut(id).kind = NodeKind::Newtype { inner: deeper };
            }
        }
    }

    /// Inheritance bases must be named object declarations
    fn validate_extends(&self) -> Result<()> {
        for node in self.module.iter() {
            if let NodeKind::Object {
                extends: Some(base), ..
            } = &node.kind
            {
                let base = self.module.resolve(*base);
                let base_node = self.module.node(base);
                let is_named_object =
                    base_node.name.is_some() && matches!(base_node.kind, NodeKind::Object { .. });
                if !is_named_object {
                    return Err(CompileError::CannotLower {
                        reason: "allOf base must be a named object declaration".to_string(),
                        pointer: node.pointer.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Pass (f) validation: a constraint written at a `$ref` use site needs a
    /// carrier on the referent. Primitive, array, and map targets take it;
    /// object, enum, and union targets have no position for one.
    fn validate_constraint_attachment(&self) -> Result<()> {
        for node in self.module.iter() {
            let NodeKind::Object { fields, .. } = &node.kind else {
                continue;
            };
            for field in fields {
                if field.constraints.is_empty() {
                    continue;
                }
                let mut target = self.module.resolve(field.ty);
                // Transparent wrappers pass the constraint through to the
                // shape they wrap
                if let NodeKind::Newtype { inner } = &self.module.node(target).kind {
                    target = self.module.resolve(*inner);
                }
                let attachable = matches!(
                    self.module.node(target).kind,
                    NodeKind::Primitive { .. } | NodeKind::Array { .. } | NodeKind::Map { .. }
                );
                if !attachable {
                    return Err(CompileError::UnattachableConstraint {
                        constraint: field.constraints.first_keyword().to_string(),
                        pointer: format!("{}/properties/{}", node.pointer, field.wire_name),
                    });
                }
            }
        }
        Ok(())
    }

    /// Syntax-check `pattern` constraints; invalid patterns degrade to a
    /// warning because the emitted code treats them as opaque strings
    fn check_patterns(&mut self) {
        let mut findings: Vec<(String, String, String)> = Vec::new();
        for node in self.module.iter() {
            let mut check = |pattern: &Option<String>, pointer: &str| {
                if let Some(pattern) = pattern {
                    if let Err(err) = regex::Regex::new(pattern) {
                        findings.push((pointer.to_string(), pattern.clone(), err.to_string()));
                    }
                }
            };
            match &node.kind {
                NodeKind::Primitive { constraints, .. } | NodeKind::Array { constraints, .. } => {
                    check(&constraints.pattern, &node.pointer);
                }
                NodeKind::Object { fields, .. } => {
                    for field in fields {
                        check(&field.constraints.pattern, &node.pointer);
                    }
                }
                _ => {}
            }
        }
        for (pointer, pattern, detail) in findings {
            self.diagnostics.invalid_pattern(pointer, &pattern, &detail);
        }
    }
}
