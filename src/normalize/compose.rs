//! Composition Lowering
//!
//! `allOf` becomes an inheritance relation (named base) or a structural merge
//! (anonymous branches). `oneOf`/`anyOf` become discriminated unions when
//! every variant shares a string property with a `const` value, and open
//! unions otherwise. Discriminator synthesis runs as a second phase, after
//! every definition has a body, because union variants may be forward
//! references.

use indexmap::IndexMap;

use crate::error::{CompileError, Result};
use crate::ir::{Discriminator, Module, NodeId, NodeKind};
use crate::loader::{Resolved, SchemaNode};

use super::names::NameCtx;
use super::{Normalizer, PendingUnion};

// =============================================================================
// allOf
// =============================================================================

pub(crate) fn lower_all_of(
    n: &mut Normalizer<'_>,
    node: &SchemaNode,
    ctx: &NameCtx,
) -> Result<NodeKind> {
    let mut bases: Vec<NodeId> = Vec::new();
    let mut extras: Vec<&SchemaNode> = Vec::new();

    for branch in &node.all_of {
        match branch {
            Resolved::Any => continue,
            Resolved::Nothing => {
                return Err(CompileError::CannotLower {
                    reason: "allOf contains a false branch".to_string(),
                    pointer: node.pointer.clone(),
                })
            }
            Resolved::Node(branch) => {
                if let Some(reference) = branch.reference {
                    bases.push(n.def_nodes[reference.0]);
                } else if branch.ty.as_deref() == Some("object") || !branch.properties.is_empty() {
                    extras.push(branch.as_ref());
                } else {
                    return Err(CompileError::CannotLower {
                        reason: "allOf branch is neither an object schema nor a reference"
                            .to_string(),
                        pointer: branch.pointer.clone(),
                    });
                }
            }
        }
    }

    match (bases.as_slice(), extras.is_empty()) {
        // Pure alias: allOf with a single reference and nothing else
        ([base], true) => Ok(NodeKind::Newtype { inner: *base }),

        // Inheritance: named base plus extra properties
        ([base], false) => {
            let (properties, required) = merge_branches(&extras, MergePolicy::UnionRequired);
            let fields = n.build_fields(&properties, &required, ctx, &node.pointer)?;
            let extensible = n.extensible_of(extras.iter().find_map(|e| e.additional.as_ref()));
            Ok(NodeKind::Object {
                fields,
                extends: Some(*base),
                extensible,
            })
        }

        // Structural merge: all branches anonymous objects
        ([], false) => {
            let (properties, required) = merge_branches(&extras, MergePolicy::IntersectRequired);
            let fields = n.build_fields(&properties, &required, ctx, &node.pointer)?;
            let extensible = n.extensible_of(extras.iter().find_map(|e| e.additional.as_ref()));
            Ok(NodeKind::Object {
                fields,
                extends: None,
                extensible,
            })
        }

        ([], true) => Err(CompileError::CannotLower {
            reason: "allOf has no branches to lower".to_string(),
            pointer: node.pointer.clone(),
        }),

        _ => Err(CompileError::CannotLower {
            reason: "allOf with more than one named base cannot be lowered".to_string(),
            pointer: node.pointer.clone(),
        }),
    }
}

enum MergePolicy {
    /// Inheritance extras: a property is required when any branch requires it
    UnionRequired,
    /// Structural merge: a property is required only when every branch
    /// requires it
    IntersectRequired,
}

/// Union of properties (later branches win), with the required set combined
/// per the policy
fn merge_branches(
    branches: &[&SchemaNode],
    policy: MergePolicy,
) -> (IndexMap<String, Resolved>, Vec<String>) {
    let mut properties: IndexMap<String, Resolved> = IndexMap::new();
    for branch in branches {
        for (name, prop) in &branch.properties {
            properties.insert(name.clone(), prop.clone());
        }
    }

    let required: Vec<String> = match policy {
        MergePolicy::UnionRequired => {
            let mut required = Vec::new();
            for branch in branches {
                for name in &branch.required {
                    if !required.contains(name) {
                        required.push(name.clone());
                    }
                }
            }
            required
        }
        MergePolicy::IntersectRequired => properties
            .keys()
            .filter(|name| branches.iter().all(|b| b.required.contains(name)))
            .cloned()
            .collect(),
    };

    (properties, required)
}

// =============================================================================
// oneOf / anyOf
// =============================================================================

pub(crate) fn lower_union(
    n: &mut Normalizer<'_>,
    node: &SchemaNode,
    ctx: &NameCtx,
) -> Result<NodeKind> {
    let branches = if !node.one_of.is_empty() {
        &node.one_of
    } else {
        &node.any_of
    };

    // A union of bare const values is an enum, not a union of types
    let consts: Vec<&serde_json::Value> = branches
        .iter()
        .filter_map(|b| b.as_node())
        .filter(|b| b.reference.is_none() && b.properties.is_empty())
        .filter_map(|b| b.const_value.as_ref())
        .collect();
    if consts.len() == branches.len() && !consts.is_empty() {
        let values: Vec<serde_json::Value> = consts.into_iter().cloned().collect();
        return n.enum_from_literals(&values, &node.pointer);
    }

    let mut variants = Vec::with_capacity(branches.len());
    for (index, branch) in branches.iter().enumerate() {
        match branch {
            Resolved::Any | Resolved::Nothing => {
                return Err(CompileError::CannotLower {
                    reason: "union branch must be a schema object or reference".to_string(),
                    pointer: node.pointer.clone(),
                })
            }
            Resolved::Node(branch_node) => {
                if let Some(reference) = branch_node.reference {
                    variants.push(n.def_nodes[reference.0]);
                } else {
                    let label = variant_label(branch_node, index);
                    let id = n.lower_nested(branch, &ctx.variant(&label))?;
                    variants.push(id);
                }
            }
        }
    }

    Ok(NodeKind::Union {
        variants,
        discriminator: None,
    })
}

/// Naming segment for an anonymous union variant: its tag value when one
/// exists, positional otherwise
fn variant_label(branch: &SchemaNode, index: usize) -> String {
    for prop in branch.properties.values() {
        if let Some(node) = prop.as_node() {
            if let Some(serde_json::Value::String(tag)) = &node.const_value {
                return tag.clone();
            }
        }
    }
    format!("Variant{}", index + 1)
}

// =============================================================================
// Discriminator synthesis
// =============================================================================

/// Promote open unions to discriminated unions when every variant is an
/// object sharing a string property with a `const` value. An explicitly
/// declared `discriminator.propertyName` must agree with what the variants
/// actually share.
pub(crate) fn resolve_discriminators(n: &mut Normalizer<'_>) -> Result<()> {
    let pending = std::mem::take(&mut n.pending_unions);

    for PendingUnion {
        node,
        declared,
        pointer,
    } in pending
    {
        let NodeKind::Union { variants, .. } = &n.module.node(node).kind else {
            continue;
        };
        let variants = variants.clone();

        // Per-variant map of wire name -> string tag, walking the extends chain
        let mut tag_maps: Vec<Option<IndexMap<String, String>>> = Vec::new();
        for &variant in &variants {
            tag_maps.push(literal_tags(&n.module, variant));
        }

        let discriminator = match synthesize(&variants, &tag_maps, declared.as_deref(), &pointer)? {
            Some(d) => d,
            None => continue,
        };

        if let NodeKind::Union {
            discriminator: slot,
            ..
        } = &mut n.module.node_mut(node).kind
        {
            *slot = Some(discriminator);
        }
    }

    Ok(())
}

fn synthesize(
    variants: &[NodeId],
    tag_maps: &[Option<IndexMap<String, String>>],
    declared: Option<&str>,
    pointer: &str,
) -> Result<Option<Discriminator>> {
    let all_objects = tag_maps.iter().all(|m| m.is_some());
    if !all_objects || variants.is_empty() {
        if let Some(declared) = declared {
            return Err(CompileError::DiscriminatorMismatch {
                declared: declared.to_string(),
                found: "none".to_string(),
                pointer: pointer.to_string(),
            });
        }
        return Ok(None);
    }

    // Candidate tags: properties with a literal value in every variant,
    // in the first variant's field order
    let first = tag_maps[0].as_ref().expect("checked all_objects");
    let candidates: Vec<&String> = first
        .keys()
        .filter(|key| {
            tag_maps
                .iter()
                .all(|m| m.as_ref().is_some_and(|m| m.contains_key(*key)))
        })
        .collect();

    let chosen = match declared {
        Some(declared) => {
            if !candidates.iter().any(|c| c.as_str() == declared) {
                return Err(CompileError::DiscriminatorMismatch {
                    declared: declared.to_string(),
                    found: candidates
                        .first()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                    pointer: pointer.to_string(),
                });
            }
            declared.to_string()
        }
        None => match candidates.first() {
            Some(candidate) => candidate.to_string(),
            None => return Ok(None),
        },
    };

    // Totality holds by construction; enforce injectivity
    let mut mapping: Vec<(String, NodeId)> = Vec::with_capacity(variants.len());
    for (variant, tags) in variants.iter().zip(tag_maps) {
        let tag = tags.as_ref().expect("checked all_objects")[&chosen].clone();
        if mapping.iter().any(|(existing, _)| existing == &tag) {
            return Err(CompileError::CannotLower {
                reason: format!("discriminator tag '{}' appears on more than one variant", tag),
                pointer: pointer.to_string(),
            });
        }
        mapping.push((tag, *variant));
    }

    Ok(Some(Discriminator {
        field: chosen,
        mapping,
    }))
}

/// Wire names of string-literal fields on an object, including inherited
/// ones; `None` when the node is not an object
fn literal_tags(module: &Module, id: NodeId) -> Option<IndexMap<String, String>> {
    let mut tags = IndexMap::new();
    let mut current = Some(module.resolve(id));
    let mut hops = 0;

    while let Some(id) = current {
        let NodeKind::Object {
            fields, extends, ..
        } = &module.node(id).kind
        else {
            return if hops == 0 { None } else { Some(tags) };
        };

        for field in fields {
            if let Some(serde_json::Value::String(tag)) = &field.literal {
                // Child declarations shadow inherited tags
                tags.entry(field.wire_name.clone())
                    .or_insert_with(|| tag.clone());
            }
        }

        current = extends.map(|base| module.resolve(base));
        hops += 1;
        if hops > 64 {
            break;
        }
    }

    Some(tags)
}
