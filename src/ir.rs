//! Intermediate Representation
//!
//! Canonical, language-neutral model of a schema. All nodes live in a single
//! arena owned by the [`Module`]; cross-references are id-valued, never
//! pointers, so cyclic graphs need no shared ownership.
//!
//! The module graph is immutable once the normalizer terminates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::options::SemanticFormat;

/// Stable integer id of an IR node within one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Leaf value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    Bytes,
    Any,
}

/// Base representation of an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumBase {
    String,
    Integer,
}

/// One enum member: the wire literal and its symbolic name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValue {
    pub literal: serde_json::Value,
    pub symbol: String,
}

/// Numeric/string/array validation constraints, copied verbatim from the
/// source keywords onto the node (or field) they annotate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Source keyword of the first constraint present, for diagnostics
    pub fn first_keyword(&self) -> &'static str {
        if self.minimum.is_some() {
            return "minimum";
        }
        if self.maximum.is_some() {
            return "maximum";
        }
        if self.exclusive_minimum.is_some() {
            return "exclusiveMinimum";
        }
        if self.exclusive_maximum.is_some() {
            return "exclusiveMaximum";
        }
        if self.multiple_of.is_some() {
            return "multipleOf";
        }
        if self.min_length.is_some() {
            return "minLength";
        }
        if self.max_length.is_some() {
            return "maxLength";
        }
        if self.pattern.is_some() {
            return "pattern";
        }
        if self.min_items.is_some() {
            return "minItems";
        }
        if self.max_items.is_some() {
            return "maxItems";
        }
        "constraint"
    }

    /// Overlay `other` on top of `self` (use-site constraints win)
    pub fn merged_with(&self, other: &Constraints) -> Constraints {
        Constraints {
            minimum: other.minimum.or(self.minimum),
            maximum: other.maximum.or(self.maximum),
            exclusive_minimum: other.exclusive_minimum.or(self.exclusive_minimum),
            exclusive_maximum: other.exclusive_maximum.or(self.exclusive_maximum),
            multiple_of: other.multiple_of.or(self.multiple_of),
            min_length: other.min_length.or(self.min_length),
            max_length: other.max_length.or(self.max_length),
            pattern: other.pattern.clone().or_else(|| self.pattern.clone()),
            min_items: other.min_items.or(self.min_items),
            max_items: other.max_items.or(self.max_items),
        }
    }
}

/// How an object treats properties outside its declared field set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extensible {
    Forbid,
    Allow,
    Ignore,
}

/// A field of an Object node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Canonical lowercase-with-underscores name used inside the compiler
    pub ir_name: String,
    /// The exact property name from the source schema
    pub wire_name: String,
    /// Type of the field
    pub ty: NodeId,
    pub required: bool,
    /// Explicit `default` from the schema
    pub default: Option<serde_json::Value>,
    /// `const` literal (discriminator tags)
    pub literal: Option<serde_json::Value>,
    /// Schema allows `null` in addition to the declared type
    pub nullable: bool,
    /// Use-site constraints (constraints written next to a `$ref`)
    pub constraints: Constraints,
    pub doc: Option<String>,
}

/// Tag metadata of a discriminated union
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discriminator {
    /// Name of the shared tag property (wire name)
    pub field: String,
    /// Total, injective tag -> variant map, in source variant order
    pub mapping: Vec<(String, NodeId)>,
}

/// Tagged variant over the IR kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Primitive {
        kind: PrimitiveKind,
        format: Option<SemanticFormat>,
        constraints: Constraints,
    },
    Enum {
        base: EnumBase,
        values: Vec<EnumValue>,
    },
    Object {
        fields: Vec<Field>,
        /// Named base declaration this object extends (`allOf` inheritance)
        extends: Option<NodeId>,
        extensible: Extensible,
    },
    Array {
        items: NodeId,
        constraints: Constraints,
    },
    /// String-keyed map (`additionalProperties` with no `properties`)
    Map {
        values: NodeId,
    },
    Union {
        variants: Vec<NodeId>,
        discriminator: Option<Discriminator>,
    },
    /// Transparent named wrapper for a top-level primitive/array/map alias
    Newtype {
        inner: NodeId,
    },
    /// Unresolved reference; only present during intermediate stages
    Ref {
        target: NodeId,
    },
}

/// One IR node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Assigned name; present on every declaration, absent on inline nodes
    pub name: Option<String>,
    pub doc: Option<String>,
    /// JSON Pointer into the input document, for diagnostics
    pub pointer: String,
    pub kind: NodeKind,
}

/// The module graph: an arena of nodes, an ordered declaration sequence, and
/// the set of back-edges that require forward-reference treatment.
#[derive(Debug, Clone, Default)]
pub struct Module {
    nodes: Vec<Node>,
    /// Declarations in emission order (SCCs contiguous, dependencies first)
    pub decls: Vec<NodeId>,
    /// Edges (from, to) that close a cycle in the dependency graph
    pub back_edges: HashSet<(NodeId, NodeId)>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node; the returned id is stable for the module's lifetime
    pub fn alloc(&mut self, name: Option<String>, doc: Option<String>, pointer: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            name,
            doc,
            pointer,
            kind,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Follow Ref chains to the underlying node
    pub fn resolve(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            match &self.node(current).kind {
                NodeKind::Ref { target } => current = *target,
                _ => return current,
            }
        }
    }

    /// Assigned name of a node, following Ref chains
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.node(self.resolve(id)).name.as_deref()
    }

    /// Immediate dependencies of a node, in field/variant order
    pub fn deps(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            NodeKind::Primitive { .. } | NodeKind::Enum { .. } => Vec::new(),
            NodeKind::Object { fields, extends, .. } => {
                let mut out: Vec<NodeId> = extends.iter().copied().collect();
                out.extend(fields.iter().map(|f| f.ty));
                out
            }
            NodeKind::Array { items, .. } => vec![*items],
            NodeKind::Map { values } => vec![*values],
            NodeKind::Union { variants, .. } => variants.clone(),
            NodeKind::Newtype { inner } => vec![*inner],
            NodeKind::Ref { target } => vec![*target],
        }
    }

    /// Whether the reference `from -> to` closes a cycle
    pub fn is_back_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.back_edges.contains(&(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_node(module: &mut Module) -> NodeId {
        module.alloc(
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

    #[test]
    fn test_arena_ids_are_stable() {
        let mut module = Module::new();
        let a = any_node(&mut module);
        let b = any_node(&mut module);
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(module.node(a).id, a);
    }

    #[test]
    fn test_resolve_follows_ref_chains() {
        let mut module = Module::new();
        let target = any_node(&mut module);
        let r1 = module.alloc(None, None, String::new(), NodeKind::Ref { target });
        let r2 = module.alloc(None, None, String::new(), NodeKind::Ref { target: r1 });
        assert_eq!(module.resolve(r2), target);
    }

    #[test]
    fn test_constraints_merge_prefers_use_site() {
        let base = Constraints {
            minimum: Some(0.0),
            maximum: Some(10.0),
            ..Constraints::default()
        };
        let use_site = Constraints {
            maximum: Some(5.0),
            ..Constraints::default()
        };
        let merged = base.merged_with(&use_site);
        assert_eq!(merged.minimum, Some(0.0));
        assert_eq!(merged.maximum, Some(5.0));
    }
}
