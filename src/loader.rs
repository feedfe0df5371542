//! Schema Loading
//!
//! Resolves a parsed JSON Schema document into a reference-closed tree:
//! collects `$defs` into an ordered definitions table, flattens `$anchor`
//! targets, and replaces every `$ref` with either an inline copy (single-use,
//! non-recursive targets) or a [`DefId`] reference. Anonymous subtrees that
//! are referenced recursively or more than once are hoisted into the
//! definitions table under a synthesized key.
//!
//! Composition keywords (`allOf`/`oneOf`/`anyOf`) survive to the normalizer.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{CompileError, Result};
use crate::ir::Constraints;
use crate::normalize::names;

/// Index into the definitions table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(pub usize);

/// Dialects the compiler accepts in `$schema`
const SUPPORTED_DIALECTS: &[&str] = &[
    "https://json-schema.org/draft/2020-12/schema",
    "http://json-schema.org/draft/2020-12/schema",
];

/// Keywords in the interpreted subset; anything else is preserved at the IR
/// boundary and reported as a warning.
const KNOWN_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$ref",
    "$defs",
    "definitions",
    "$anchor",
    "$comment",
    "type",
    "properties",
    "required",
    "items",
    "additionalProperties",
    "enum",
    "const",
    "allOf",
    "oneOf",
    "anyOf",
    "discriminator",
    "title",
    "description",
    "format",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
];

// =============================================================================
// Resolved tree
// =============================================================================

/// A schema node after reference resolution
#[derive(Debug, Clone)]
pub enum Resolved {
    /// `true` schema: any value
    Any,
    /// `false` schema: no value
    Nothing,
    Node(Box<SchemaNode>),
}

impl Resolved {
    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Resolved::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// `additionalProperties` after resolution
#[derive(Debug, Clone)]
pub enum Additional {
    Bool(bool),
    Schema(Resolved),
}

/// The interpreted keyword subset of one schema object
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// JSON Pointer of this node in the input document
    pub pointer: String,
    /// Reference to a named definition; when set, only use-site metadata
    /// (description, constraints) is meaningful alongside it
    pub reference: Option<DefId>,
    pub ty: Option<String>,
    /// `type` listed `"null"` alongside the declared type
    pub nullable: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub properties: IndexMap<String, Resolved>,
    pub required: Vec<String>,
    pub items: Option<Resolved>,
    pub additional: Option<Additional>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    pub all_of: Vec<Resolved>,
    pub one_of: Vec<Resolved>,
    pub any_of: Vec<Resolved>,
    pub default: Option<Value>,
    /// `discriminator.propertyName`, when declared
    pub discriminator: Option<String>,
    pub constraints: Constraints,
}

impl SchemaNode {
    fn empty(pointer: String) -> Self {
        Self {
            pointer,
            reference: None,
            ty: None,
            nullable: false,
            title: None,
            description: None,
            format: None,
            properties: IndexMap::new(),
            required: Vec::new(),
            items: None,
            additional: None,
            enum_values: None,
            const_value: None,
            all_of: Vec::new(),
            one_of: Vec::new(),
            any_of: Vec::new(),
            default: None,
            discriminator: None,
            constraints: Constraints::default(),
        }
    }

    /// Whether this node describes a shape at all (as opposed to a bare
    /// container of `$defs` and annotations)
    pub fn has_shape(&self) -> bool {
        self.reference.is_some()
            || self.ty.is_some()
            || !self.properties.is_empty()
            || self.items.is_some()
            || self.additional.is_some()
            || self.enum_values.is_some()
            || self.const_value.is_some()
            || !self.all_of.is_empty()
            || !self.one_of.is_empty()
            || !self.any_of.is_empty()
    }
}

/// One entry in the definitions table
#[derive(Debug, Clone)]
pub struct Definition {
    /// Candidate name, from the `$defs` key or synthesized for hoisted subtrees
    pub key: String,
    pub pointer: String,
    pub schema: Resolved,
    /// True when the key was synthesized (hoisted anonymous subtree)
    pub synthesized: bool,
}

/// Loader output: the definitions table plus the root entry
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub defs: Vec<Definition>,
    /// The document root, when it describes a shape of its own
    pub root: Option<DefId>,
}

// =============================================================================
// Loader
// =============================================================================

pub fn resolve(document: &Value, diagnostics: &mut Diagnostics) -> Result<ResolvedDocument> {
    let mut loader = Loader::new(document, diagnostics)?;
    loader.run()
}

struct Loader<'a> {
    document: &'a Value,
    diagnostics: &'a mut Diagnostics,
    /// `$anchor` name -> pointer
    anchors: HashMap<String, String>,
    /// pointer -> number of `$ref` occurrences targeting it
    ref_counts: HashMap<String, usize>,
    defs: Vec<Definition>,
    by_pointer: HashMap<String, DefId>,
    /// Pointers of anonymous subtrees currently being inlined
    building: HashSet<String>,
    root: Option<DefId>,
}

impl<'a> Loader<'a> {
    fn new(document: &'a Value, diagnostics: &'a mut Diagnostics) -> Result<Self> {
        match document {
            Value::Object(_) | Value::Bool(_) => {}
            _ => return Err(CompileError::MalformedDocument),
        }

        if let Some(dialect) = document.get("$schema").and_then(|v| v.as_str()) {
            if !SUPPORTED_DIALECTS.contains(&dialect) {
                return Err(CompileError::UnsupportedDialect {
                    dialect: dialect.to_string(),
                    pointer: "/$schema".to_string(),
                });
            }
        }

        Ok(Self {
            document,
            diagnostics,
            anchors: HashMap::new(),
            ref_counts: HashMap::new(),
            defs: Vec::new(),
            by_pointer: HashMap::new(),
            building: HashSet::new(),
            root: None,
        })
    }

    fn run(&mut self) -> Result<ResolvedDocument> {
        self.collect_anchors(self.document, "");
        self.count_refs(self.document)?;
        self.register_defs()?;

        // Worklist: hoisting may append definitions while earlier ones build
        let mut next = 0;
        while next < self.defs.len() {
            let pointer = self.defs[next].pointer.clone();
            let raw = lookup(self.document, &pointer).ok_or_else(|| CompileError::UnresolvableRef {
                target: pointer.clone(),
                pointer: pointer.clone(),
            })?;
            let schema = self.build(raw, &pointer)?;
            self.defs[next].schema = schema;
            next += 1;
        }

        tracing::debug!(
            defs = self.defs.len(),
            root = self.root.is_some(),
            "resolved schema document"
        );

        Ok(ResolvedDocument {
            defs: std::mem::take(&mut self.defs),
            root: self.root,
        })
    }

    /// Record every `$anchor` with the pointer of its host node
    fn collect_anchors(&mut self, value: &Value, pointer: &str) {
        match value {
            Value::Object(map) => {
                if let Some(anchor) = map.get("$anchor").and_then(|v| v.as_str()) {
                    self.anchors.insert(anchor.to_string(), pointer.to_string());
                }
                for (key, child) in map {
                    let child_ptr = format!("{}/{}", pointer, escape(key));
                    self.collect_anchors(child, &child_ptr);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    let child_ptr = format!("{}/{}", pointer, i);
                    self.collect_anchors(child, &child_ptr);
                }
            }
            _ => {}
        }
    }

    /// Count `$ref` occurrences per normalized target pointer
    fn count_refs(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Object(map) => {
                if let Some(target) = map.get("$ref").and_then(|v| v.as_str()) {
                    if let Ok(ptr) = self.normalize_ref(target, "") {
                        *self.ref_counts.entry(ptr).or_insert(0) += 1;
                    }
                }
                for child in map.values() {
                    self.count_refs(child)?;
                }
            }
            Value::Array(items) => {
                for child in items {
                    self.count_refs(child)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Register the `$defs` table and the root, in source order
    fn register_defs(&mut self) -> Result<()> {
        let Some(map) = self.document.as_object() else {
            // Boolean root: declared shape is the root itself
            let id = DefId(0);
            self.defs.push(Definition {
                key: "Root".to_string(),
                pointer: String::new(),
                schema: Resolved::Any,
                synthesized: false,
            });
            self.by_pointer.insert(String::new(), id);
            self.root = Some(id);
            return Ok(());
        };

        let defs_key = if map.contains_key("$defs") {
            Some("$defs")
        } else if map.contains_key("definitions") {
            self.diagnostics.warning(
                "/definitions",
                DiagnosticKind::LegacyDefinitions,
                "'definitions' is the pre-2019 spelling; prefer '$defs'",
            );
            Some("definitions")
        } else {
            None
        };

        if let Some(defs_key) = defs_key {
            if let Some(entries) = map.get(defs_key).and_then(|v| v.as_object()) {
                for key in entries.keys() {
                    let pointer = format!("/{}/{}", defs_key, escape(key));
                    let id = DefId(self.defs.len());
                    self.defs.push(Definition {
                        key: key.clone(),
                        pointer: pointer.clone(),
                        schema: Resolved::Any,
                        synthesized: false,
                    });
                    self.by_pointer.insert(pointer, id);
                }
            }
        }

        // The root itself, when it describes a shape
        let root_has_shape = map.contains_key("$ref")
            || map.contains_key("type")
            || map.contains_key("properties")
            || map.contains_key("items")
            || map.contains_key("additionalProperties")
            || map.contains_key("enum")
            || map.contains_key("const")
            || map.contains_key("allOf")
            || map.contains_key("oneOf")
            || map.contains_key("anyOf");

        if root_has_shape {
            let id = DefId(self.defs.len());
            let key = map
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Root")
                .to_string();
            self.defs.push(Definition {
                key,
                pointer: String::new(),
                schema: Resolved::Any,
                synthesized: false,
            });
            self.by_pointer.insert(String::new(), id);
            self.root = Some(id);
        }

        Ok(())
    }

    /// Turn a `$ref` string into a normalized document pointer
    fn normalize_ref(&self, target: &str, use_pointer: &str) -> Result<String> {
        if let Some(fragment) = target.strip_prefix('#') {
            if fragment.is_empty() {
                return Ok(String::new());
            }
            if let Some(rest) = fragment.strip_prefix('/') {
                return Ok(format!("/{}", rest));
            }
            // Plain-name fragment: `$anchor` target
            if let Some(pointer) = self.anchors.get(fragment) {
                return Ok(pointer.clone());
            }
            return Err(CompileError::UnresolvableRef {
                target: target.to_string(),
                pointer: use_pointer.to_string(),
            });
        }

        Err(CompileError::ExternalRef {
            target: target.to_string(),
            pointer: use_pointer.to_string(),
        })
    }

    /// Resolve a `$ref` use site to a definition or an inline copy
    fn resolve_ref(&mut self, target: &str, use_pointer: &str) -> Result<Resolved> {
        let ptr = self.normalize_ref(target, use_pointer)?;

        if let Some(&id) = self.by_pointer.get(&ptr) {
            let mut node = SchemaNode::empty(use_pointer.to_string());
            node.reference = Some(id);
            return Ok(Resolved::Node(Box::new(node)));
        }

        let raw = lookup(self.document, &ptr).ok_or_else(|| CompileError::UnresolvableRef {
            target: target.to_string(),
            pointer: use_pointer.to_string(),
        })?;

        if self.building.contains(&ptr) {
            // A cycle closed while inlining this subtree and no named
            // declaration hosts it
            return Err(CompileError::CyclicRefWithoutNamedHost {
                pointer: use_pointer.to_string(),
            });
        }

        let single_use = self.ref_counts.get(&ptr).copied().unwrap_or(0) <= 1;
        if single_use && !self.is_recursive(&ptr) {
            // Inline copy of a non-recursive, single-use anonymous subtree
            self.building.insert(ptr.clone());
            let resolved = self.build(raw, &ptr);
            self.building.remove(&ptr);
            return resolved;
        }

        // Hoist the anonymous subtree into the definitions table. The id is
        // registered before the body builds so cycles land on the Ref.
        let key = synthesize_def_key(&ptr);
        if self.defs.iter().any(|d| d.key == key) {
            return Err(CompileError::NameCollision {
                name: key,
                pointer: ptr,
            });
        }
        let id = DefId(self.defs.len());
        self.defs.push(Definition {
            key,
            pointer: ptr.clone(),
            schema: Resolved::Any,
            synthesized: true,
        });
        self.by_pointer.insert(ptr, id);

        let mut node = SchemaNode::empty(use_pointer.to_string());
        node.reference = Some(id);
        Ok(Resolved::Node(Box::new(node)))
    }

    /// Whether the subtree at `ptr` transitively references itself or any
    /// subtree currently being inlined
    fn is_recursive(&self, ptr: &str) -> bool {
        let Some(raw) = lookup(self.document, ptr) else {
            return false;
        };

        let mut visited = HashSet::new();
        let mut stack: Vec<String> = Vec::new();
        collect_ref_targets(raw, &mut |target| {
            if let Ok(t) = self.normalize_ref(target, ptr) {
                stack.push(t);
            }
        });

        while let Some(t) = stack.pop() {
            if t == ptr || self.building.contains(&t) {
                return true;
            }
            if !visited.insert(t.clone()) {
                continue;
            }
            // Named definitions host their own cycles
            if self.by_pointer.contains_key(&t) {
                continue;
            }
            if let Some(raw) = lookup(self.document, &t) {
                collect_ref_targets(raw, &mut |target| {
                    if let Ok(next) = self.normalize_ref(target, &t) {
                        stack.push(next);
                    }
                });
            }
        }

        false
    }

    /// Build the resolved form of one schema value
    fn build(&mut self, value: &Value, pointer: &str) -> Result<Resolved> {
        let map = match value {
            Value::Bool(true) => return Ok(Resolved::Any),
            Value::Bool(false) => return Ok(Resolved::Nothing),
            Value::Object(map) => map,
            _ => {
                return Err(CompileError::CannotLower {
                    reason: "schema must be an object or boolean".to_string(),
                    pointer: pointer.to_string(),
                })
            }
        };

        if let Some(target) = map.get("$ref").and_then(|v| v.as_str()) {
            let mut resolved = self.resolve_ref(target, pointer)?;
            // Use-site metadata rides along with the reference
            if let Resolved::Node(node) = &mut resolved {
                if node.reference.is_some() {
                    node.description = map
                        .get("description")
                        .and_then(|v| v.as_str())
                        .map(String::from);
                    node.constraints = parse_constraints(map);
                }
            }
            return Ok(resolved);
        }

        let mut node = SchemaNode::empty(pointer.to_string());

        match map.get("type") {
            Some(Value::String(ty)) => node.ty = Some(ty.clone()),
            Some(Value::Array(types)) => {
                let mut others: Vec<&str> = Vec::new();
                for ty in types.iter().filter_map(|v| v.as_str()) {
                    if ty == "null" {
                        node.nullable = true;
                    } else {
                        others.push(ty);
                    }
                }
                match others.as_slice() {
                    [] => {}
                    [single] => node.ty = Some(single.to_string()),
                    _ => {
                        return Err(CompileError::CannotLower {
                            reason: format!("multi-typed schema {:?} cannot be lowered", others),
                            pointer: pointer.to_string(),
                        })
                    }
                }
            }
            _ => {}
        }

        node.title = map.get("title").and_then(|v| v.as_str()).map(String::from);
        node.description = map
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from);
        node.format = map.get("format").and_then(|v| v.as_str()).map(String::from);
        node.default = map.get("default").cloned();
        node.const_value = map.get("const").cloned();
        node.enum_values = map
            .get("enum")
            .and_then(|v| v.as_array())
            .map(|values| values.to_vec());
        node.discriminator = map
            .get("discriminator")
            .and_then(|v| v.get("propertyName"))
            .and_then(|v| v.as_str())
            .map(String::from);
        node.constraints = parse_constraints(map);

        if let Some(required) = map.get("required").and_then(|v| v.as_array()) {
            let mut seen = HashSet::new();
            for name in required.iter().filter_map(|v| v.as_str()) {
                if !seen.insert(name) {
                    self.diagnostics.warning(
                        format!("{}/required", pointer),
                        DiagnosticKind::DuplicateRequired,
                        format!("'{}' listed in required more than once", name),
                    );
                    continue;
                }
                node.required.push(name.to_string());
            }
        }

        if let Some(props) = map.get("properties").and_then(|v| v.as_object()) {
            for (name, prop) in props {
                let prop_ptr = format!("{}/properties/{}", pointer, escape(name));
                let resolved = self.build(prop, &prop_ptr)?;
                node.properties.insert(name.clone(), resolved);
            }
        }

        if let Some(items) = map.get("items") {
            let items_ptr = format!("{}/items", pointer);
            node.items = Some(self.build(items, &items_ptr)?);
        }

        if let Some(additional) = map.get("additionalProperties") {
            let add_ptr = format!("{}/additionalProperties", pointer);
            node.additional = Some(match additional {
                Value::Bool(allowed) => Additional::Bool(*allowed),
                other => Additional::Schema(self.build(other, &add_ptr)?),
            });
        }

        for (keyword, bucket) in [("allOf", 0usize), ("oneOf", 1), ("anyOf", 2)] {
            if let Some(branches) = map.get(keyword).and_then(|v| v.as_array()) {
                for (i, branch) in branches.iter().enumerate() {
                    let branch_ptr = format!("{}/{}/{}", pointer, keyword, i);
                    let resolved = self.build(branch, &branch_ptr)?;
                    match bucket {
                        0 => node.all_of.push(resolved),
                        1 => node.one_of.push(resolved),
                        _ => node.any_of.push(resolved),
                    }
                }
            }
        }

        for key in map.keys() {
            if !KNOWN_KEYWORDS.contains(&key.as_str()) {
                self.diagnostics.unknown_keyword(pointer.to_string(), key);
            }
        }

        Ok(Resolved::Node(Box::new(node)))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_constraints(map: &serde_json::Map<String, Value>) -> Constraints {
    let num = |key: &str| map.get(key).and_then(|v| v.as_f64());
    let int = |key: &str| map.get(key).and_then(|v| v.as_u64());

    Constraints {
        minimum: num("minimum"),
        maximum: num("maximum"),
        exclusive_minimum: num("exclusiveMinimum"),
        exclusive_maximum: num("exclusiveMaximum"),
        multiple_of: num("multipleOf"),
        min_length: int("minLength"),
        max_length: int("maxLength"),
        pattern: map.get("pattern").and_then(|v| v.as_str()).map(String::from),
        min_items: int("minItems"),
        max_items: int("maxItems"),
    }
}

/// Walk a raw subtree and report every `$ref` target string
fn collect_ref_targets(value: &Value, report: &mut impl FnMut(&str)) {
    match value {
        Value::Object(map) => {
            if let Some(target) = map.get("$ref").and_then(|v| v.as_str()) {
                report(target);
            }
            for child in map.values() {
                collect_ref_targets(child, report);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_ref_targets(child, report);
            }
        }
        _ => {}
    }
}

/// Synthesize a definition key from a hoisted subtree's pointer, e.g.
/// `/$defs/Node/properties/edges/items` -> `NodeEdgesItem`
fn synthesize_def_key(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = unescape(segment);
        match segment.as_str() {
            "$defs" | "definitions" | "properties" | "allOf" | "oneOf" | "anyOf" => continue,
            "items" => out.push_str("Item"),
            "additionalProperties" => out.push_str("Value"),
            other if other.parse::<usize>().is_ok() => continue,
            other => out.push_str(&names::pascal_case(other)),
        }
    }
    if out.is_empty() {
        out.push_str("Anonymous");
    }
    out
}

/// JSON Pointer lookup into the raw document
fn lookup<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(document);
    }
    let mut current = document;
    for segment in pointer.split('/').skip(1) {
        let segment = unescape(segment);
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(doc: serde_json::Value) -> (ResolvedDocument, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let resolved = resolve(&doc, &mut diagnostics).unwrap();
        (resolved, diagnostics)
    }

    #[test]
    fn test_defs_registered_in_source_order() {
        let (doc, _) = load(json!({
            "$defs": {
                "B": { "type": "string" },
                "A": { "type": "integer" }
            }
        }));
        assert_eq!(doc.defs.len(), 2);
        assert_eq!(doc.defs[0].key, "B");
        assert_eq!(doc.defs[1].key, "A");
        assert!(doc.root.is_none());
    }

    #[test]
    fn test_root_shape_becomes_definition() {
        let (doc, _) = load(json!({
            "title": "Envelope",
            "type": "object",
            "properties": { "id": { "type": "string" } }
        }));
        let root = doc.root.unwrap();
        assert_eq!(doc.defs[root.0].key, "Envelope");
    }

    #[test]
    fn test_ref_to_def_resolves() {
        let (doc, _) = load(json!({
            "$defs": {
                "Id": { "type": "string" },
                "User": {
                    "type": "object",
                    "properties": { "id": { "$ref": "#/$defs/Id" } }
                }
            }
        }));
        let user = doc.defs[1].schema.as_node().unwrap();
        let id_prop = user.properties["id"].as_node().unwrap();
        assert_eq!(id_prop.reference, Some(DefId(0)));
    }

    #[test]
    fn test_external_ref_rejected() {
        let mut diagnostics = Diagnostics::new();
        let err = resolve(
            &json!({
                "type": "object",
                "properties": { "x": { "$ref": "https://example.com/other.json#/$defs/X" } }
            }),
            &mut diagnostics,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::ExternalRef { .. }));
    }

    #[test]
    fn test_unresolvable_pointer() {
        let mut diagnostics = Diagnostics::new();
        let err = resolve(
            &json!({
                "type": "object",
                "properties": { "x": { "$ref": "#/$defs/Missing" } }
            }),
            &mut diagnostics,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvableRef { .. }));
    }

    #[test]
    fn test_unsupported_dialect() {
        let mut diagnostics = Diagnostics::new();
        let err = resolve(
            &json!({ "$schema": "http://json-schema.org/draft-07/schema#", "type": "object" }),
            &mut diagnostics,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedDialect { .. }));
    }

    #[test]
    fn test_anchor_flattening() {
        let (doc, _) = load(json!({
            "$defs": {
                "Id": { "$anchor": "id", "type": "string" },
                "User": {
                    "type": "object",
                    "properties": { "id": { "$ref": "#id" } }
                }
            }
        }));
        let user = doc.defs[1].schema.as_node().unwrap();
        let id_prop = user.properties["id"].as_node().unwrap();
        assert_eq!(id_prop.reference, Some(DefId(0)));
    }

    #[test]
    fn test_anonymous_multi_use_subtree_is_hoisted() {
        let (doc, _) = load(json!({
            "$defs": {
                "A": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "x": { "$ref": "#/$defs/A/properties/name" },
                        "y": { "$ref": "#/$defs/A/properties/name" }
                    }
                }
            }
        }));
        let hoisted = doc.defs.iter().find(|d| d.synthesized).unwrap();
        assert_eq!(hoisted.key, "AName");
    }

    #[test]
    fn test_single_use_anonymous_subtree_is_inlined() {
        let (doc, _) = load(json!({
            "$defs": {
                "A": { "type": "object", "properties": { "name": { "type": "string" } } },
                "B": {
                    "type": "object",
                    "properties": { "alias": { "$ref": "#/$defs/A/properties/name" } }
                }
            }
        }));
        assert_eq!(doc.defs.len(), 2, "no hoisted definition expected");
        let b = doc.defs[1].schema.as_node().unwrap();
        let alias = b.properties["alias"].as_node().unwrap();
        assert!(alias.reference.is_none());
        assert_eq!(alias.ty.as_deref(), Some("string"));
    }

    #[test]
    fn test_unknown_keyword_warning() {
        let (_, diagnostics) = load(json!({
            "type": "object",
            "properties": { "x": { "type": "string", "examples": ["a"] } }
        }));
        assert!(diagnostics
            .warnings()
            .any(|d| d.kind == DiagnosticKind::UnknownKeyword));
    }

    #[test]
    fn test_nullable_type_array() {
        let (doc, _) = load(json!({
            "type": "object",
            "properties": { "x": { "type": ["string", "null"] } }
        }));
        let root = doc.root.unwrap();
        let node = doc.defs[root.0].schema.as_node().unwrap();
        let x = node.properties["x"].as_node().unwrap();
        assert!(x.nullable);
        assert_eq!(x.ty.as_deref(), Some("string"));
    }
}
