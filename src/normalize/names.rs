//! Name Assignment
//!
//! Canonical, language-agnostic naming: PascalCase for declarations,
//! lowercase-with-underscores for fields, SCREAMING_SNAKE for enum symbols.
//! Anonymous promoted subtrees are named by concatenating the parent's name
//! with the path segments that reach them.
//!
//! Language-specific rendering (keyword escaping, suffixes) is done by the
//! emission profile, not here.

use indexmap::IndexMap;

use crate::error::{CompileError, Result};
use crate::ir::NodeId;

/// Convert a key to PascalCase. Keys without separators keep their interior
/// casing (`BaseEvent` and `AIProvider` survive untouched); separated keys
/// are capitalized per word.
pub fn pascal_case(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    if !s.contains(['_', '-', ' ', '.']) {
        let mut chars = s.chars();
        return match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().chain(chars).collect(),
        };
    }

    let mut result = String::with_capacity(s.len());
    for word in s.split(['_', '-', ' ', '.']) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.extend(chars);
        }
    }
    result
}

/// Canonical IR field name: lowercase-with-underscores. CamelCase humps are
/// split, separators collapse, leading underscores are stripped
/// (`_meta` -> `meta`, `progressToken` -> `progress_token`).
pub fn field_name(wire: &str) -> String {
    let mut result = String::with_capacity(wire.len() + 4);
    let mut prev_lower = false;

    for c in wire.chars() {
        if c == '-' || c == ' ' || c == '.' || c == '_' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower && !result.ends_with('_') {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    // Leading underscores are wire-side decoration (`_meta`); trailing ones
    // are kept so they stay distinguishable from reserved-word rewrites
    let trimmed = result.trim_start_matches('_');
    if trimmed.is_empty() {
        return "field".to_string();
    }
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("f_{}", trimmed);
    }
    trimmed.to_string()
}

/// Symbolic name for a string enum member (`in_progress` -> `IN_PROGRESS`)
pub fn enum_symbol(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_lower = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_uppercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
            prev_lower = false;
        }
    }

    let trimmed = result.trim_matches('_');
    if trimmed.is_empty() {
        return "EMPTY".to_string();
    }
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("V{}", trimmed);
    }
    trimmed.to_string()
}

/// Symbolic name for an integer enum member
pub fn int_enum_symbol(value: i64) -> String {
    if value < 0 {
        format!("VALUE_NEG_{}", -value)
    } else {
        format!("VALUE_{}", value)
    }
}

// =============================================================================
// Name context
// =============================================================================

/// Path context used to synthesize names for anonymous subtrees:
/// PascalCase of the parent declaration, then PascalCase of each intervening
/// key, then the terminal role word (`Item` for array items, `Value` for map
/// values).
#[derive(Debug, Clone)]
pub struct NameCtx {
    parent: String,
    segments: Vec<String>,
}

impl NameCtx {
    pub fn root(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            segments: Vec::new(),
        }
    }

    pub fn property(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(pascal_case(&field_name(key)));
        next
    }

    pub fn items(&self) -> Self {
        let mut next = self.clone();
        next.segments.push("Item".to_string());
        next
    }

    pub fn map_value(&self) -> Self {
        let mut next = self.clone();
        next.segments.push("Value".to_string());
        next
    }

    pub fn variant(&self, label: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(pascal_case(label));
        next
    }

    pub fn synthesized(&self) -> String {
        let mut name = self.parent.clone();
        for segment in &self.segments {
            name.push_str(segment);
        }
        name
    }
}

// =============================================================================
// Name table
// =============================================================================

/// Tracks declaration names in use; a second registration of the same name
/// is a hard failure, never silently disambiguated.
#[derive(Debug, Default)]
pub struct NameTable {
    names: IndexMap<String, NodeId>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, id: NodeId, pointer: &str) -> Result<()> {
        if self.names.contains_key(name) {
            return Err(CompileError::NameCollision {
                name: name.to_string(),
                pointer: pointer.to_string(),
            });
        }
        self.names.insert(name.to_string(), id);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case_preserves_interior_casing() {
        assert_eq!(pascal_case("BaseEvent"), "BaseEvent");
        assert_eq!(pascal_case("AIProvider"), "AIProvider");
        assert_eq!(pascal_case("progressToken"), "ProgressToken");
        assert_eq!(pascal_case("some_type"), "SomeType");
        assert_eq!(pascal_case("call-tool"), "CallTool");
    }

    #[test]
    fn test_field_name_canonicalization() {
        assert_eq!(field_name("name"), "name");
        assert_eq!(field_name("progressToken"), "progress_token");
        assert_eq!(field_name("_meta"), "meta");
        assert_eq!(field_name("mime_type"), "mime_type");
        assert_eq!(field_name("HTTPStatus"), "httpstatus");
        assert_eq!(field_name("user-id"), "user_id");
        // Trailing underscores survive so `class_` stays distinct from the
        // reserved-word rewrite of `class`
        assert_eq!(field_name("class_"), "class_");
    }

    #[test]
    fn test_enum_symbols() {
        assert_eq!(enum_symbol("in_progress"), "IN_PROGRESS");
        assert_eq!(enum_symbol("created"), "CREATED");
        assert_eq!(enum_symbol("GET"), "GET");
        assert_eq!(enum_symbol("2fa"), "V2FA");
        assert_eq!(int_enum_symbol(3), "VALUE_3");
        assert_eq!(int_enum_symbol(-1), "VALUE_NEG_1");
    }

    #[test]
    fn test_name_ctx_concatenation() {
        let ctx = NameCtx::root("CallToolRequest");
        let meta = ctx.property("params").property("_meta");
        assert_eq!(meta.synthesized(), "CallToolRequestParamsMeta");

        let item = NameCtx::root("Graph").property("edges").items();
        assert_eq!(item.synthesized(), "GraphEdgesItem");
    }

    #[test]
    fn test_name_table_collision() {
        let mut table = NameTable::new();
        table.register("User", NodeId(0), "/$defs/User").unwrap();
        let err = table.register("User", NodeId(1), "/$defs/user").unwrap_err();
        assert!(matches!(err, CompileError::NameCollision { .. }));
    }
}
