//! Compile options
//!
//! Options may be built programmatically, filled from CLI flags, or loaded
//! from a `typegen.toml` file:
//!
//! ```toml
//! root_name = "Envelope"
//! extra_policy = "forbid"
//! reserved_suffix = "_"
//! emit_docstrings = true
//!
//! [string_format_map]
//! uuid = "uuid"
//! email = "email"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default extensibility for objects lacking `additionalProperties`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraPolicy {
    Forbid,
    Allow,
    Ignore,
}

/// Semantic type a JSON Schema `format` string maps to.
///
/// Profiles decide the concrete spelling (`uuid` is `UUID` in the Python
/// profile and `uuid::Uuid` in the Rust profile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticFormat {
    Uuid,
    Email,
    Uri,
    DateTime,
    Date,
    Time,
    Bytes,
}

/// Enumerated configuration for a single `compile` invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Override the IR name assigned to the top-level schema
    pub root_name: Option<String>,

    /// Default extensibility for objects lacking `additionalProperties`
    pub extra_policy: ExtraPolicy,

    /// Mapping from `format` strings to semantic types
    pub string_format_map: IndexMap<String, SemanticFormat>,

    /// Character used to disambiguate reserved-word identifiers
    pub reserved_suffix: String,

    /// Whether to render `description` values
    pub emit_docstrings: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            root_name: None,
            extra_policy: ExtraPolicy::Forbid,
            string_format_map: default_format_map(),
            reserved_suffix: "_".to_string(),
            emit_docstrings: true,
        }
    }
}

/// Format strings the compiler recognizes out of the box
fn default_format_map() -> IndexMap<String, SemanticFormat> {
    let mut map = IndexMap::new();
    map.insert("uuid".to_string(), SemanticFormat::Uuid);
    map.insert("email".to_string(), SemanticFormat::Email);
    map.insert("uri".to_string(), SemanticFormat::Uri);
    map.insert("uri-reference".to_string(), SemanticFormat::Uri);
    map.insert("date-time".to_string(), SemanticFormat::DateTime);
    map.insert("date".to_string(), SemanticFormat::Date);
    map.insert("time".to_string(), SemanticFormat::Time);
    map.insert("byte".to_string(), SemanticFormat::Bytes);
    map.insert("binary".to_string(), SemanticFormat::Bytes);
    map
}

impl CompileOptions {
    /// Resolve a `format` string through the map
    pub fn semantic_format(&self, format: &str) -> Option<SemanticFormat> {
        self.string_format_map.get(format).copied()
    }

    /// Load options from a TOML file. Unset keys keep their defaults;
    /// entries in `[string_format_map]` are merged over the default map.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        #[serde(default)]
        struct Partial {
            root_name: Option<String>,
            extra_policy: Option<ExtraPolicy>,
            string_format_map: IndexMap<String, SemanticFormat>,
            reserved_suffix: Option<String>,
            emit_docstrings: Option<bool>,
        }
        impl Default for Partial {
            fn default() -> Self {
                Self {
                    root_name: None,
                    extra_policy: None,
                    string_format_map: IndexMap::new(),
                    reserved_suffix: None,
                    emit_docstrings: None,
                }
            }
        }

        let partial: Partial = toml::from_str(content)?;
        let mut options = Self::default();
        options.root_name = partial.root_name;
        if let Some(policy) = partial.extra_policy {
            options.extra_policy = policy;
        }
        for (format, semantic) in partial.string_format_map {
            options.string_format_map.insert(format, semantic);
        }
        if let Some(suffix) = partial.reserved_suffix {
            options.reserved_suffix = suffix;
        }
        if let Some(docs) = partial.emit_docstrings {
            options.emit_docstrings = docs;
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.extra_policy, ExtraPolicy::Forbid);
        assert_eq!(options.reserved_suffix, "_");
        assert!(options.emit_docstrings);
        assert_eq!(options.semantic_format("email"), Some(SemanticFormat::Email));
        assert_eq!(options.semantic_format("ipv4"), None);
    }

    #[test]
    fn test_from_toml_merges_format_map() {
        let options = CompileOptions::from_toml(
            r#"
            root_name = "Envelope"
            extra_policy = "allow"

            [string_format_map]
            ksuid = "uuid"
            "#,
        )
        .unwrap();

        assert_eq!(options.root_name.as_deref(), Some("Envelope"));
        assert_eq!(options.extra_policy, ExtraPolicy::Allow);
        // Merged on top of the defaults, not replacing them
        assert_eq!(options.semantic_format("ksuid"), Some(SemanticFormat::Uuid));
        assert_eq!(options.semantic_format("email"), Some(SemanticFormat::Email));
    }
}
