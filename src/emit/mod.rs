//! Emission Profiles
//!
//! A profile is a record of rendering decisions: type spellings, reserved
//! words and their rewrite rule, and the target language dispatch. All
//! profiles consume the same module graph; `render` is deterministic and does
//! no I/O.
//!
//! The profile set is closed: `python-models-v1` and `rust-models-v1`.

pub mod python;
pub mod rust;

use crate::error::{CompileError, Result};
use crate::ir::Module;
use crate::options::CompileOptions;

/// Supported target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Rust,
}

/// How reserved identifiers are rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordStyle {
    /// Append the configured suffix (`class` -> `class_`)
    Suffix,
    /// Raw identifier prefix (`type` -> `r#type`)
    RawPrefix,
}

/// Type spellings for JSON scalars and semantic formats
#[derive(Debug, Clone)]
pub struct TypeMappings {
    pub string: &'static str,
    pub integer: &'static str,
    pub number: &'static str,
    pub boolean: &'static str,
    pub bytes: &'static str,
    pub any: &'static str,
    pub datetime: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub uuid: &'static str,
    pub email: &'static str,
    pub uri: &'static str,
}

/// A named bundle of rendering decisions for one target output dialect
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    pub language: Language,
    pub types: TypeMappings,
    pub keywords: &'static [&'static str],
    pub keyword_style: KeywordStyle,
}

impl Profile {
    pub fn python_models_v1() -> Self {
        Self {
            name: "python-models-v1",
            language: Language::Python,
            types: TypeMappings {
                string: "str",
                integer: "int",
                number: "float",
                boolean: "bool",
                bytes: "bytes",
                any: "Any",
                datetime: "datetime",
                date: "date",
                time: "time",
                uuid: "UUID",
                email: "EmailStr",
                uri: "AnyUrl",
            },
            keywords: PYTHON_KEYWORDS,
            keyword_style: KeywordStyle::Suffix,
        }
    }

    pub fn rust_models_v1() -> Self {
        Self {
            name: "rust-models-v1",
            language: Language::Rust,
            types: TypeMappings {
                string: "String",
                integer: "i64",
                number: "f64",
                boolean: "bool",
                bytes: "Vec<u8>",
                any: "serde_json::Value",
                datetime: "chrono::DateTime<chrono::Utc>",
                date: "chrono::NaiveDate",
                time: "chrono::NaiveTime",
                uuid: "uuid::Uuid",
                email: "String",
                uri: "String",
            },
            keywords: RUST_KEYWORDS,
            keyword_style: KeywordStyle::RawPrefix,
        }
    }

    /// Rewrite an identifier that collides with a reserved word. Identifiers
    /// that are not reserved pass through untouched.
    pub fn escape_keyword(&self, name: &str, reserved_suffix: &str) -> String {
        if !self.keywords.contains(&name) {
            return name.to_string();
        }
        match self.keyword_style {
            KeywordStyle::Suffix => format!("{}{}", name, reserved_suffix),
            KeywordStyle::RawPrefix => {
                // A few keywords cannot be raw identifiers
                if matches!(name, "self" | "Self" | "super" | "crate") {
                    format!("{}{}", name, reserved_suffix)
                } else {
                    format!("r#{}", name)
                }
            }
        }
    }
}

/// Look up a profile by its identifier
pub fn profile(name: &str) -> Result<Profile> {
    match name {
        "python-models-v1" => Ok(Profile::python_models_v1()),
        "rust-models-v1" => Ok(Profile::rust_models_v1()),
        _ => Err(CompileError::UnknownProfile {
            name: name.to_string(),
        }),
    }
}

/// Render the module graph as target source text
pub fn render(module: &Module, profile: &Profile, options: &CompileOptions) -> Result<String> {
    match profile.language {
        Language::Python => python::render(module, profile, options),
        Language::Rust => rust::render(module, profile, options),
    }
}

/// Post-escape identifier check. Reserved-word rewriting must not fold two
/// fields of one declaration into the same rendered name; when it does, the
/// profile has no rewrite left and the clash is a hard failure.
pub(crate) fn check_rendered_names(names: &[String], pointer: &str) -> Result<()> {
    for (index, name) in names.iter().enumerate() {
        if names[..index].contains(name) {
            return Err(CompileError::ReservedWordClash {
                name: name.clone(),
                pointer: pointer.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Keywords
// =============================================================================

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break",
    "class", "continue", "def", "del", "elif", "else", "except", "finally",
    "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
    "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
    "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        assert!(profile("python-models-v1").is_ok());
        assert!(profile("rust-models-v1").is_ok());
        let err = profile("typescript-models-v1").unwrap_err();
        assert!(matches!(err, CompileError::UnknownProfile { .. }));
    }

    #[test]
    fn test_rendered_name_collision() {
        let names = vec!["class_".to_string(), "class_".to_string()];
        let err = check_rendered_names(&names, "/$defs/Task").unwrap_err();
        assert!(matches!(err, CompileError::ReservedWordClash { .. }));

        let distinct = vec!["class_".to_string(), "name".to_string()];
        assert!(check_rendered_names(&distinct, "/$defs/Task").is_ok());
    }

    #[test]
    fn test_keyword_escape() {
        let python = Profile::python_models_v1();
        assert_eq!(python.escape_keyword("class", "_"), "class_");
        assert_eq!(python.escape_keyword("from", "_"), "from_");
        assert_eq!(python.escape_keyword("type", "_"), "type");
        assert_eq!(python.escape_keyword("name", "_"), "name");

        let rust = Profile::rust_models_v1();
        assert_eq!(rust.escape_keyword("type", "_"), "r#type");
        assert_eq!(rust.escape_keyword("self", "_"), "self_");
        assert_eq!(rust.escape_keyword("name", "_"), "name");
    }
}
