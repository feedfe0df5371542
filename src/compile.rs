//! Compile Driver
//!
//! One entry point: `compile(document, profile, options)`. Stages run in a
//! fixed order (loader, normalizer, emitter); each produces a new value and
//! never mutates its input. The driver halts on the first error; warnings
//! accumulate and ride along with the output.
//!
//! The compiler is a pure function: same document and profile, same bytes.

use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::emit;
use crate::error::Result;
use crate::loader;
use crate::normalize;
use crate::options::CompileOptions;

/// Successful compilation output
#[derive(Debug, Clone)]
pub struct Compiled {
    /// Emitted source text (UTF-8, byte-stable)
    pub text: String,
    /// Warnings collected across all stages
    pub diagnostics: Diagnostics,
}

/// Compile a schema document to typed data-model source text
pub fn compile(document: &Value, profile_name: &str, options: &CompileOptions) -> Result<Compiled> {
    let profile = emit::profile(profile_name)?;
    let mut diagnostics = Diagnostics::new();

    tracing::debug!(profile = profile.name, "compilation started");

    let resolved = loader::resolve(document, &mut diagnostics)?;
    let module = normalize::normalize(&resolved, options, &mut diagnostics)?;
    let text = emit::render(&module, &profile, options)?;

    tracing::debug!(
        bytes = text.len(),
        warnings = diagnostics.warning_count(),
        "compilation finished"
    );

    Ok(Compiled { text, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_is_deterministic() {
        let schema = json!({
            "$defs": {
                "User": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "age": { "type": "integer" }
                    },
                    "required": ["name"]
                }
            }
        });
        let options = CompileOptions::default();
        let first = compile(&schema, "python-models-v1", &options).unwrap();
        let second = compile(&schema, "python-models-v1", &options).unwrap();
        assert_eq!(first.text, second.text);
    }

    #[test]
    fn test_unknown_profile() {
        let err = compile(&json!({}), "no-such-profile", &CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::UnknownProfile { .. }
        ));
    }
}
