//! Golden Tests
//!
//! End-to-end fixtures: each schema under `tests/fixtures/` compiles with the
//! Python profile and must match its expected output byte-for-byte. Rust
//! profile coverage and the error paths ride along at the bottom.

use similar::TextDiff;
use typegen::{compile, CompileError, CompileOptions, Compiled, DiagnosticKind};

fn compile_str(schema: &str, profile: &str) -> Compiled {
    compile_with(schema, profile, &CompileOptions::default())
}

fn compile_with(schema: &str, profile: &str, options: &CompileOptions) -> Compiled {
    let document: serde_json::Value = serde_json::from_str(schema).expect("fixture parses");
    compile(&document, profile, options).expect("fixture compiles")
}

fn compile_err(schema: &str, profile: &str) -> CompileError {
    let document: serde_json::Value = serde_json::from_str(schema).expect("fixture parses");
    compile(&document, profile, &CompileOptions::default()).unwrap_err()
}

fn assert_golden(actual: &str, expected: &str, name: &str) {
    if actual != expected {
        let diff = TextDiff::from_lines(expected, actual);
        panic!(
            "golden mismatch for {}:\n{}",
            name,
            diff.unified_diff().header("expected", "actual")
        );
    }
}

// =============================================================================
// Python profile goldens
// =============================================================================

#[test]
fn test_primitives_and_newtype() {
    let compiled = compile_str(include_str!("fixtures/primitives.json"), "python-models-v1");
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/primitives.py"),
        "primitives",
    );
}

#[test]
fn test_reserved_keywords() {
    let compiled = compile_str(
        include_str!("fixtures/reserved_keywords.json"),
        "python-models-v1",
    );
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/reserved_keywords.py"),
        "reserved_keywords",
    );
}

#[test]
fn test_validation_constraints() {
    let compiled = compile_str(
        include_str!("fixtures/validation_constraints.json"),
        "python-models-v1",
    );
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/validation_constraints.py"),
        "validation_constraints",
    );
}

#[test]
fn test_recursive_graphs() {
    let compiled = compile_str(include_str!("fixtures/recursive.json"), "python-models-v1");
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/recursive.py"),
        "recursive",
    );
}

#[test]
fn test_discriminated_union() {
    let compiled = compile_str(
        include_str!("fixtures/discriminated_union.json"),
        "python-models-v1",
    );
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/discriminated_union.py"),
        "discriminated_union",
    );
}

#[test]
fn test_enums() {
    let compiled = compile_str(include_str!("fixtures/enums.json"), "python-models-v1");
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/enums.py"),
        "enums",
    );
}

#[test]
fn test_arrays() {
    let compiled = compile_str(include_str!("fixtures/arrays.json"), "python-models-v1");
    assert_golden(
        &compiled.text,
        include_str!("fixtures/expected/arrays.py"),
        "arrays",
    );
}

// =============================================================================
// Structural assertions
// =============================================================================

#[test]
fn test_nested_objects_dependency_order() {
    let compiled = compile_str(
        include_str!("fixtures/nested_objects.json"),
        "python-models-v1",
    );
    let customer = compiled.text.find("class Customer").unwrap();
    let line_item = compiled.text.find("class LineItem").unwrap();
    let order = compiled.text.find("class Order").unwrap();
    assert!(customer < order, "Customer must precede Order");
    assert!(line_item < order, "LineItem must precede Order");
    assert!(compiled.text.contains("items: List[LineItem]"));
    assert!(compiled.text.contains("total: float | None = None"));
}

#[test]
fn test_content_blocks_supplements() {
    let compiled = compile_str(
        include_str!("fixtures/content_blocks.json"),
        "python-models-v1",
    );

    // Wire-name aliasing is always emitted for renamed fields
    assert!(compiled
        .text
        .contains("meta: Dict[str, Any] | None = Field(alias=\"_meta\", default=None)"));
    assert!(compiled
        .text
        .contains("mime_type: str = Field(alias=\"mimeType\")"));

    // Open union: no shared literal tag, so no discriminator
    assert!(compiled
        .text
        .contains("ContentBlock = Union[TextContent, ImageContent]"));

    // format: byte maps to bytes; ref constraints attach at the field
    assert!(compiled.text.contains("data: bytes"));
    assert!(compiled
        .text
        .contains("priority: float | None = Field(ge=0, le=1, default=None)"));

    // Docstrings render above their hosts
    assert!(compiled.text.contains(
        "\"\"\"A progress token, used to associate progress notifications with the original request.\"\"\"\nclass ProgressToken(RootModel[Any]):"
    ));
    assert!(compiled
        .text
        .contains("    \"\"\"How important this data is.\"\"\"\n    priority:"));
}

#[test]
fn test_field_ordering_is_lexicographic() {
    let compiled = compile_str(
        include_str!("fixtures/nested_objects.json"),
        "python-models-v1",
    );

    for block in compiled.text.split("class ").skip(1) {
        let fields: Vec<&str> = block
            .lines()
            .filter(|line| line.starts_with("    ") && line.contains(": ") && !line.contains("model_config"))
            .filter_map(|line| line.trim().split(':').next())
            .collect();
        let mut sorted = fields.clone();
        sorted.sort_unstable();
        assert_eq!(fields, sorted, "fields out of order in block:\n{}", block);
    }
}

#[test]
fn test_determinism() {
    let schema = include_str!("fixtures/discriminated_union.json");
    let first = compile_str(schema, "python-models-v1");
    let second = compile_str(schema, "python-models-v1");
    assert_eq!(first.text, second.text);

    let rust_first = compile_str(schema, "rust-models-v1");
    let rust_second = compile_str(schema, "rust-models-v1");
    assert_eq!(rust_first.text, rust_second.text);
}

#[test]
fn test_any_content_warning() {
    let compiled = compile_str(
        r#"{
            "$defs": {
                "SamplingMessage": {
                    "type": "object",
                    "properties": { "content": {}, "role": { "type": "string" } },
                    "required": ["content", "role"]
                }
            }
        }"#,
        "python-models-v1",
    );
    assert!(compiled.text.contains("content: Any"));
    assert!(compiled
        .diagnostics
        .warnings()
        .any(|d| d.kind == DiagnosticKind::AnyContent));
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_root_name_override() {
    let mut options = CompileOptions::default();
    options.root_name = Some("Envelope".to_string());
    let compiled = compile_with(
        r#"{ "type": "object", "properties": { "id": { "type": "string" } } }"#,
        "python-models-v1",
        &options,
    );
    assert!(compiled.text.contains("class Envelope(BaseModel):"));
}

#[test]
fn test_extra_policy_allow() {
    let mut options = CompileOptions::default();
    options.extra_policy = typegen::ExtraPolicy::Allow;
    let compiled = compile_with(
        r#"{ "title": "Loose", "type": "object", "properties": { "id": { "type": "string" } } }"#,
        "python-models-v1",
        &options,
    );
    assert!(compiled
        .text
        .contains("model_config = ConfigDict(extra=\"allow\")"));
}

#[test]
fn test_docstrings_can_be_disabled() {
    let mut options = CompileOptions::default();
    options.emit_docstrings = false;
    let compiled = compile_with(
        include_str!("fixtures/content_blocks.json"),
        "python-models-v1",
        &options,
    );
    assert!(!compiled.text.contains("\"\"\""));
}

#[test]
fn test_options_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typegen.toml");
    std::fs::write(&path, "root_name = \"Envelope\"\nextra_policy = \"ignore\"\n").unwrap();

    let options = CompileOptions::from_toml_file(&path).unwrap();
    assert_eq!(options.root_name.as_deref(), Some("Envelope"));
    assert_eq!(options.extra_policy, typegen::ExtraPolicy::Ignore);
}

// =============================================================================
// Rust profile
// =============================================================================

#[test]
fn test_rust_recursive_boxing() {
    let compiled = compile_str(include_str!("fixtures/recursive.json"), "rust-models-v1");
    assert!(compiled
        .text
        .contains("pub next: Option<Box<LinkedListNode>>,"));
    assert!(compiled.text.contains("pub target: Box<Graph>,"));
    // Vec already provides indirection
    assert!(compiled
        .text
        .contains("pub edges: Option<Vec<GraphEdgesItem>>,"));
}

#[test]
fn test_rust_reserved_keywords() {
    let compiled = compile_str(
        include_str!("fixtures/reserved_keywords.json"),
        "rust-models-v1",
    );
    assert!(compiled.text.contains("pub r#type: String,"));
    assert!(compiled.text.contains("pub r#from: Option<String>,"));
    // `class` is not a Rust keyword and passes through
    assert!(compiled.text.contains("pub class: String,"));
}

#[test]
fn test_rust_tagged_union() {
    let compiled = compile_str(
        include_str!("fixtures/discriminated_union.json"),
        "rust-models-v1",
    );
    assert!(compiled.text.contains("#[serde(tag = \"type\")]"));
    assert!(compiled.text.contains("pub enum Event {"));
    assert!(compiled
        .text
        .contains("    #[serde(rename = \"created\")]\n    Created(CreatedEvent),"));
    // The internal tag carries the literal; variant structs drop it
    assert!(!compiled.text.contains("pub r#type"));
    // Inheritance renders as flattened embedding
    assert!(compiled
        .text
        .contains("    #[serde(flatten)]\n    pub base_event: BaseEvent,"));
}

#[test]
fn test_rust_enum_renames() {
    let compiled = compile_str(include_str!("fixtures/enums.json"), "rust-models-v1");
    assert!(compiled.text.contains("pub enum Status {"));
    assert!(compiled
        .text
        .contains("    #[serde(rename = \"in_progress\")]\n    InProgress,"));
}

#[test]
fn test_rust_newtype() {
    let compiled = compile_str(include_str!("fixtures/primitives.json"), "rust-models-v1");
    assert!(compiled.text.contains("pub struct Amount(pub f64);"));
    assert!(compiled.text.contains("#[serde(deny_unknown_fields)]"));
}

#[test]
fn test_rust_profile_rejects_exclusive_bounds() {
    let err = compile_err(
        include_str!("fixtures/validation_constraints.json"),
        "rust-models-v1",
    );
    assert!(matches!(err, CompileError::ProfileMismatch { .. }));
}

// =============================================================================
// Error paths
// =============================================================================

#[test]
fn test_unknown_profile() {
    let err = compile_err("{}", "csharp-models-v1");
    assert!(matches!(err, CompileError::UnknownProfile { .. }));
    assert_eq!(err.render(), "error[profile]: unknown profile 'csharp-models-v1'");
}

#[test]
fn test_external_ref_is_input_error() {
    let err = compile_err(
        r#"{ "type": "object", "properties": { "x": { "$ref": "https://example.com/a.json" } } }"#,
        "python-models-v1",
    );
    assert!(matches!(err, CompileError::ExternalRef { .. }));
}

#[test]
fn test_unresolvable_ref_reports_pointer() {
    let err = compile_err(
        r##"{ "$defs": { "A": { "type": "object", "properties": { "x": { "$ref": "#/$defs/Missing" } } } } }"##,
        "python-models-v1",
    );
    match &err {
        CompileError::UnresolvableRef { pointer, .. } => {
            assert_eq!(pointer, "/$defs/A/properties/x");
        }
        other => panic!("expected UnresolvableRef, got {:?}", other),
    }
}

#[test]
fn test_unsupported_dialect() {
    let err = compile_err(
        r#"{ "$schema": "http://json-schema.org/draft-07/schema#", "type": "object" }"#,
        "python-models-v1",
    );
    assert!(matches!(err, CompileError::UnsupportedDialect { .. }));
}

#[test]
fn test_empty_enum() {
    let err = compile_err(
        r#"{ "$defs": { "Color": { "type": "string", "enum": [] } } }"#,
        "python-models-v1",
    );
    assert!(matches!(err, CompileError::EmptyEnum { .. }));
}

#[test]
fn test_discriminator_disagreement() {
    let err = compile_err(
        r##"{
            "$defs": {
                "A": {
                    "type": "object",
                    "properties": { "kind": { "const": "a" } }
                },
                "B": {
                    "type": "object",
                    "properties": { "kind": { "const": "b" } }
                },
                "Union": {
                    "oneOf": [ { "$ref": "#/$defs/A" }, { "$ref": "#/$defs/B" } ],
                    "discriminator": { "propertyName": "type" }
                }
            }
        }"##,
        "python-models-v1",
    );
    assert!(matches!(err, CompileError::DiscriminatorMismatch { .. }));
}

#[test]
fn test_duplicate_discriminator_tag() {
    let err = compile_err(
        r##"{
            "$defs": {
                "A": { "type": "object", "properties": { "kind": { "const": "same" } } },
                "B": { "type": "object", "properties": { "kind": { "const": "same" } } },
                "Union": { "oneOf": [ { "$ref": "#/$defs/A" }, { "$ref": "#/$defs/B" } ] }
            }
        }"##,
        "python-models-v1",
    );
    assert!(matches!(err, CompileError::CannotLower { .. }));
}

#[test]
fn test_reserved_word_clash_after_escape() {
    // `class` rewrites to `class_` under the Python profile and collides
    // with the field that is literally named `class_`
    let schema = r#"{
        "$defs": {
            "Task": {
                "type": "object",
                "properties": {
                    "class": { "type": "string" },
                    "class_": { "type": "string" }
                },
                "required": ["class"]
            }
        }
    }"#;

    let err = compile_err(schema, "python-models-v1");
    match &err {
        CompileError::ReservedWordClash { name, pointer } => {
            assert_eq!(name, "class_");
            assert_eq!(pointer, "/$defs/Task");
        }
        other => panic!("expected ReservedWordClash, got {:?}", other),
    }

    // `class` is not a Rust keyword, so the Rust profile has no clash
    let compiled = compile_with(schema, "rust-models-v1", &CompileOptions::default());
    assert!(compiled.text.contains("pub class: String,"));
    assert!(compiled.text.contains("pub class_: Option<String>,"));
}

#[test]
fn test_unattachable_constraint_on_object_ref() {
    let err = compile_err(
        r##"{
            "$defs": {
                "User": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                },
                "Team": {
                    "type": "object",
                    "properties": {
                        "owner": { "$ref": "#/$defs/User", "minLength": 3 }
                    }
                }
            }
        }"##,
        "python-models-v1",
    );
    match &err {
        CompileError::UnattachableConstraint { constraint, pointer } => {
            assert_eq!(constraint, "minLength");
            assert_eq!(pointer, "/$defs/Team/properties/owner");
        }
        other => panic!("expected UnattachableConstraint, got {:?}", other),
    }
}

#[test]
fn test_use_site_constraint_on_newtype_ref_is_attachable() {
    // A ref to a transparent primitive wrapper carries the constraint fine
    let compiled = compile_str(
        r##"{
            "$defs": {
                "Amount": { "type": "number" },
                "Invoice": {
                    "type": "object",
                    "properties": {
                        "total": { "$ref": "#/$defs/Amount", "minimum": 0 }
                    },
                    "required": ["total"]
                }
            }
        }"##,
        "python-models-v1",
    );
    assert!(compiled.text.contains("total: Amount = Field(ge=0)"));
}

#[test]
fn test_oneof_of_consts_is_an_enum() {
    let compiled = compile_str(
        r#"{
            "$defs": {
                "Mode": {
                    "oneOf": [ { "const": "read" }, { "const": "write" } ]
                }
            }
        }"#,
        "python-models-v1",
    );
    assert!(compiled.text.contains("class Mode(str, Enum):"));
    assert!(compiled.text.contains("    READ = \"read\""));
    assert!(compiled.text.contains("    WRITE = \"write\""));
}
