//! typegen
//!
//! A JSON Schema (Draft 2020-12 subset) to typed data-model code generator.
//!
//! ## Pipeline
//!
//! ```text
//! raw schema document
//!     -> Loader            ($ref resolution, $defs table, anchor flattening)
//!     -> Normalizer        (naming, composition lowering, SCC analysis, ordering)
//!     -> Emission Profile  (per-target rendering)
//!     -> source text
//! ```
//!
//! Each invocation is a pure function from (document, profile, options) to
//! (text, diagnostics); no stage mutates its input and no global state exists.

pub mod compile;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod ir;
pub mod loader;
pub mod normalize;
pub mod options;

pub use compile::{compile, Compiled};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{CompileError, ErrorKind, Result};
pub use options::{CompileOptions, ExtraPolicy, SemanticFormat};
