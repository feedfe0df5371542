//! Diagnostics
//!
//! Collects warnings and errors during compilation passes.
//! Every item carries the JSON Pointer of the schema node it refers to.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Kinds
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Keyword outside the interpreted subset (preserved, does not affect emission)
    UnknownKeyword,
    /// `pattern` constraint is not valid regex syntax
    InvalidPattern,
    /// Field typed as `Any` where a richer type would be plausible
    AnyContent,
    /// `false` schema used as a field type (treated as `Any`)
    NothingSchema,
    /// Deprecated `definitions` keyword used instead of `$defs`
    LegacyDefinitions,
    /// Duplicate entry in `required`
    DuplicateRequired,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownKeyword => "W001",
            Self::InvalidPattern => "W002",
            Self::AnyContent => "W003",
            Self::NothingSchema => "W004",
            Self::LegacyDefinitions => "W005",
            Self::DuplicateRequired => "W006",
        }
    }

    pub fn severity(&self) -> Severity {
        // Hard failures are CompileError variants; everything collected
        // here is advisory.
        Severity::Warning
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// JSON Pointer into the input document
    pub pointer: String,
    /// Diagnostic code
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
    /// Additional context lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl Diagnostic {
    pub fn new(pointer: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            kind,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}: {}",
            self.kind,
            self.severity(),
            self.pointer,
            self.message
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from compilation passes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: Diagnostic) {
        self.items.push(item);
    }

    /// Add a warning
    pub fn warning(
        &mut self,
        pointer: impl Into<String>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(pointer, kind, message));
    }

    /// Record a keyword outside the interpreted subset
    pub fn unknown_keyword(&mut self, pointer: impl Into<String>, keyword: &str) {
        self.push(Diagnostic::new(
            pointer,
            DiagnosticKind::UnknownKeyword,
            format!("keyword '{}' is outside the interpreted subset and does not affect emission", keyword),
        ));
    }

    /// Record an unparsable `pattern` constraint
    pub fn invalid_pattern(&mut self, pointer: impl Into<String>, pattern: &str, detail: &str) {
        self.push(
            Diagnostic::new(
                pointer,
                DiagnosticKind::InvalidPattern,
                format!("pattern '{}' is not valid regex syntax", pattern),
            )
            .with_context(detail.to_string()),
        );
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Get all items
    pub fn all(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.unknown_keyword("/$defs/User", "examples");
        diags.invalid_pattern("/$defs/User/properties/name", "[", "unclosed character class");

        assert_eq!(diags.warning_count(), 2);
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_display_carries_pointer() {
        let item = Diagnostic::new("/properties/x", DiagnosticKind::UnknownKeyword, "msg");
        let rendered = item.to_string();
        assert!(rendered.contains("/properties/x"));
        assert!(rendered.contains("W001"));
    }
}
