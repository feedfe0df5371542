//! Error types for the schema compiler

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Closed error taxonomy. Every variant carries the JSON Pointer of the
/// schema node that caused it.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("document root is not a schema (expected object or boolean)")]
    MalformedDocument,

    #[error("unsupported schema dialect: {dialect}")]
    UnsupportedDialect { dialect: String, pointer: String },

    #[error("external reference '{target}' cannot be resolved (network I/O is not supported)")]
    ExternalRef { target: String, pointer: String },

    #[error("reference '{target}' does not resolve to a schema node")]
    UnresolvableRef { target: String, pointer: String },

    #[error("reference cycle closes through anonymous subtrees only")]
    CyclicRefWithoutNamedHost { pointer: String },

    #[error("composition cannot be lowered: {reason}")]
    CannotLower { reason: String, pointer: String },

    #[error("discriminator disagreement: schema declares '{declared}' but variants share '{found}'")]
    DiscriminatorMismatch {
        declared: String,
        found: String,
        pointer: String,
    },

    #[error("enum has no values")]
    EmptyEnum { pointer: String },

    #[error("declaration name '{name}' collides with an earlier declaration")]
    NameCollision { name: String, pointer: String },

    #[error("identifier '{name}' is reserved and the profile has no rewrite for it")]
    ReservedWordClash { name: String, pointer: String },

    #[error("constraint '{constraint}' cannot be attached at this position")]
    UnattachableConstraint { constraint: String, pointer: String },

    #[error("unknown profile '{name}'")]
    UnknownProfile { name: String },

    #[error("profile '{profile}' cannot express {feature}")]
    ProfileMismatch {
        profile: String,
        feature: String,
        pointer: String,
    },
}

/// Coarse error categories, used for the one-line user rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Resolution,
    Structure,
    Naming,
    Constraint,
    Profile,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Resolution => "resolution",
            Self::Structure => "structure",
            Self::Naming => "naming",
            Self::Constraint => "constraint",
            Self::Profile => "profile",
        }
    }
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedDocument | Self::UnsupportedDialect { .. } | Self::ExternalRef { .. } => {
                ErrorKind::Input
            }
            Self::UnresolvableRef { .. } | Self::CyclicRefWithoutNamedHost { .. } => {
                ErrorKind::Resolution
            }
            Self::CannotLower { .. }
            | Self::DiscriminatorMismatch { .. }
            | Self::EmptyEnum { .. } => ErrorKind::Structure,
            Self::NameCollision { .. } | Self::ReservedWordClash { .. } => ErrorKind::Naming,
            Self::UnattachableConstraint { .. } => ErrorKind::Constraint,
            Self::UnknownProfile { .. } | Self::ProfileMismatch { .. } => ErrorKind::Profile,
        }
    }

    /// JSON Pointer of the offending schema node, when one exists.
    pub fn pointer(&self) -> Option<&str> {
        match self {
            Self::MalformedDocument | Self::UnknownProfile { .. } => None,
            Self::UnsupportedDialect { pointer, .. }
            | Self::ExternalRef { pointer, .. }
            | Self::UnresolvableRef { pointer, .. }
            | Self::CyclicRefWithoutNamedHost { pointer }
            | Self::CannotLower { pointer, .. }
            | Self::DiscriminatorMismatch { pointer, .. }
            | Self::EmptyEnum { pointer }
            | Self::NameCollision { pointer, .. }
            | Self::ReservedWordClash { pointer, .. }
            | Self::UnattachableConstraint { pointer, .. }
            | Self::ProfileMismatch { pointer, .. } => Some(pointer),
        }
    }

    /// One-line rendering: `error[kind] at <pointer>: <message>`
    pub fn render(&self) -> String {
        match self.pointer() {
            Some(ptr) => format!("error[{}] at {}: {}", self.kind().as_str(), ptr, self),
            None => format!("error[{}]: {}", self.kind().as_str(), self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = CompileError::UnresolvableRef {
            target: "#/$defs/Missing".into(),
            pointer: "/properties/x".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(err.pointer(), Some("/properties/x"));
    }

    #[test]
    fn test_render_format() {
        let err = CompileError::EmptyEnum {
            pointer: "/$defs/Color".into(),
        };
        assert_eq!(err.render(), "error[structure] at /$defs/Color: enum has no values");

        let err = CompileError::UnknownProfile { name: "bogus".into() };
        assert_eq!(err.render(), "error[profile]: unknown profile 'bogus'");
    }
}
