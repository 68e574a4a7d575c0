use thiserror::Error;

/// Classification of a decode failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Node kind does not match the schema expectation
    TypeMismatch,
    /// More than one candidate key of a choice field is present
    AmbiguousChoice,
    /// Value key and extension-carrier key resolve different candidates
    InconsistentChoice,
    /// Strict mode found a document key the schema does not account for
    UnrecognizedElement,
    /// Resource kind is known but outside the configured allow-list
    UnsupportedResourceKind,
    /// Resource kind (or entry-point type) is not in the schema
    UnknownResourceKind,
    /// Recursion exceeded the configured maximum depth
    DepthExceeded,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TypeMismatch => "type-mismatch",
            Self::AmbiguousChoice => "ambiguous-choice",
            Self::InconsistentChoice => "inconsistent-choice",
            Self::UnrecognizedElement => "unrecognized-element",
            Self::UnsupportedResourceKind => "unsupported-resource-kind",
            Self::UnknownResourceKind => "unknown-resource-kind",
            Self::DepthExceeded => "depth-exceeded",
        };
        write!(f, "{}", s)
    }
}

/// A decode failure with its structural location
///
/// `path` is rendered as of the failure point, dotted with bracketed array
/// indices (`Patient.name[0].given[2]`).
#[derive(Debug, Error)]
#[error("{kind}: {message} (at {path})")]
pub struct DecodeError {
    pub kind: ErrorKind,
    pub path: String,
    pub message: String,
    #[source]
    pub cause: Option<Box<DecodeError>>,
}

impl DecodeError {
    pub(crate) fn new(kind: ErrorKind, path: String, message: String) -> Self {
        Self {
            kind,
            path,
            message,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: DecodeError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Errors raised when compiling a [`crate::DecoderConfig`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_recursion_depth must be at least 1")]
    ZeroRecursionDepth,

    #[error("supported resource kind list is present but empty")]
    EmptySupportSet,

    #[error("supported resource kind '{0}' is listed more than once")]
    DuplicateResourceKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_renders_kebab_case() {
        assert_eq!(ErrorKind::TypeMismatch.to_string(), "type-mismatch");
        assert_eq!(
            ErrorKind::UnsupportedResourceKind.to_string(),
            "unsupported-resource-kind"
        );
    }

    #[test]
    fn decode_error_display_includes_path() {
        let err = DecodeError::new(
            ErrorKind::TypeMismatch,
            "Patient.name[0].family".to_string(),
            "expected string, found number".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "type-mismatch: expected string, found number (at Patient.name[0].family)"
        );
    }

    #[test]
    fn cause_chain_is_reachable_through_source() {
        use std::error::Error as _;

        let inner = DecodeError::new(
            ErrorKind::TypeMismatch,
            "Patient.deceasedBoolean".to_string(),
            "expected boolean, found string".to_string(),
        );
        let outer = DecodeError::new(
            ErrorKind::TypeMismatch,
            "Patient".to_string(),
            "resource body is invalid".to_string(),
        )
        .with_cause(inner);

        assert!(outer.source().is_some());
    }
}
