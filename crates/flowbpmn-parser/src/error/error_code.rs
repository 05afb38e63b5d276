//! Error codes for the flowchart diagnostic system.
//!
//! Codes are organized by phase:
//! - `E2xx` - Reference errors
//! - `W1xx` - Syntax advisories
//! - `W2xx` - Structural advisories

use std::fmt;

use crate::error::Severity;

/// Codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Reference Errors (E2xx)
    // =========================================================================
    /// An edge endpoint names a node that was never declared.
    E200,

    // =========================================================================
    // Syntax Advisories (W1xx)
    // =========================================================================
    /// The line matches none of the supported statement forms.
    W100,

    /// A node id was declared more than once; the first declaration is kept.
    W101,

    /// A `subgraph` line without an id.
    W102,

    // =========================================================================
    // Structural Advisories (W2xx)
    // =========================================================================
    /// No node was classified as a start node.
    W200,

    /// No node was classified as an end node.
    W201,

    /// A non-start node has no incoming edges.
    W202,

    /// A non-end node has no outgoing edges.
    W203,
}

impl ErrorCode {
    /// `E` codes withhold the AST, `W` codes travel alongside it.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::E200 => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E200 => "E200",
            ErrorCode::W100 => "W100",
            ErrorCode::W101 => "W101",
            ErrorCode::W102 => "W102",
            ErrorCode::W200 => "W200",
            ErrorCode::W201 => "W201",
            ErrorCode::W202 => "W202",
            ErrorCode::W203 => "W203",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E200 => "undefined node",
            ErrorCode::W100 => "unrecognized syntax",
            ErrorCode::W101 => "duplicate node declaration",
            ErrorCode::W102 => "malformed subgraph header",
            ErrorCode::W200 => "missing start node",
            ErrorCode::W201 => "missing end node",
            ErrorCode::W202 => "no incoming connections",
            ErrorCode::W203 => "no outgoing connections",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E200.to_string(), "E200");
        assert_eq!(ErrorCode::W100.to_string(), "W100");
        assert_eq!(ErrorCode::W203.to_string(), "W203");
    }

    #[test]
    fn test_severity_follows_prefix() {
        assert!(ErrorCode::E200.severity().is_error());
        for code in [ErrorCode::W100, ErrorCode::W101, ErrorCode::W102, ErrorCode::W203] {
            assert!(code.severity().is_warning(), "{code}");
        }
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E200.description(), "undefined node");
        assert_eq!(ErrorCode::W101.description(), "duplicate node declaration");
    }
}
