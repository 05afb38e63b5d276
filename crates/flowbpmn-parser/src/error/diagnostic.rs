//! The core diagnostic type.
//!
//! Every [`Diagnostic`] the parser reports is keyed by an [`ErrorCode`]; the
//! code decides whether it is fatal. Labels point at the statement that
//! caused it.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::Span,
};

/// A coded parser finding with source location information.
///
/// Rendered by the CLI roughly as:
///
/// ```text
/// warning[W101]: Duplicate node definition: A at line 3
///   --> process.mmd:3:1
///    |
///  1 | A[Start] --> B
///    | -------- first seen here
///  3 | A[Again]
///    | ^^^^^^^^ duplicate declaration
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: ErrorCode,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic for `code`. Its severity comes from the code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The user-facing message, also used in conversion warnings.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Point at the span that caused this finding.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Point at a related span, e.g. an earlier declaration.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for Diagnostic {}
