//! The ParseError type for wrapping fatal parsing diagnostics.

use std::fmt;

use crate::error::Diagnostic;

/// Error type for a parse that produced no AST.
///
/// Wraps the fatal diagnostics that withheld it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// All diagnostic messages joined with `", "`.
    ///
    /// ```
    /// # use flowbpmn_parser::error::{Diagnostic, ErrorCode, ParseError};
    /// let err = ParseError::new(vec![
    ///     Diagnostic::new(ErrorCode::E200, "a"),
    ///     Diagnostic::new(ErrorCode::E200, "b"),
    /// ]);
    /// assert_eq!(err.messages(), "a, b");
    /// ```
    pub fn messages(&self) -> String {
        self.diagnostics
            .iter()
            .map(Diagnostic::message)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}
