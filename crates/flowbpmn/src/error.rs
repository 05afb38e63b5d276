//! Error types for flowbpmn operations.
//!
//! This module provides the main error type [`ConversionError`] which wraps
//! the error conditions that can stop a conversion.

use std::io;

use thiserror::Error;

use flowbpmn_parser::error::ParseError;

/// The main error type for flowbpmn operations.
///
/// Only a missing AST stops a conversion; advisories travel in the
/// conversion result instead.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the structured
/// diagnostics so callers can render labelled snippets.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse flowchart: {}", err.messages())]
    Parse { err: ParseError, src: String },

    #[error("Export error: {0}")]
    Export(String),
}

impl From<crate::export::Error> for ConversionError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(error.to_string())
    }
}

impl ConversionError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
