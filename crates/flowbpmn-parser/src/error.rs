//! Error and diagnostic system for the flowchart parser.
//!
//! Parsing never stops at the first problem. Every phase reports
//! [`Diagnostic`]s into a collector. Each diagnostic carries an [`ErrorCode`]
//! whose [`Severity`] decides its fate: `E` codes withhold the AST, `W` codes
//! travel alongside it.
//!
//! # Example
//!
//! ```
//! # use flowbpmn_parser::error::{Diagnostic, ErrorCode};
//! # use flowbpmn_parser::Span;
//!
//! let diag = Diagnostic::new(ErrorCode::E200, "Edge references undefined target node: Z")
//!     .with_label(Span::new(0..6), "undefined node")
//!     .with_help("declare `Z` with a shape, e.g. `Z[Task]`");
//! assert!(diag.severity().is_error());
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
