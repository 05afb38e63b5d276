//! Collector for accumulating diagnostics during parsing.

use crate::error::Diagnostic;

/// Accumulates diagnostics so every phase can keep going after a problem.
///
/// Unlike a plain `Vec`, the collector tracks whether a fatal diagnostic was
/// seen and splits the result into errors and warnings on [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` once any error-severity diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection, returning `(errors, warnings)` in emission order.
    pub fn finish(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.diagnostics
            .into_iter()
            .partition(|diagnostic| diagnostic.severity().is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_new_finish_empty() {
        let collector = DiagnosticCollector::new();
        assert!(!collector.has_errors());

        let (errors, warnings) = collector.finish();
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_collector_emit_warning_keeps_clean() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::new(ErrorCode::W200, "No explicit start node found."));

        assert!(!collector.has_errors());
    }

    #[test]
    fn test_collector_splits_by_severity() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(
            Diagnostic::new(ErrorCode::E200, "error 1").with_label(Span::new(10..20), "here"),
        );
        collector.emit(Diagnostic::new(ErrorCode::W101, "warning 1"));
        collector.emit(Diagnostic::new(ErrorCode::E200, "error 2"));

        assert!(collector.has_errors());
        let (errors, warnings) = collector.finish();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message(), "error 1");
        assert_eq!(errors[1].message(), "error 2");
        assert_eq!(warnings.len(), 1);
    }
}
