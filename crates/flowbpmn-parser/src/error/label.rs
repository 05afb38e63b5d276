//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A message attached to a span of flowchart source.
///
/// Spans cover a whole statement or one node reference inside it. A
/// diagnostic has one primary label where the problem is; a duplicate
/// declaration adds a secondary label at the node's first occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    pub(crate) fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    pub(crate) fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}
