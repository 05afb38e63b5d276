//! Token definitions produced by the [`lexer`](super::lexer).

use std::fmt;

use flowbpmn_core::flowchart::Shape;

use crate::span::Span;

/// Line style of an arrow token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKind {
    /// `-->`, `--->`, `---`
    Solid,
    /// `-.->`, `-..->`
    Dotted,
    /// `==>`, `===>`
    Thick,
}

/// Token types for the flowchart notation
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// A word made of ASCII letters, digits and underscores.
    Identifier(&'src str),

    /// A bracketed node shape with its raw inner text.
    Shape(Shape, &'src str),

    Arrow(ArrowKind),

    /// Pipe-delimited edge text: `|Yes|`
    EdgeText(&'src str),

    /// `:::` class suffix marker
    ClassMarker,

    /// `;` statement separator
    Semicolon,

    /// `%% comment`
    LineComment(&'src str),

    Whitespace,
    Newline,

    /// Any other single character.
    Punct(char),
}

impl Token<'_> {
    /// Whitespace and comments carry no meaning for the grammar.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::LineComment(_))
    }

    /// Newlines and semicolons end a statement.
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Newline | Token::Semicolon)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::Shape(shape, text) => write!(f, "{shape:?} shape '{text}'"),
            Token::Arrow(ArrowKind::Solid) => write!(f, "arrow '-->'"),
            Token::Arrow(ArrowKind::Dotted) => write!(f, "arrow '-.->'"),
            Token::Arrow(ArrowKind::Thick) => write!(f, "arrow '==>'"),
            Token::EdgeText(text) => write!(f, "edge text '|{text}|'"),
            Token::ClassMarker => write!(f, "':::'"),
            Token::Semicolon => write!(f, "';'"),
            Token::LineComment(_) => write!(f, "comment"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
            Token::Punct(c) => write!(f, "'{c}'"),
        }
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.token,
            self.span.start(),
            self.span.end()
        )
    }
}
