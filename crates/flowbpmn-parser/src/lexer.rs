//! Lexical analyzer for flowchart source text.
//!
//! The lexer converts source text into a stream of [`Token`]s. It is total:
//! any character that starts no known token becomes a [`Token::Punct`], so
//! tokenizing never fails and every byte of input is covered by exactly one
//! token span. Deciding whether a line makes sense is left to the
//! [`parser`](super::parser).

use winnow::{
    Parser as _,
    combinator::{alt, delimited, preceded},
    error::ModalResult,
    stream::{LocatingSlice, Location, Stream},
    token::{any, literal, take_till, take_while},
};

use flowbpmn_core::flowchart::Shape;

use crate::{
    span::Span,
    tokens::{ArrowKind, PositionedToken, Token},
};

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O>;

/// Parse a line comment starting with `%%`
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("%%", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse a node shape (order matters - doubled delimiters first)
fn shape<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        delimited("[[", take_till(1.., [']', '\n']), "]]")
            .map(|text| Token::Shape(Shape::DoubleBracket, text)),
        delimited("[/", take_till(1.., ['/', ']', '\n']), "/]")
            .map(|text| Token::Shape(Shape::Slanted, text)),
        delimited('[', take_till(1.., [']', '\n']), ']')
            .map(|text| Token::Shape(Shape::Rectangle, text)),
        delimited("((", take_till(1.., [')', '\n']), "))")
            .map(|text| Token::Shape(Shape::Circle, text)),
        delimited('(', take_till(1.., [')', '\n']), ')')
            .map(|text| Token::Shape(Shape::Rounded, text)),
        delimited('{', take_till(1.., ['}', '\n']), '}')
            .map(|text| Token::Shape(Shape::Rhombus, text)),
    ))
    .parse_next(input)
}

/// Parse arrows: `-->`, `--->`, `---`, `-.->`, `-..->`, `==>`
fn arrow<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        ("--", take_while(0.., '-'), '>').value(Token::Arrow(ArrowKind::Solid)),
        ("---", take_while(0.., '-')).value(Token::Arrow(ArrowKind::Solid)),
        ('-', take_while(1.., '.'), "->").value(Token::Arrow(ArrowKind::Dotted)),
        ("==", take_while(0.., '='), '>').value(Token::Arrow(ArrowKind::Thick)),
    ))
    .parse_next(input)
}

/// Parse pipe-delimited edge text
fn edge_text<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    delimited('|', take_till(1.., ['|', '\n']), '|')
        .map(Token::EdgeText)
        .parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_')
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse the punctuation the grammar cares about
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal(":::").value(Token::ClassMarker),
        ';'.value(Token::Semicolon),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, carriage returns but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Fallback: any other single character
fn other<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    any.map(Token::Punct).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment, // Must come before the fallback '%'
        shape,        // Must come before the fallback brackets
        arrow,        // Must come before the fallback '-'
        edge_text,    // Must come before the fallback '|'
        identifier,
        punctuation,
        newline, // Must come before whitespace
        whitespace,
        other,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Tokenize flowchart source text.
///
/// Every character of `input` ends up in exactly one token; unknown
/// characters become [`Token::Punct`].
pub fn tokenize(input: &str) -> Vec<PositionedToken<'_>> {
    let mut located_input = LocatingSlice::new(input);
    let mut tokens = Vec::new();

    while !located_input.is_empty() {
        match positioned_token(&mut located_input) {
            Ok(token) => tokens.push(token),
            Err(_) => {
                // `other` accepts any character, so this only guards progress.
                located_input.next_token();
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {}", input);
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected);
        assert_eq!(positioned.span, Span::new(0..input.len()));
    }

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    #[test]
    fn test_identifiers() {
        test_single_token("A", Token::Identifier("A"));
        test_single_token("node_1", Token::Identifier("node_1"));
        test_single_token("42", Token::Identifier("42"));
    }

    #[test]
    fn test_shapes() {
        test_single_token("[Task]", Token::Shape(Shape::Rectangle, "Task"));
        test_single_token("[[Data]]", Token::Shape(Shape::DoubleBracket, "Data"));
        test_single_token("[/Sub/]", Token::Shape(Shape::Slanted, "Sub"));
        test_single_token("{Approve?}", Token::Shape(Shape::Rhombus, "Approve?"));
        test_single_token("((Start))", Token::Shape(Shape::Circle, "Start"));
        test_single_token("(Rounded)", Token::Shape(Shape::Rounded, "Rounded"));
    }

    #[test]
    fn test_shape_text_keeps_inner_punctuation() {
        test_single_token(
            "[Send <b>mail</b> & wait]",
            Token::Shape(Shape::Rectangle, "Send <b>mail</b> & wait"),
        );
    }

    #[test]
    fn test_arrows() {
        test_single_token("-->", Token::Arrow(ArrowKind::Solid));
        test_single_token("--->", Token::Arrow(ArrowKind::Solid));
        test_single_token("---", Token::Arrow(ArrowKind::Solid));
        test_single_token("-.->", Token::Arrow(ArrowKind::Dotted));
        test_single_token("-..->", Token::Arrow(ArrowKind::Dotted));
        test_single_token("==>", Token::Arrow(ArrowKind::Thick));
        test_single_token("===>", Token::Arrow(ArrowKind::Thick));
    }

    #[test]
    fn test_edge_text_and_comment() {
        test_single_token("|Yes|", Token::EdgeText("Yes"));
        test_single_token("%% note", Token::LineComment(" note"));
    }

    #[test]
    fn test_edge_line_without_spaces() {
        assert_eq!(
            kinds("A[Start]-->B"),
            vec![
                Token::Identifier("A"),
                Token::Shape(Shape::Rectangle, "Start"),
                Token::Arrow(ArrowKind::Solid),
                Token::Identifier("B"),
            ]
        );
    }

    #[test]
    fn test_labeled_edge_tokens() {
        assert_eq!(
            kinds("D -->|No| F[Reject];"),
            vec![
                Token::Identifier("D"),
                Token::Arrow(ArrowKind::Solid),
                Token::EdgeText("No"),
                Token::Identifier("F"),
                Token::Shape(Shape::Rectangle, "Reject"),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unknown_characters_become_punct() {
        assert_eq!(
            kinds("A -- text"),
            vec![
                Token::Identifier("A"),
                Token::Punct('-'),
                Token::Punct('-'),
                Token::Identifier("text"),
            ]
        );
    }

    #[test]
    fn test_unterminated_shape_falls_back() {
        assert_eq!(
            kinds("A[open"),
            vec![
                Token::Identifier("A"),
                Token::Punct('['),
                Token::Identifier("open"),
            ]
        );
    }

    #[test]
    fn test_spans_cover_input() {
        let input = "graph TD\n  A --> B %% trailing\r\n";
        let tokens = tokenize(input);

        let mut expected_start = 0;
        for token in &tokens {
            assert_eq!(token.span.start(), expected_start, "gap before {token}");
            expected_start = token.span.end();
        }
        assert_eq!(expected_start, input.len());
    }

    #[test]
    fn test_multibyte_text() {
        let tokens = tokenize("A[Prüfung] --> B");
        assert_eq!(tokens[1].token, Token::Shape(Shape::Rectangle, "Prüfung"));
        assert_eq!(tokens[1].span, Span::new(1..11));
    }
}
