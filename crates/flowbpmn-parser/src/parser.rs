//! Statement grammar for the flowchart notation.
//!
//! The token stream from the [`lexer`](super::lexer) is split into
//! statements at newlines and semicolons, trivia is dropped, and each
//! statement is matched against the supported forms in order:
//!
//! 1. direction header: `graph TD`, `flowchart LR ...`
//! 2. subgraph open: `subgraph id [Title]`
//! 3. subgraph close: `end`
//! 4. style directive: `style ...`, `classDef ...`, `class ...`, `linkStyle ...`
//! 5. edge chain: `A --> B[Task] -->|Yes| C -.-> D`
//! 6. node declaration: `id[label]`, `id{label}`, ...
//!
//! A statement matching none of them is returned as [`Statement::Unrecognized`];
//! the [`elaborate`](super::elaborate) phase turns that into an advisory.

use winnow::{
    Parser as _,
    combinator::{alt, eof, opt, preceded, repeat, terminated},
    error::ModalResult,
    stream::TokenSlice,
    token::{any, rest},
};

use flowbpmn_core::flowchart::{Direction, Shape};

use crate::{
    span::{Span, Spanned},
    tokens::{ArrowKind, PositionedToken, Token},
};

type Input<'t, 'src> = TokenSlice<'t, PositionedToken<'src>>;
type IResult<O> = ModalResult<O>;

/// Words that introduce styling directives, which are accepted and ignored.
const DIRECTIVES: [&str; 4] = ["style", "classDef", "class", "linkStyle"];

/// A reference to a node, optionally carrying an inline shape.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeRef<'src> {
    pub id: Spanned<&'src str>,
    pub shape: Option<(Shape, &'src str)>,
    pub span: Span,
}

/// The connector between two node references in a chain.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Link<'src> {
    pub arrow: ArrowKind,
    pub text: Option<&'src str>,
}

/// One recognized statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement<'src> {
    Direction(Direction),
    SubgraphOpen {
        id: Option<&'src str>,
        title: Option<&'src str>,
    },
    SubgraphClose,
    Directive,
    Chain {
        head: NodeRef<'src>,
        hops: Vec<(Link<'src>, NodeRef<'src>)>,
    },
    Node(NodeRef<'src>),
    Unrecognized,
}

/// Parse an identifier token with its span
fn identifier<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(name, token.span)),
        _ => None,
    })
    .parse_next(input)
}

/// Parse an identifier equal to `word`
fn keyword<'t, 'src: 't>(word: &'static str) -> impl FnMut(&mut Input<'t, 'src>) -> IResult<()> {
    move |input: &mut Input<'t, 'src>| {
        identifier
            .verify(|name: &Spanned<&str>| *name.inner() == word)
            .void()
            .parse_next(input)
    }
}

fn shape<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Spanned<(Shape, &'src str)>> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Shape(shape, text) => Some(Spanned::new((shape, text), token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn arrow<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<ArrowKind> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Arrow(kind) => Some(kind),
        _ => None,
    })
    .parse_next(input)
}

fn edge_text<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<&'src str> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::EdgeText(text) => Some(text),
        _ => None,
    })
    .parse_next(input)
}

/// Parse a `:::className` suffix
fn class_suffix<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<()> {
    preceded(
        any.verify(|token: &PositionedToken<'src>| token.token == Token::ClassMarker),
        identifier,
    )
    .void()
    .parse_next(input)
}

/// `graph TD` / `flowchart LR`; anything after the orientation is ignored
fn direction<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    let header = identifier.verify(|name: &Spanned<&str>| {
        name.inner().eq_ignore_ascii_case("graph") || name.inner().eq_ignore_ascii_case("flowchart")
    });
    let orientation =
        identifier.verify_map(|name: Spanned<&str>| Direction::from_keyword(name.inner()));

    preceded(header, terminated(orientation, rest))
        .map(Statement::Direction)
        .parse_next(input)
}

fn subgraph_open<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    preceded(
        keyword("subgraph"),
        terminated((opt(identifier), opt(shape)), rest),
    )
    .map(|(id, title)| Statement::SubgraphOpen {
        id: id.map(Spanned::into_inner),
        title: title.map(|title| title.into_inner().1),
    })
    .parse_next(input)
}

fn subgraph_close<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    terminated(keyword("end"), eof)
        .value(Statement::SubgraphClose)
        .parse_next(input)
}

fn directive<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    terminated(
        identifier.verify(|name: &Spanned<&str>| DIRECTIVES.contains(name.inner())),
        rest,
    )
    .value(Statement::Directive)
    .parse_next(input)
}

/// A node reference: `id`, `id[label]`, `id{label}:::cls`, ...
fn node_ref<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<NodeRef<'src>> {
    (identifier, opt(shape), opt(class_suffix))
        .map(|(id, shape, _)| {
            let span = shape
                .as_ref()
                .map_or(id.span(), |shape| id.span().union(shape.span()));
            NodeRef {
                id,
                shape: shape.map(Spanned::into_inner),
                span,
            }
        })
        .parse_next(input)
}

fn link<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Link<'src>> {
    (arrow, opt(edge_text))
        .map(|(arrow, text)| Link { arrow, text })
        .parse_next(input)
}

/// `A --> B`, `A -->|Yes| B`, `A -.-> B`, `A --> B --> C`
fn chain<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    (node_ref, repeat(1.., (link, node_ref)))
        .map(|(head, hops)| Statement::Chain { head, hops })
        .parse_next(input)
}

/// A standalone declaration must carry a shape.
fn node_declaration<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    node_ref
        .verify(|node: &NodeRef<'_>| node.shape.is_some())
        .map(Statement::Node)
        .parse_next(input)
}

fn statement<'t, 'src>(input: &mut Input<'t, 'src>) -> IResult<Statement<'src>> {
    alt((
        direction,
        subgraph_open,
        subgraph_close,
        directive,
        terminated(chain, eof),
        terminated(node_declaration, eof),
    ))
    .parse_next(input)
}

/// Split a token stream into statements and parse each one.
///
/// Returns one spanned [`Statement`] per non-empty statement, in source order.
/// Statements that match no form come back as [`Statement::Unrecognized`].
pub(crate) fn parse_statements<'src>(
    tokens: &[PositionedToken<'src>],
) -> Vec<Spanned<Statement<'src>>> {
    let significant: Vec<PositionedToken<'src>> = tokens
        .iter()
        .filter(|token| !token.is_trivia())
        .cloned()
        .collect();

    significant
        .split(|token| token.is_separator())
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| {
            let span = tokens[0].span.union(tokens[tokens.len() - 1].span);
            let mut input = TokenSlice::new(tokens);
            let parsed = statement
                .parse_next(&mut input)
                .unwrap_or(Statement::Unrecognized);
            Spanned::new(parsed, span)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> Vec<Statement<'_>> {
        let tokens = tokenize(source);
        parse_statements(&tokens)
            .into_iter()
            .map(Spanned::into_inner)
            .collect()
    }

    fn single(source: &str) -> Statement<'_> {
        let mut statements = parse(source);
        assert_eq!(statements.len(), 1, "expected one statement in {source:?}");
        statements.remove(0)
    }

    #[test]
    fn test_direction_header() {
        assert_eq!(single("graph TD"), Statement::Direction(Direction::TopDown));
        assert_eq!(
            single("flowchart lr"),
            Statement::Direction(Direction::LeftRight)
        );
        assert_eq!(
            single("Graph BT trailing words"),
            Statement::Direction(Direction::BottomTop)
        );
    }

    #[test]
    fn test_direction_requires_orientation() {
        assert_eq!(single("graph"), Statement::Unrecognized);
        assert_eq!(single("graph XY"), Statement::Unrecognized);
    }

    #[test]
    fn test_subgraph_forms() {
        assert_eq!(
            single("subgraph sales [Sales Team]"),
            Statement::SubgraphOpen {
                id: Some("sales"),
                title: Some("Sales Team"),
            }
        );
        assert_eq!(
            single("subgraph ops"),
            Statement::SubgraphOpen {
                id: Some("ops"),
                title: None,
            }
        );
        assert_eq!(
            single("subgraph"),
            Statement::SubgraphOpen {
                id: None,
                title: None,
            }
        );
        assert_eq!(single("end"), Statement::SubgraphClose);
    }

    #[test]
    fn test_end_with_trailing_tokens_is_not_close() {
        // `end --> X` is an edge from a node called `end`.
        assert!(matches!(single("end --> X"), Statement::Chain { .. }));
    }

    #[test]
    fn test_directives_are_recognized() {
        assert_eq!(single("style A fill:#f9f"), Statement::Directive);
        assert_eq!(single("classDef hot fill:red"), Statement::Directive);
        assert_eq!(single("class A hot"), Statement::Directive);
        assert_eq!(single("linkStyle 0 stroke:red"), Statement::Directive);
    }

    #[test]
    fn test_single_edge() {
        let Statement::Chain { head, hops } = single("A --> B") else {
            panic!("expected chain");
        };
        assert_eq!(*head.id.inner(), "A");
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].0.arrow, ArrowKind::Solid);
        assert_eq!(hops[0].0.text, None);
        assert_eq!(*hops[0].1.id.inner(), "B");
    }

    #[test]
    fn test_labeled_and_dotted_edges() {
        let Statement::Chain { hops, .. } = single("D -->|Yes| E[Approve]") else {
            panic!("expected chain");
        };
        assert_eq!(hops[0].0.text, Some("Yes"));
        assert_eq!(hops[0].1.shape, Some((Shape::Rectangle, "Approve")));

        let Statement::Chain { hops, .. } = single("A -.->|maybe| B") else {
            panic!("expected chain");
        };
        assert_eq!(hops[0].0.arrow, ArrowKind::Dotted);
        assert_eq!(hops[0].0.text, Some("maybe"));
    }

    #[test]
    fn test_chain_with_inline_shapes() {
        let Statement::Chain { head, hops } = single("A[Start]-->B[Task]-->C[End]") else {
            panic!("expected chain");
        };
        assert_eq!(head.shape, Some((Shape::Rectangle, "Start")));
        let targets: Vec<&str> = hops.iter().map(|(_, node)| *node.id.inner()).collect();
        assert_eq!(targets, ["B", "C"]);
    }

    #[test]
    fn test_class_suffix_is_accepted() {
        assert!(matches!(single("A[Task]:::hot"), Statement::Node(_)));
        assert!(matches!(
            single("A:::hot --> B"),
            Statement::Chain { .. }
        ));
    }

    #[test]
    fn test_node_declaration() {
        let Statement::Node(node) = single("D{Approve?}") else {
            panic!("expected node");
        };
        assert_eq!(*node.id.inner(), "D");
        assert_eq!(node.shape, Some((Shape::Rhombus, "Approve?")));
        assert_eq!(node.span, Span::new(0..11));
    }

    #[test]
    fn test_bare_identifier_is_unrecognized() {
        assert_eq!(single("A"), Statement::Unrecognized);
        assert_eq!(single("A -- text --> B"), Statement::Unrecognized);
        assert_eq!(single("A -->"), Statement::Unrecognized);
    }

    #[test]
    fn test_statement_separators() {
        let statements = parse("A --> B; B --> C\n\n%% comment only\nC[Done];");
        assert_eq!(statements.len(), 3);
        assert!(statements.iter().all(|s| *s != Statement::Unrecognized));
    }

    #[test]
    fn test_statement_spans() {
        let source = "graph TD\n  A --> B  \n";
        let tokens = tokenize(source);
        let statements = parse_statements(&tokens);

        assert_eq!(statements[1].span().slice(source), Some("A --> B"));
    }
}
