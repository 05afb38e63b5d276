//! Builds a [`Flowchart`] from parsed statements.
//!
//! The [`Builder`] walks statements in source order, keeping a stack of open
//! subgraph scopes. It declares nodes, expands edge chains into pairwise
//! edges, assigns pool membership and reports syntax advisories.

use std::collections::HashMap;

use log::{debug, trace};
use serde::Deserialize;

use flowbpmn_core::{
    flowchart::{Edge, EdgeKind, Flowchart, Node, Subgraph},
    identifier::Id,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    parser::{Link, NodeRef, Statement},
    span::{Span, Spanned},
    tokens::ArrowKind,
};

/// Configuration for building the flowchart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Report bare references to never-declared nodes as errors instead of
    /// synthesizing `process` nodes for them.
    strict_references: bool,
}

impl ParserConfig {
    /// Create a new ParserConfig
    pub fn new(strict_references: bool) -> Self {
        Self { strict_references }
    }

    pub fn strict_references(&self) -> bool {
        self.strict_references
    }
}

/// Cleans label text: trims it and strips one pair of surrounding double quotes.
///
/// Returns `None` when nothing is left.
pub(crate) fn clean_label(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

/// 1-based line number of a byte offset.
pub(crate) fn line_number(source: &str, offset: usize) -> usize {
    source
        .get(..offset)
        .map_or(0, |prefix| prefix.matches('\n').count())
        + 1
}

/// Source spans recorded while building, for labelling later diagnostics.
#[derive(Debug, Default)]
pub(crate) struct SourceMap {
    /// Span of the statement that created each edge, parallel to the edge list.
    pub edges: Vec<Span>,
    /// Span of the first occurrence of each node.
    pub nodes: HashMap<Id, Span>,
}

pub(crate) struct Builder<'a> {
    source: &'a str,
    config: &'a ParserConfig,
    flowchart: Flowchart,
    /// Indices into the flowchart's subgraphs, innermost last.
    scopes: Vec<usize>,
    spans: SourceMap,
}

impl<'a> Builder<'a> {
    pub fn new(source: &'a str, config: &'a ParserConfig) -> Self {
        Self {
            source,
            config,
            flowchart: Flowchart::new(),
            scopes: Vec::new(),
            spans: SourceMap::default(),
        }
    }

    /// Apply every statement and return the flowchart with its source spans.
    pub fn build(
        mut self,
        statements: Vec<Spanned<Statement<'_>>>,
        diagnostics: &mut DiagnosticCollector,
    ) -> (Flowchart, SourceMap) {
        for statement in statements {
            let span = statement.span();
            self.apply(statement.into_inner(), span, diagnostics);
        }

        if !self.scopes.is_empty() {
            debug!(open_scopes = self.scopes.len(); "Subgraph scopes left open at end of input");
        }

        (self.flowchart, self.spans)
    }

    fn apply(
        &mut self,
        statement: Statement<'_>,
        span: Span,
        diagnostics: &mut DiagnosticCollector,
    ) {
        match statement {
            Statement::Direction(direction) => {
                trace!(direction = direction.as_str(); "Direction declared");
                self.flowchart.set_direction(direction);
            }
            Statement::SubgraphOpen { id: Some(id), title } => {
                let title = title.and_then(clean_label).unwrap_or_else(|| id.to_string());
                let index = self
                    .flowchart
                    .push_subgraph(Subgraph::new(Id::new(id), title));
                self.scopes.push(index);
            }
            Statement::SubgraphOpen { id: None, .. } => {
                diagnostics.emit(
                    Diagnostic::new(
                        ErrorCode::W102,
                        format!("Subgraph without an id at line {}", self.line(span)),
                    )
                    .with_label(span, "expected `subgraph <id> [<title>]`"),
                );
            }
            Statement::SubgraphClose => {
                self.scopes.pop();
            }
            Statement::Directive => {}
            Statement::Chain { head, hops } => self.apply_chain(head, hops, span),
            Statement::Node(node) => self.apply_declaration(node, span, diagnostics),
            Statement::Unrecognized => {
                let text = span.slice(self.source).unwrap_or_default();
                diagnostics.emit(
                    Diagnostic::new(
                        ErrorCode::W100,
                        format!("Unrecognized syntax at line {}: {text}", self.line(span)),
                    )
                    .with_label(span, "not a supported statement"),
                );
            }
        }
    }

    fn apply_declaration(
        &mut self,
        node_ref: NodeRef<'_>,
        span: Span,
        diagnostics: &mut DiagnosticCollector,
    ) {
        let id = Id::new(node_ref.id.inner());

        if let Some(first) = self.spans.nodes.get(&id) {
            diagnostics.emit(
                Diagnostic::new(
                    ErrorCode::W101,
                    format!("Duplicate node definition: {id} at line {}", self.line(span)),
                )
                .with_label(node_ref.span, "duplicate declaration")
                .with_secondary_label(*first, "first seen here"),
            );
            return;
        }

        self.insert(&node_ref);
        self.assign_to_scope(id);
    }

    fn apply_chain(&mut self, head: NodeRef<'_>, hops: Vec<(Link<'_>, NodeRef<'_>)>, span: Span) {
        let mut source = self.reference(&head);

        for (link, target_ref) in hops {
            let target = self.reference(&target_ref);
            let label = link.text.and_then(clean_label);
            let kind = match (link.arrow, &label) {
                (ArrowKind::Dotted, _) => EdgeKind::Dotted,
                (ArrowKind::Solid | ArrowKind::Thick, Some(_)) => EdgeKind::Labeled,
                (ArrowKind::Solid | ArrowKind::Thick, None) => EdgeKind::Directed,
            };

            self.flowchart
                .push_edge(Edge::new(source, target, kind, label));
            self.spans.edges.push(span);
            source = target;
        }
    }

    /// Resolve an edge endpoint.
    ///
    /// The first occurrence of an id creates its node: from the inline shape
    /// when there is one, otherwise as an implicit `process` node (skipped in
    /// strict mode). Shapes on later occurrences are ignored.
    fn reference(&mut self, node_ref: &NodeRef<'_>) -> Id {
        let id = Id::new(node_ref.id.inner());

        if !self.spans.nodes.contains_key(&id)
            && (node_ref.shape.is_some() || !self.config.strict_references())
        {
            self.insert(node_ref);
        }

        if self.flowchart.contains_node(id) {
            self.assign_to_scope(id);
        }
        id
    }

    /// Create the node for its first occurrence.
    fn insert(&mut self, node_ref: &NodeRef<'_>) {
        let id = Id::new(node_ref.id.inner());
        let node = match node_ref.shape {
            Some((shape, text)) => {
                let label = clean_label(text).unwrap_or_else(|| id.to_string());
                Node::with_shape(id, shape, label)
            }
            None => Node::implicit(id),
        };

        self.flowchart.insert_node(node);
        self.spans.nodes.insert(id, node_ref.span);
    }

    /// Make `id` a member of the innermost open subgraph unless it already belongs to a pool.
    fn assign_to_scope(&mut self, id: Id) {
        let Some(&scope) = self.scopes.last() else {
            return;
        };
        if self.flowchart.is_pooled(id) {
            return;
        }
        if let Some(subgraph) = self.flowchart.subgraph_mut(scope) {
            subgraph.add_member(id);
        }
    }

    fn line(&self, span: Span) -> usize {
        line_number(self.source, span.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("  Task  "), Some("Task".to_string()));
        assert_eq!(clean_label("\"Quoted label\""), Some("Quoted label".to_string()));
        assert_eq!(clean_label("\" \""), None);
        assert_eq!(clean_label("   "), None);
        assert_eq!(clean_label("\"half"), Some("\"half".to_string()));
    }

    #[test]
    fn test_line_number() {
        let source = "graph TD\nA --> B\nB --> C";
        assert_eq!(line_number(source, 0), 1);
        assert_eq!(line_number(source, 9), 2);
        assert_eq!(line_number(source, source.len()), 3);
    }
}
