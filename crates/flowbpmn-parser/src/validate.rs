//! Structural validation of an inferred flowchart.

use flowbpmn_core::flowchart::{Flowchart, NodeType};

use crate::{
    elaborate::SourceMap,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
};

/// Checks referential integrity and emits structural advisories.
pub(crate) fn validate(
    flowchart: &Flowchart,
    spans: &SourceMap,
    diagnostics: &mut DiagnosticCollector,
) {
    check_references(flowchart, spans, diagnostics);
    check_terminals(flowchart, diagnostics);
    check_connectivity(flowchart, spans, diagnostics);
}

fn check_references(
    flowchart: &Flowchart,
    spans: &SourceMap,
    diagnostics: &mut DiagnosticCollector,
) {
    for (index, edge) in flowchart.edges().iter().enumerate() {
        let span = spans.edges.get(index).copied().unwrap_or_default();

        for (role, id) in [("source", edge.source()), ("target", edge.target())] {
            if flowchart.contains_node(id) {
                continue;
            }
            diagnostics.emit(
                Diagnostic::new(
                    ErrorCode::E200,
                    format!("Edge references undefined {role} node: {id}"),
                )
                .with_label(span, format!("`{id}` is never declared"))
                .with_help(format!("declare it first, e.g. `{id}[{id}]`")),
            );
        }
    }
}

fn check_terminals(flowchart: &Flowchart, diagnostics: &mut DiagnosticCollector) {
    if flowchart.count_of(NodeType::Start) == 0 {
        diagnostics.emit(
            Diagnostic::new(
                ErrorCode::W200,
                "No explicit start node found. Consider adding a start event.",
            ),
        );
    }
    if flowchart.count_of(NodeType::End) == 0 {
        diagnostics.emit(
            Diagnostic::new(
                ErrorCode::W201,
                "No explicit end node found. Consider adding an end event.",
            ),
        );
    }
}

fn check_connectivity(
    flowchart: &Flowchart,
    spans: &SourceMap,
    diagnostics: &mut DiagnosticCollector,
) {
    for node in flowchart.nodes() {
        let id = node.id();
        let advisory = |code, message: String| {
            let diagnostic = Diagnostic::new(code, message);
            match spans.nodes.get(&id) {
                Some(&span) => diagnostic.with_label(span, "declared here"),
                None => diagnostic,
            }
        };

        if node.node_type() != NodeType::Start && flowchart.incoming(id).next().is_none() {
            diagnostics.emit(advisory(
                ErrorCode::W202,
                format!("Node \"{id}\" has no incoming connections"),
            ));
        }
        if node.node_type() != NodeType::End && flowchart.outgoing(id).next().is_none() {
            diagnostics.emit(advisory(
                ErrorCode::W203,
                format!("Node \"{id}\" has no outgoing connections"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use flowbpmn_core::{
        flowchart::{Edge, EdgeKind, Node, Shape},
        identifier::Id,
    };

    use super::*;
    use crate::span::Span;

    fn run(flowchart: &Flowchart) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        let spans = SourceMap {
            edges: vec![Span::new(0..1); flowchart.edge_count()],
            nodes: flowchart
                .nodes()
                .map(|node| (node.id(), Span::new(2..3)))
                .collect(),
        };
        let mut diagnostics = DiagnosticCollector::new();
        validate(flowchart, &spans, &mut diagnostics);
        diagnostics.finish()
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
        diagnostics.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn test_undefined_endpoint_is_fatal() {
        let mut flowchart = Flowchart::new();
        let a = Id::new("A");
        flowchart.insert_node(Node::with_shape(a, Shape::Rectangle, "A"));
        flowchart.push_edge(Edge::new(a, Id::new("Z"), EdgeKind::Directed, None));

        let (errors, _) = run(&flowchart);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), ErrorCode::E200);
        assert_eq!(errors[0].message(), "Edge references undefined target node: Z");
    }

    #[test]
    fn test_missing_terminals_and_dangling_nodes() {
        let mut flowchart = Flowchart::new();
        let (a, b) = (Id::new("A"), Id::new("B"));
        flowchart.insert_node(Node::with_shape(a, Shape::Rectangle, "One"));
        flowchart.insert_node(Node::with_shape(b, Shape::Rectangle, "Two"));
        flowchart.push_edge(Edge::new(a, b, EdgeKind::Directed, None));

        let (errors, warnings) = run(&flowchart);
        assert!(errors.is_empty());
        assert_eq!(
            codes(&warnings),
            vec![
                ErrorCode::W200,
                ErrorCode::W201,
                ErrorCode::W202,
                ErrorCode::W203
            ]
        );
        assert_eq!(warnings[2].message(), "Node \"A\" has no incoming connections");
        assert_eq!(warnings[3].message(), "Node \"B\" has no outgoing connections");
        assert_eq!(warnings[2].labels()[0].span(), Span::new(2..3));
        assert!(warnings[0].labels().is_empty());
    }

    #[test]
    fn test_well_formed_chart_is_quiet() {
        let mut flowchart = Flowchart::new();
        let (s, e) = (Id::new("s"), Id::new("e"));
        let mut start = Node::with_shape(s, Shape::Circle, "Start");
        start.reclassify(NodeType::Start);
        let mut end = Node::with_shape(e, Shape::Circle, "End");
        end.reclassify(NodeType::End);
        flowchart.insert_node(start);
        flowchart.insert_node(end);
        flowchart.push_edge(Edge::new(s, e, EdgeKind::Directed, None));

        let (errors, warnings) = run(&flowchart);
        assert!(errors.is_empty());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }
}
