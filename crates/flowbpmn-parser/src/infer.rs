//! Node type inference.
//!
//! Runs once after the flowchart is assembled. Only ambiguous nodes
//! (`process` and `terminator`) are considered, and for each one the rules
//! below are evaluated top to bottom; the first that fires decides:
//!
//! 1. the label contains the whole word `start` or `begin` → `start`
//! 2. the label contains the whole word `end`, `stop`, `finish` or
//!    `complete`, or the id is `end` followed by optional digits → `end`
//! 3. `terminator` only, by connectivity: no incoming and some outgoing →
//!    `start`; some incoming and no outgoing → `end`; otherwise → `process`
//!
//! A `process` node that no keyword matched keeps its type. Connectivity
//! alone never promotes a `process` node.

use log::trace;

use flowbpmn_core::{
    flowchart::{Flowchart, Node, NodeType},
    identifier::Id,
};

const START_WORDS: [&str; 2] = ["start", "begin"];
const END_WORDS: [&str; 4] = ["end", "stop", "finish", "complete"];

/// Connectivity of a node, captured before any node is reclassified.
#[derive(Debug, Clone, Copy)]
struct Degree {
    incoming: usize,
    outgoing: usize,
}

type Rule = fn(&Node, Degree) -> Option<NodeType>;

/// Inference rules in evaluation order.
const RULES: [Rule; 3] = [start_keyword, end_keyword, terminator_connectivity];

/// Splits a label into lowercase words on anything but ASCII letters, digits and `_`.
fn words(label: &str) -> impl Iterator<Item = String> + '_ {
    label
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
}

fn has_word(label: &str, candidates: &[&str]) -> bool {
    words(label).any(|word| candidates.contains(&word.as_str()))
}

/// `end`, `END`, `end2`, ...
fn is_end_id(id: Id) -> bool {
    id.matches(|text| {
        text.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("end"))
            && text[3..].chars().all(|c| c.is_ascii_digit())
    })
}

fn start_keyword(node: &Node, _: Degree) -> Option<NodeType> {
    has_word(node.label(), &START_WORDS).then_some(NodeType::Start)
}

fn end_keyword(node: &Node, _: Degree) -> Option<NodeType> {
    (has_word(node.label(), &END_WORDS) || is_end_id(node.id())).then_some(NodeType::End)
}

fn terminator_connectivity(node: &Node, degree: Degree) -> Option<NodeType> {
    if node.node_type() != NodeType::Terminator {
        return None;
    }
    Some(match (degree.incoming, degree.outgoing) {
        (0, 1..) => NodeType::Start,
        (1.., 0) => NodeType::End,
        _ => NodeType::Process,
    })
}

/// Reclassify ambiguous nodes in place.
pub(crate) fn infer_types(flowchart: &mut Flowchart) {
    let degrees: Vec<Degree> = flowchart
        .nodes()
        .map(|node| Degree {
            incoming: flowchart.incoming(node.id()).count(),
            outgoing: flowchart.outgoing(node.id()).count(),
        })
        .collect();

    for (node, degree) in flowchart.nodes_mut().zip(degrees) {
        if !node.node_type().is_ambiguous() {
            continue;
        }
        let Some(inferred) = RULES.iter().find_map(|rule| rule(node, degree)) else {
            continue;
        };
        if inferred != node.node_type() {
            trace!(
                node = node.id().to_string(),
                from = node.node_type().as_str(),
                to = inferred.as_str();
                "Reclassified node"
            );
            node.reclassify(inferred);
        }
    }
}
