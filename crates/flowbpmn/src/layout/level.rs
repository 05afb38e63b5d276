//! Level layout engine
//!
//! Places nodes in horizontal rows by graph depth:
//!
//! 1. Roots are nodes without incoming edges plus every `start` node. When
//!    there are none, the first declared node is used.
//! 2. A depth-first walk from the roots assigns levels. A node entered from
//!    a parent sits one level below the deepest predecessor leveled so far.
//!    Nodes the walk never reaches are leveled from their already-leveled
//!    predecessors (or at level 0) and walked from in turn.
//! 3. Each level is centered on the canvas in declaration order.
//! 4. Targets of a gateway with several outgoing edges are shifted
//!    vertically around the level baseline by their branch index.
//! 5. When pools exist, each pool's members are moved into their own band,
//!    pools stacked top to bottom.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use flowbpmn_core::{
    flowchart::{Flowchart, NodeType},
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
};

use crate::{
    config::LayoutConfig,
    layout::{LayoutEngine, LayoutNode, LayoutResult},
};

/// Box size of a node in the layout.
pub(crate) fn node_size(node_type: NodeType) -> Size {
    match node_type {
        NodeType::Start | NodeType::End | NodeType::Terminator => Size::new(36.0, 36.0),
        NodeType::Process => Size::new(100.0, 80.0),
        NodeType::Decision => Size::new(50.0, 50.0),
        NodeType::Subprocess => Size::new(150.0, 100.0),
        NodeType::Data => Size::new(36.0, 50.0),
    }
}

/// Spacing resolved for one flowchart.
#[derive(Debug, Clone, Copy)]
struct Spacing {
    horizontal: f32,
    vertical: f32,
    branch_offset: f32,
}

/// Layout engine that levels nodes by depth. See the module documentation.
#[derive(Debug, Clone, Default)]
pub struct LevelLayout {
    config: LayoutConfig,
}

impl LevelLayout {
    /// Create a new level layout engine
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Spacing grows with the longest label and with graph density.
    fn spacing(&self, flowchart: &Flowchart) -> Spacing {
        let longest_label = flowchart
            .nodes()
            .map(|node| node.label().chars().count())
            .max()
            .unwrap_or_default()
            .max(10);

        let horizontal = self
            .config
            .horizontal_spacing()
            .max(longest_label as f32 * self.config.label_char_width());
        let vertical = if flowchart.node_count() > self.config.dense_node_threshold() {
            self.config.dense_vertical_spacing()
        } else {
            self.config.vertical_spacing()
        };
        let branch_offset =
            if flowchart.count_of(NodeType::Decision) > self.config.gateway_threshold() {
                self.config.wide_branch_offset()
            } else {
                self.config.branch_offset()
            };

        Spacing {
            horizontal,
            vertical,
            branch_offset,
        }
    }

    /// Build a directed graph whose node indices follow declaration order.
    fn build_graph(flowchart: &Flowchart) -> DiGraph<Id, ()> {
        let mut graph = DiGraph::with_capacity(flowchart.node_count(), flowchart.edge_count());
        let mut indices = HashMap::new();

        for node in flowchart.nodes() {
            indices.insert(node.id(), graph.add_node(node.id()));
        }

        for edge in flowchart.edges() {
            if let (Some(&source), Some(&target)) =
                (indices.get(&edge.source()), indices.get(&edge.target()))
            {
                graph.add_edge(source, target, ());
            }
        }

        graph
    }

    /// Assign a level to every node, indexed like the graph's nodes.
    fn assign_levels(graph: &DiGraph<Id, ()>, flowchart: &Flowchart) -> Vec<usize> {
        let mut levels: Vec<Option<usize>> = vec![None; graph.node_count()];

        let mut roots: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&idx| {
                graph.neighbors_directed(idx, Direction::Incoming).next().is_none()
                    || flowchart
                        .node(graph[idx])
                        .is_some_and(|node| node.node_type() == NodeType::Start)
            })
            .collect();
        if roots.is_empty() {
            roots.extend(graph.node_indices().take(1));
        }
        trace!(roots = roots.len(); "Level layout roots");

        for root in roots {
            Self::walk(graph, root, 0, &mut levels);
        }

        for idx in graph.node_indices() {
            if levels[idx.index()].is_none() {
                let level = Self::level_below_predecessors(graph, idx, &levels).unwrap_or(0);
                Self::walk(graph, idx, level, &mut levels);
            }
        }

        levels.into_iter().map(Option::unwrap_or_default).collect()
    }

    /// One below the deepest already-leveled predecessor.
    fn level_below_predecessors(
        graph: &DiGraph<Id, ()>,
        idx: NodeIndex,
        levels: &[Option<usize>],
    ) -> Option<usize> {
        graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter_map(|pred| levels[pred.index()])
            .max()
            .map(|level| level + 1)
    }

    /// Depth-first walk leveling every unvisited node reachable from `start`.
    fn walk(
        graph: &DiGraph<Id, ()>,
        start: NodeIndex,
        level: usize,
        levels: &mut [Option<usize>],
    ) {
        let mut stack = vec![(start, level, true)];

        while let Some((idx, level, is_start)) = stack.pop() {
            if levels[idx.index()].is_some() {
                continue;
            }
            let level = if is_start {
                level
            } else {
                Self::level_below_predecessors(graph, idx, levels).map_or(level, |l| l.max(level))
            };
            levels[idx.index()] = Some(level);

            // petgraph lists neighbors newest edge first; push them so the
            // first declared edge is popped first.
            for child in graph.neighbors(idx) {
                if levels[child.index()].is_none() {
                    stack.push((child, level + 1, false));
                }
            }
        }
    }

    /// Targets of every gateway with more than one outgoing edge, in edge order.
    fn gateway_branches(flowchart: &Flowchart) -> Vec<Vec<Id>> {
        flowchart
            .nodes()
            .filter(|node| node.node_type() == NodeType::Decision)
            .map(|node| {
                flowchart
                    .outgoing(node.id())
                    .map(|edge| edge.target())
                    .collect::<Vec<_>>()
            })
            .filter(|targets| targets.len() > 1)
            .collect()
    }

    /// Vertical shift of a node that is a gateway branch target.
    fn branch_shift(branches: &[Vec<Id>], id: Id, offset: f32) -> f32 {
        branches
            .iter()
            .find_map(|targets| {
                let index = targets.iter().position(|&target| target == id)?;
                let total = targets.len() as f32;
                Some((index as f32 - total / 2.0 + 0.5) * offset)
            })
            .unwrap_or_default()
    }

    fn place_levels(&self, flowchart: &Flowchart, levels: &[usize]) -> IndexMap<Id, LayoutNode> {
        let spacing = self.spacing(flowchart);
        let branches = Self::gateway_branches(flowchart);
        debug!(
            horizontal = spacing.horizontal,
            vertical = spacing.vertical,
            branch_offset = spacing.branch_offset,
            gateways_with_branches = branches.len();
            "Resolved layout spacing"
        );

        let mut rows: BTreeMap<usize, Vec<(Id, Size)>> = BTreeMap::new();
        for (node, &level) in flowchart.nodes().zip(levels) {
            rows.entry(level)
                .or_default()
                .push((node.id(), node_size(node.node_type())));
        }

        let mut placed = HashMap::with_capacity(flowchart.node_count());
        for (level, row) in &rows {
            let base_y = self.config.origin() + *level as f32 * spacing.vertical;
            let total_width: f32 = row.iter().map(|(_, size)| size.width()).sum::<f32>()
                + row.len().saturating_sub(1) as f32 * spacing.horizontal;
            let mut current_x = (self.config.canvas_width() - total_width) / 2.0;

            for &(id, size) in row {
                let y = base_y + Self::branch_shift(&branches, id, spacing.branch_offset);
                let center = Point::new(current_x + size.width() / 2.0, y);
                placed.insert(id, LayoutNode::new(center, size));
                current_x += size.width() + spacing.horizontal;
            }
        }

        flowchart
            .nodes()
            .filter_map(|node| Some((node.id(), placed.remove(&node.id())?)))
            .collect()
    }

    /// Move each pool's members into a band of its own.
    fn stack_pools(&self, flowchart: &Flowchart, nodes: &mut IndexMap<Id, LayoutNode>) {
        let padding = Insets::new(
            self.config.pool_padding_top(),
            self.config.pool_padding_x(),
            self.config.pool_padding_bottom(),
            self.config.pool_padding_x(),
        );

        let pools: Vec<(Bounds, &[Id])> = flowchart
            .subgraphs()
            .iter()
            .filter_map(|subgraph| {
                let members = subgraph.members();
                let bounds = members
                    .iter()
                    .filter_map(|id| nodes.get(id))
                    .map(LayoutNode::bounds)
                    .reduce(|acc, bounds| acc.merge(&bounds))?;
                Some((bounds.add_padding(padding), members))
            })
            .collect();

        let mut current_y = self.config.origin();
        for (bounds, members) in pools {
            for id in members {
                if let Some(node) = nodes.get_mut(id) {
                    let y = current_y + (node.center().y() - bounds.min_y());
                    node.set_center_y(y);
                }
            }
            current_y += bounds.height() + self.config.pool_margin();
        }
    }
}

impl LayoutEngine for LevelLayout {
    fn layout(&self, flowchart: &Flowchart) -> LayoutResult {
        let graph = Self::build_graph(flowchart);
        let levels = Self::assign_levels(&graph, flowchart);
        let mut nodes = self.place_levels(flowchart, &levels);

        if !flowchart.subgraphs().is_empty() {
            self.stack_pools(flowchart, &mut nodes);
        }

        let result = LayoutResult::new(nodes);
        debug!(
            nodes = result.len(),
            levels = levels.iter().max().map_or(0, |max| max + 1);
            "Layout calculated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use flowbpmn_core::flowchart::{Edge, EdgeKind, Node, Shape, Subgraph};

    use super::*;

    fn chart(nodes: &[(&str, Shape)], edges: &[(&str, &str)]) -> Flowchart {
        let mut flowchart = Flowchart::new();
        for (id, shape) in nodes {
            flowchart.insert_node(Node::with_shape(Id::new(id), *shape, *id));
        }
        for (source, target) in edges {
            flowchart.push_edge(Edge::new(
                Id::new(source),
                Id::new(target),
                EdgeKind::Directed,
                None,
            ));
        }
        flowchart
    }

    fn center(result: &LayoutResult, id: &str) -> Point {
        result.node(Id::new(id)).expect("node is placed").center()
    }

    #[test]
    fn test_linear_chain_levels() {
        let flowchart = chart(
            &[("a", Shape::Rectangle), ("b", Shape::Rectangle), ("c", Shape::Rectangle)],
            &[("a", "b"), ("b", "c")],
        );
        let result = LevelLayout::default().layout(&flowchart);

        assert!(approx_eq!(f32, center(&result, "a").y(), 100.0));
        assert!(approx_eq!(f32, center(&result, "b").y(), 200.0));
        assert!(approx_eq!(f32, center(&result, "c").y(), 300.0));
        // A lone 100-wide task is centered on the 800-wide canvas.
        assert!(approx_eq!(f32, center(&result, "a").x(), 400.0));
    }

    #[test]
    fn test_level_is_below_deepest_predecessor() {
        // a -> b -> c, a -> c: c sits below b, not next to it.
        let flowchart = chart(
            &[("a", Shape::Rectangle), ("b", Shape::Rectangle), ("c", Shape::Rectangle)],
            &[("a", "b"), ("b", "c"), ("a", "c")],
        );
        let graph = LevelLayout::build_graph(&flowchart);
        let levels = LevelLayout::assign_levels(&graph, &flowchart);

        assert_eq!(levels, vec![0, 1, 2]);
    }

    #[test]
    fn test_first_declared_edge_is_walked_first() {
        // a -> c is declared before a -> b, so c is reached from a directly.
        let flowchart = chart(
            &[("a", Shape::Rectangle), ("b", Shape::Rectangle), ("c", Shape::Rectangle)],
            &[("a", "c"), ("a", "b"), ("b", "c")],
        );
        let graph = LevelLayout::build_graph(&flowchart);
        let levels = LevelLayout::assign_levels(&graph, &flowchart);

        assert_eq!(levels, vec![0, 1, 1]);
    }

    #[test]
    fn test_cycle_without_roots_uses_first_node() {
        let flowchart = chart(
            &[("a", Shape::Rectangle), ("b", Shape::Rectangle)],
            &[("a", "b"), ("b", "a")],
        );
        let graph = LevelLayout::build_graph(&flowchart);
        assert_eq!(LevelLayout::assign_levels(&graph, &flowchart), vec![0, 1]);
    }

    #[test]
    fn test_row_is_centered_with_spacing() {
        let flowchart = chart(
            &[("root", Shape::Rectangle), ("l", Shape::Rectangle), ("r", Shape::Rectangle)],
            &[("root", "l"), ("root", "r")],
        );
        let result = LevelLayout::default().layout(&flowchart);

        // Row width: 100 + 150 + 100 = 350, starting at (800 - 350) / 2 = 225.
        assert!(approx_eq!(f32, center(&result, "l").x(), 275.0));
        assert!(approx_eq!(f32, center(&result, "r").x(), 525.0));
    }

    #[test]
    fn test_gateway_branches_fan_out() {
        let flowchart = chart(
            &[
                ("d", Shape::Rhombus),
                ("yes", Shape::Rectangle),
                ("no", Shape::Rectangle),
            ],
            &[("d", "yes"), ("d", "no")],
        );
        let result = LevelLayout::default().layout(&flowchart);

        assert!(approx_eq!(f32, center(&result, "yes").y(), 160.0));
        assert!(approx_eq!(f32, center(&result, "no").y(), 240.0));
    }

    #[test]
    fn test_long_labels_widen_spacing() {
        let mut flowchart = Flowchart::new();
        let label = "x".repeat(30);
        for id in ["root", "l", "r"] {
            flowchart.insert_node(Node::with_shape(Id::new(id), Shape::Rectangle, label.as_str()));
        }
        for target in ["l", "r"] {
            flowchart.push_edge(Edge::new(
                Id::new("root"),
                Id::new(target),
                EdgeKind::Directed,
                None,
            ));
        }
        let result = LevelLayout::default().layout(&flowchart);

        let gap = center(&result, "r").x() - center(&result, "l").x();
        assert!(approx_eq!(f32, gap, 100.0 + 210.0));
    }

    #[test]
    fn test_pools_occupy_disjoint_bands() {
        let mut flowchart = chart(
            &[
                ("a", Shape::Rectangle),
                ("b", Shape::Rectangle),
                ("c", Shape::Rectangle),
                ("d", Shape::Rectangle),
            ],
            &[("a", "b"), ("b", "c"), ("a", "d")],
        );
        let first = flowchart.push_subgraph(Subgraph::new(Id::new("p1"), "One"));
        let second = flowchart.push_subgraph(Subgraph::new(Id::new("p2"), "Two"));
        for id in ["a", "b"] {
            flowchart.subgraph_mut(first).expect("pool").add_member(Id::new(id));
        }
        for id in ["c", "d"] {
            flowchart.subgraph_mut(second).expect("pool").add_member(Id::new(id));
        }

        let result = LevelLayout::default().layout(&flowchart);
        let band = |ids: &[&str]| {
            ids.iter()
                .map(|id| result.node(Id::new(id)).expect("placed").bounds())
                .reduce(|acc, b| acc.merge(&b))
                .expect("members")
        };

        let one = band(&["a", "b"]);
        let two = band(&["c", "d"]);
        assert!(!one.overlaps_vertically(two));
        // First pool's padded box starts at the origin.
        assert!(approx_eq!(f32, one.min_y(), 140.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let flowchart = chart(
            &[
                ("s", Shape::Circle),
                ("d", Shape::Rhombus),
                ("x", Shape::Rectangle),
                ("y", Shape::Rectangle),
                ("e", Shape::Circle),
            ],
            &[("s", "d"), ("d", "x"), ("d", "y"), ("x", "e"), ("y", "e"), ("e", "s")],
        );
        let engine = LevelLayout::default();
        assert_eq!(engine.layout(&flowchart), engine.layout(&flowchart));
    }

    #[test]
    fn test_result_keeps_declaration_order() {
        let flowchart = chart(
            &[("late", Shape::Rectangle), ("early", Shape::Rectangle)],
            &[("early", "late")],
        );
        let result = LevelLayout::default().layout(&flowchart);
        let order: Vec<Id> = result.nodes().map(|(id, _)| id).collect();
        assert_eq!(order, vec![Id::new("late"), Id::new("early")]);
    }
}
