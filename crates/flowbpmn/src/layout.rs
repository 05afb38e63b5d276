//! Layout engine for positioning flowchart nodes.
//!
//! This module turns a [`Flowchart`] into node geometry ready for BPMN
//! diagram interchange output.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parse
//! Flowchart
//!     ↓ layout (this module)
//! LayoutResult
//!     ↓ export
//! BPMN XML
//! ```
//!
//! Layout works with element centers. Exporters convert to top-left
//! corners through [`LayoutNode::bounds`].
//!
//! # Engines
//!
//! - [`LevelLayout`] - Levels nodes by graph depth, fans out gateway
//!   branches and stacks pools into horizontal bands

mod level;

pub use level::LevelLayout;

use indexmap::IndexMap;

use flowbpmn_core::{
    flowchart::Flowchart,
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

/// Trait implemented by layout engines.
///
/// A layout is a pure function of the flowchart: calling it twice on the
/// same input must give the same result.
pub trait LayoutEngine {
    /// Calculate positions and sizes for every node of `flowchart`.
    fn layout(&self, flowchart: &Flowchart) -> LayoutResult;
}

/// Geometry of a single positioned node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutNode {
    center: Point,
    size: Size,
}

impl LayoutNode {
    pub fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Box occupied by the node.
    pub fn bounds(&self) -> Bounds {
        self.center.to_bounds(self.size)
    }

    fn set_center_y(&mut self, y: f32) {
        self.center = self.center.with_y(y);
    }
}

/// Node geometry keyed by node id, plus the box enclosing all of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    nodes: IndexMap<Id, LayoutNode>,
    bounds: Bounds,
}

impl LayoutResult {
    /// Build a result; the overall bounds are computed from `nodes`.
    pub fn new(nodes: IndexMap<Id, LayoutNode>) -> Self {
        let bounds = nodes
            .values()
            .map(LayoutNode::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap_or_default();
        Self { nodes, bounds }
    }

    pub fn node(&self, id: Id) -> Option<&LayoutNode> {
        self.nodes.get(&id)
    }

    /// Positioned nodes in flowchart declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (Id, &LayoutNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}
