//! Flowchart abstract syntax tree.
//!
//! A [`Flowchart`] is produced by the parser, reclassified once by type
//! inference, and then handed read-only to layout and generation.
//!
//! Nodes are kept in declaration order. That order is meaningful: it drives
//! the left-to-right placement inside a layout level and the fallback grid
//! used when no layout is supplied.

use std::fmt;

use indexmap::IndexMap;

use crate::identifier::Id;

/// Orientation declared by a `graph`/`flowchart` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    TopDown,
    TopBottom,
    LeftRight,
    RightLeft,
    BottomTop,
}

impl Direction {
    /// Parses an orientation keyword (`TD`, `TB`, `LR`, `RL`, `BT`), ignoring case.
    ///
    /// ```
    /// # use flowbpmn_core::flowchart::Direction;
    /// assert_eq!(Direction::from_keyword("lr"), Some(Direction::LeftRight));
    /// assert_eq!(Direction::from_keyword("XY"), None);
    /// ```
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "TD" => Some(Self::TopDown),
            "TB" => Some(Self::TopBottom),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            "BT" => Some(Self::BottomTop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopDown => "TD",
            Self::TopBottom => "TB",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
            Self::BottomTop => "BT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic role of a flowchart node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Start,
    End,
    Process,
    Decision,
    Subprocess,
    Data,
    Terminator,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Process => "process",
            Self::Decision => "decision",
            Self::Subprocess => "subprocess",
            Self::Data => "data",
            Self::Terminator => "terminator",
        }
    }

    /// Returns `true` for the types that type inference may still reclassify.
    pub fn is_ambiguous(self) -> bool {
        matches!(self, Self::Process | Self::Terminator)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delimiter pair a node was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[text]`
    Rectangle,
    /// `(text)`
    Rounded,
    /// `[[text]]`
    DoubleBracket,
    /// `[/text/]`
    Slanted,
    /// `{text}`
    Rhombus,
    /// `((text))`
    Circle,
}

impl Shape {
    /// Node type selected by this shape.
    ///
    /// ```
    /// # use flowbpmn_core::flowchart::{NodeType, Shape};
    /// assert_eq!(Shape::Rhombus.node_type(), NodeType::Decision);
    /// assert_eq!(Shape::Circle.node_type(), NodeType::Terminator);
    /// ```
    pub fn node_type(self) -> NodeType {
        match self {
            Self::Rectangle | Self::Rounded => NodeType::Process,
            Self::DoubleBracket => NodeType::Data,
            Self::Slanted => NodeType::Subprocess,
            Self::Rhombus => NodeType::Decision,
            Self::Circle => NodeType::Terminator,
        }
    }
}

/// A flowchart node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Id,
    node_type: NodeType,
    label: String,
    shape: Option<Shape>,
}

impl Node {
    /// Creates a node declared with an explicit shape.
    pub fn with_shape(id: Id, shape: Shape, label: impl Into<String>) -> Self {
        Self {
            id,
            node_type: shape.node_type(),
            label: label.into(),
            shape: Some(shape),
        }
    }

    /// Creates a node synthesized from a bare reference: a `process` labelled with its id.
    pub fn implicit(id: Id) -> Self {
        Self {
            id,
            node_type: NodeType::Process,
            label: id.to_string(),
            shape: None,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Replaces the node type. Used by type inference.
    pub fn reclassify(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }
}

/// Line style of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Directed,
    Labeled,
    Dotted,
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: String,
    source: Id,
    target: Id,
    kind: EdgeKind,
    label: Option<String>,
}

impl Edge {
    /// Creates an edge; its id is derived as `<source>_to_<target>`.
    pub fn new(source: Id, target: Id, kind: EdgeKind, label: Option<String>) -> Self {
        Self {
            id: format!("{source}_to_{target}"),
            source,
            target,
            kind,
            label,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// A named group of nodes, rendered as a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgraph {
    id: Id,
    title: String,
    members: Vec<Id>,
}

impl Subgraph {
    pub fn new(id: Id, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Member node ids in the order they were first encountered.
    pub fn members(&self) -> &[Id] {
        &self.members
    }

    pub fn contains(&self, id: Id) -> bool {
        self.members.contains(&id)
    }

    /// Adds a member unless it is already present.
    pub fn add_member(&mut self, id: Id) {
        if !self.contains(id) {
            self.members.push(id);
        }
    }
}

/// The complete flowchart AST.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flowchart {
    direction: Direction,
    nodes: IndexMap<Id, Node>,
    edges: Vec<Edge>,
    subgraphs: Vec<Subgraph>,
}

impl Flowchart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Inserts a node unless one with the same id exists.
    ///
    /// Returns `false` when the id was already declared; the first declaration is kept.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id, node);
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving `id`, in declaration order.
    pub fn outgoing(&self, id: Id) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    /// Edges entering `id`, in declaration order.
    pub fn incoming(&self, id: Id) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.target == id)
    }

    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    /// Appends a subgraph and returns its index.
    pub fn push_subgraph(&mut self, subgraph: Subgraph) -> usize {
        self.subgraphs.push(subgraph);
        self.subgraphs.len() - 1
    }

    pub fn subgraph_mut(&mut self, index: usize) -> Option<&mut Subgraph> {
        self.subgraphs.get_mut(index)
    }

    /// Returns `true` if any subgraph already lists `id` as a member.
    pub fn is_pooled(&self, id: Id) -> bool {
        self.subgraphs.iter().any(|subgraph| subgraph.contains(id))
    }

    pub fn count_of(&self, node_type: NodeType) -> usize {
        self.nodes().filter(|node| node.node_type == node_type).count()
    }
}
