//! BPMN 2.0 generation.
//!
//! [`BpmnGenerator`] maps a parsed [`Flowchart`] (and optionally its
//! [`LayoutResult`]) to a BPMN document: one process holding every flow
//! element and sequence flow, an optional collaboration with one participant
//! per subgraph, and a diagram plane with shapes and routed edges.
//!
//! # Element mapping
//!
//! | Node type    | Element                    | Id prefix     |
//! |--------------|----------------------------|---------------|
//! | `start`      | `startEvent`               | `StartEvent`  |
//! | `end`        | `endEvent`                 | `EndEvent`    |
//! | `process`    | `task`                     | `Task`        |
//! | `decision`   | `exclusiveGateway`         | `Gateway`     |
//! | `subprocess` | `subProcess`               | `SubProcess`  |
//! | `data`       | `dataObjectReference`      | `DataObject`  |
//! | `terminator` | `intermediateThrowEvent`   | `Event`       |

mod ids;
mod routing;
mod writer;

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::{debug, info, trace};

use flowbpmn_core::{
    flowchart::{Flowchart, NodeType},
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
};

use crate::{config::ExportConfig, export::Error, layout::LayoutResult};

use ids::IdContext;
use routing::PortKey;

/// Confidence reported for every generated document.
const CONFIDENCE: f32 = 0.9;

const GRID_ORIGIN: f32 = 100.0;
const GRID_STEP: f32 = 150.0;

/// Counter prefix for `dataObject` ids. No element kind uses it.
const DATA_OBJECT_PREFIX: &str = "Data";

/// Event flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    End,
    IntermediateThrow,
}

/// Output category of a flow element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Event(EventKind),
    Task,
    Gateway,
    SubProcess,
    DataObject,
}

impl ElementKind {
    pub fn from_node_type(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Start => Self::Event(EventKind::Start),
            NodeType::End => Self::Event(EventKind::End),
            NodeType::Process => Self::Task,
            NodeType::Decision => Self::Gateway,
            NodeType::Subprocess => Self::SubProcess,
            NodeType::Data => Self::DataObject,
            NodeType::Terminator => Self::Event(EventKind::IntermediateThrow),
        }
    }

    /// Prefix of generated element ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Event(EventKind::Start) => "StartEvent",
            Self::Event(EventKind::End) => "EndEvent",
            Self::Event(EventKind::IntermediateThrow) => "Event",
            Self::Task => "Task",
            Self::Gateway => "Gateway",
            Self::SubProcess => "SubProcess",
            Self::DataObject => "DataObject",
        }
    }

    /// Qualified XML tag of the element.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Event(EventKind::Start) => "bpmn:startEvent",
            Self::Event(EventKind::End) => "bpmn:endEvent",
            Self::Event(EventKind::IntermediateThrow) => "bpmn:intermediateThrowEvent",
            Self::Task => "bpmn:task",
            Self::Gateway => "bpmn:exclusiveGateway",
            Self::SubProcess => "bpmn:subProcess",
            Self::DataObject => "bpmn:dataObjectReference",
        }
    }

    /// Shape size used when no layout is supplied.
    pub fn default_size(self) -> Size {
        match self {
            Self::Gateway => Size::new(50.0, 50.0),
            Self::Event(_) => Size::new(36.0, 36.0),
            _ => Size::new(100.0, 80.0),
        }
    }

    pub fn is_event(self) -> bool {
        matches!(self, Self::Event(_))
    }
}

/// A generated flow element.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowElement {
    id: String,
    node: Id,
    kind: ElementKind,
    name: String,
    bounds: Bounds,
    /// Id of the `dataObject` a data reference points at.
    data_object: Option<String>,
}

impl FlowElement {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Flowchart node this element was generated from.
    pub fn node(&self) -> Id {
        self.node
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shape box; its minimum point is the top-left corner.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn position(&self) -> Point {
        self.bounds.min_point()
    }

    fn data_object_id(&self) -> Option<&str> {
        self.data_object.as_deref()
    }
}

/// A generated sequence flow with its routed waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    id: String,
    source: String,
    target: String,
    label: Option<String>,
    waypoints: Vec<Point>,
}

impl SequenceFlow {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Element id of the source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Element id of the target.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Diagram waypoints, always at least two.
    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }
}

/// A participant generated from a subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    id: String,
    name: String,
    members: Vec<Id>,
    bounds: Option<Bounds>,
}

impl Pool {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node ids of the subgraph members.
    pub fn members(&self) -> &[Id] {
        &self.members
    }

    /// Participant box, `None` when no member was generated.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}

/// Element and flow counts of a generated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total_elements: usize,
    pub tasks: usize,
    pub events: usize,
    pub gateways: usize,
    pub flows: usize,
    /// Nodes in the source flowchart.
    pub node_count: usize,
    /// Edges in the source flowchart.
    pub edge_count: usize,
}

/// Output of one conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    process_id: String,
    process_name: String,
    xml: String,
    elements: Vec<FlowElement>,
    flows: Vec<SequenceFlow>,
    pools: Vec<Pool>,
    statistics: Statistics,
    warnings: Vec<String>,
    confidence: f32,
    elapsed: Duration,
}

impl ConversionResult {
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// The BPMN document.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn elements(&self) -> &[FlowElement] {
        &self.elements
    }

    pub fn flows(&self) -> &[SequenceFlow] {
        &self.flows
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Time spent generating the document.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Append advisory warnings.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    /// Consume the result, keeping only the document.
    pub fn into_xml(self) -> String {
        self.xml
    }
}

/// Generates BPMN documents from flowcharts.
///
/// The generator itself holds configuration only. Id counters live in a
/// context created per [`generate`](Self::generate) call, so one generator
/// can serve concurrent conversions.
#[derive(Debug, Clone, Default)]
pub struct BpmnGenerator {
    config: ExportConfig,
    pool_padding: Insets,
}

impl BpmnGenerator {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            pool_padding: Insets::default(),
        }
    }

    /// Padding between pool members and the participant border.
    pub fn with_pool_padding(mut self, padding: Insets) -> Self {
        self.pool_padding = padding;
        self
    }

    /// Generate a BPMN document.
    ///
    /// Nodes are positioned from `layout` when it has an entry for them and
    /// fall back to a single left-to-right row otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the XML writer fails.
    pub fn generate(
        &self,
        flowchart: &Flowchart,
        process_name: &str,
        layout: Option<&LayoutResult>,
    ) -> Result<ConversionResult, Error> {
        let started = Instant::now();
        let mut ids = IdContext::new(self.config.definitions_seed());

        let definitions_id = ids.definitions_id();
        let process_id = ids.next("Process");
        info!(process_id = process_id.as_str(); "Generating BPMN document");

        let mut elements = build_elements(flowchart, layout);
        let element_index: HashMap<Id, usize> = elements
            .iter()
            .enumerate()
            .map(|(index, element)| (element.node, index))
            .collect();

        let flows = self.build_flows(flowchart, &elements, &element_index, &mut ids);
        let pools = self.build_pools(flowchart, &elements, &element_index);
        for element in elements
            .iter_mut()
            .filter(|element| element.kind == ElementKind::DataObject)
        {
            element.data_object = Some(ids.next(DATA_OBJECT_PREFIX));
        }
        debug!(
            elements = elements.len(),
            flows = flows.len(),
            pools = pools.len();
            "Built document model"
        );

        let xml = writer::write_document(&writer::Document {
            definitions_id: &definitions_id,
            process_id: &process_id,
            process_name,
            elements: &elements,
            flows: &flows,
            pools: &pools,
        })?;
        trace!(xml = xml.as_str(); "Generated XML");

        let statistics = Statistics {
            total_elements: elements.len(),
            tasks: elements.iter().filter(|e| e.kind == ElementKind::Task).count(),
            events: elements.iter().filter(|e| e.kind.is_event()).count(),
            gateways: elements.iter().filter(|e| e.kind == ElementKind::Gateway).count(),
            flows: flows.len(),
            node_count: flowchart.node_count(),
            edge_count: flowchart.edge_count(),
        };

        Ok(ConversionResult {
            process_id,
            process_name: process_name.to_string(),
            xml,
            elements,
            flows,
            pools,
            statistics,
            warnings: Vec::new(),
            confidence: CONFIDENCE,
            elapsed: started.elapsed(),
        })
    }

    fn build_flows(
        &self,
        flowchart: &Flowchart,
        elements: &[FlowElement],
        element_index: &HashMap<Id, usize>,
        ids: &mut IdContext,
    ) -> Vec<SequenceFlow> {
        let endpoints: Vec<(usize, usize, Option<&str>)> = flowchart
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = *element_index.get(&edge.source())?;
                let target = *element_index.get(&edge.target())?;
                Some((source, target, edge.label()))
            })
            .collect();

        let ports = gateway_ports(elements, &endpoints);

        endpoints
            .iter()
            .zip(ports)
            .map(|(&(source, target, label), port)| {
                let (source, target) = (&elements[source], &elements[target]);
                SequenceFlow {
                    id: ids.next("Flow"),
                    source: source.id.clone(),
                    target: target.id.clone(),
                    label: label.map(str::to_string),
                    waypoints: routing::waypoints(source.bounds, target.bounds, port, &self.config),
                }
            })
            .collect()
    }

    fn build_pools(
        &self,
        flowchart: &Flowchart,
        elements: &[FlowElement],
        element_index: &HashMap<Id, usize>,
    ) -> Vec<Pool> {
        flowchart
            .subgraphs()
            .iter()
            .enumerate()
            .map(|(index, subgraph)| {
                let bounds = subgraph
                    .members()
                    .iter()
                    .filter_map(|member| element_index.get(member))
                    .map(|&element| elements[element].bounds)
                    .reduce(|acc, bounds| acc.merge(&bounds))
                    .map(|bounds| bounds.add_padding(self.pool_padding));
                Pool {
                    id: format!("Participant_{}", index + 1),
                    name: subgraph.title().to_string(),
                    members: subgraph.members().to_vec(),
                    bounds,
                }
            })
            .collect()
    }
}

/// One element per node, skipping ids that cannot come from a declaration.
fn build_elements(flowchart: &Flowchart, layout: Option<&LayoutResult>) -> Vec<FlowElement> {
    let mut elements: Vec<FlowElement> = Vec::with_capacity(flowchart.node_count());

    for node in flowchart.nodes() {
        if node.id().matches(|id| id.contains('|')) {
            trace!(node_id = node.id().to_string(); "Skipping edge label artifact");
            continue;
        }

        let kind = ElementKind::from_node_type(node.node_type());
        let bounds = match layout.and_then(|layout| layout.node(node.id())) {
            Some(positioned) => positioned.bounds(),
            None => {
                let x = GRID_ORIGIN + elements.len() as f32 * GRID_STEP;
                Bounds::new_from_top_left(Point::new(x, GRID_ORIGIN), kind.default_size())
            }
        };

        elements.push(FlowElement {
            id: format!("{}_{}", kind.id_prefix(), node.id()),
            node: node.id(),
            kind,
            name: node.label().to_string(),
            bounds,
            data_object: None,
        });
    }

    elements
}

/// Fixed gateway ports for each flow in `endpoints`, parallel to it.
fn gateway_ports(
    elements: &[FlowElement],
    endpoints: &[(usize, usize, Option<&str>)],
) -> Vec<Option<routing::Port>> {
    let mut ports = vec![None; endpoints.len()];

    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (flow, &(source, _, _)) in endpoints.iter().enumerate() {
        if elements[source].kind == ElementKind::Gateway {
            outgoing.entry(source).or_default().push(flow);
        }
    }

    for flow_indices in outgoing.values() {
        let keys: Vec<PortKey> = flow_indices
            .iter()
            .map(|&flow| {
                let (_, target, label) = endpoints[flow];
                PortKey {
                    label,
                    target: elements[target].id(),
                }
            })
            .collect();
        for (&flow, port) in flow_indices.iter().zip(routing::gateway_ports(&keys)) {
            ports[flow] = port;
        }
    }

    ports
}

#[cfg(test)]
mod tests {
    use flowbpmn_core::flowchart::{Edge, EdgeKind, Node, Shape, Subgraph};

    use super::*;

    fn node(id: &str, shape: Shape, label: &str) -> Node {
        Node::with_shape(Id::new(id), shape, label)
    }

    fn seeded() -> BpmnGenerator {
        BpmnGenerator::new(ExportConfig::default().with_definitions_seed(7))
    }

    fn linear_chart() -> Flowchart {
        let mut chart = Flowchart::new();
        let mut start = node("A", Shape::Rectangle, "Start");
        start.reclassify(NodeType::Start);
        let mut end = node("C", Shape::Rectangle, "End");
        end.reclassify(NodeType::End);
        chart.insert_node(start);
        chart.insert_node(node("B", Shape::Rectangle, "Task"));
        chart.insert_node(end);
        chart.push_edge(Edge::new(Id::new("A"), Id::new("B"), EdgeKind::Directed, None));
        chart.push_edge(Edge::new(Id::new("B"), Id::new("C"), EdgeKind::Directed, None));
        chart
    }

    #[test]
    fn test_element_ids_and_grid_fallback() {
        let result = seeded().generate(&linear_chart(), "Process", None).unwrap();

        let ids: Vec<_> = result.elements().iter().map(FlowElement::id).collect();
        assert_eq!(ids, vec!["StartEvent_A", "Task_B", "EndEvent_C"]);

        let positions: Vec<_> = result.elements().iter().map(FlowElement::position).collect();
        assert_eq!(
            positions,
            vec![
                Point::new(100.0, 100.0),
                Point::new(250.0, 100.0),
                Point::new(400.0, 100.0)
            ]
        );
        assert_eq!(result.elements()[1].bounds().to_size(), Size::new(100.0, 80.0));
    }

    #[test]
    fn test_ids_are_per_call() {
        let generator = seeded();
        let first = generator.generate(&linear_chart(), "Process", None).unwrap();
        let second = generator.generate(&linear_chart(), "Process", None).unwrap();

        assert_eq!(first.process_id(), "Process_1");
        assert_eq!(second.process_id(), "Process_1");
        assert_eq!(first.flows()[0].id(), "Flow_2");
        assert_eq!(first.xml(), second.xml());
    }

    #[test]
    fn test_statistics() {
        let result = seeded().generate(&linear_chart(), "Process", None).unwrap();
        let stats = result.statistics();

        assert_eq!(stats.total_elements, 3);
        assert_eq!(stats.tasks, 1);
        assert_eq!(stats.events, 2);
        assert_eq!(stats.gateways, 0);
        assert_eq!(stats.flows, 2);
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 2);
        assert!((result.confidence() - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_redundant_event_names_are_omitted() {
        let xml = seeded()
            .generate(&linear_chart(), "Process", None)
            .unwrap()
            .into_xml();

        assert!(xml.contains(r#"<bpmn:startEvent id="StartEvent_A"/>"#));
        assert!(xml.contains(r#"<bpmn:endEvent id="EndEvent_C"/>"#));
        assert!(xml.contains(r#"<bpmn:task id="Task_B" name="Task"/>"#));
    }

    #[test]
    fn test_descriptive_event_name_is_kept() {
        let mut chart = Flowchart::new();
        let mut done = node("done", Shape::Rectangle, "Order shipped");
        done.reclassify(NodeType::End);
        chart.insert_node(done);

        let xml = seeded().generate(&chart, "Process", None).unwrap().into_xml();

        assert!(xml.contains(r#"<bpmn:endEvent id="EndEvent_done" name="Order shipped"/>"#));
    }

    #[test]
    fn test_data_and_terminator_elements() {
        let mut chart = Flowchart::new();
        chart.insert_node(node("doc", Shape::DoubleBracket, "Invoice"));
        chart.insert_node(node("wait", Shape::Circle, "Wait"));

        let result = seeded().generate(&chart, "Process", None).unwrap();
        let xml = result.xml();

        assert!(xml.contains(r#"<bpmn:dataObject id="Data_2"/>"#));
        assert!(xml.contains(
            r#"<bpmn:dataObjectReference id="DataObject_doc" name="Invoice" dataObjectRef="Data_2"/>"#
        ));
        assert!(xml.contains(r#"<bpmn:intermediateThrowEvent id="Event_wait" name="Wait"/>"#));
        assert_eq!(result.statistics().events, 1);
    }

    #[test]
    fn test_data_object_ids_never_collide() {
        let mut chart = Flowchart::new();
        chart.insert_node(node("doc", Shape::DoubleBracket, "Invoice"));
        chart.insert_node(node("doc_object", Shape::DoubleBracket, "Other"));
        chart.push_edge(Edge::new(
            Id::new("doc"),
            Id::new("doc_object"),
            EdgeKind::Directed,
            None,
        ));

        let xml = seeded().generate(&chart, "Process", None).unwrap().into_xml();

        let mut ids: Vec<&str> = xml
            .split(" id=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "duplicate ids in {xml}");
        assert!(xml.contains(r#"dataObjectRef="Data_3""#));
        assert!(xml.contains(r#"dataObjectRef="Data_4""#));
    }

    #[test]
    fn test_collaboration_only_with_subgraphs() {
        let plain = seeded().generate(&linear_chart(), "Process", None).unwrap();
        assert!(!plain.xml().contains("bpmn:collaboration"));
        assert!(plain.xml().contains(r#"bpmnElement="Process_1""#));

        let mut chart = linear_chart();
        let index = chart.push_subgraph(Subgraph::new(Id::new("team"), "Team"));
        let subgraph = chart.subgraph_mut(index).unwrap();
        subgraph.add_member(Id::new("A"));
        subgraph.add_member(Id::new("B"));

        let pooled = seeded()
            .with_pool_padding(Insets::new(40.0, 20.0, 20.0, 20.0))
            .generate(&chart, "Process", None)
            .unwrap();

        assert!(pooled.xml().contains(
            r#"<bpmn:participant id="Participant_1" name="Team" processRef="Process_1"/>"#
        ));
        assert!(pooled.xml().contains(r#"bpmnElement="Collaboration_1""#));

        let pool = &pooled.pools()[0];
        assert_eq!(pool.members(), &[Id::new("A"), Id::new("B")]);
        let bounds = pool.bounds().unwrap();
        assert_eq!(bounds.min_point(), Point::new(80.0, 60.0));
        assert_eq!(bounds.max_x(), 370.0);
    }

    #[test]
    fn test_every_edge_has_waypoints() {
        let result = seeded().generate(&linear_chart(), "Process", None).unwrap();
        for flow in result.flows() {
            assert!(flow.waypoints().len() >= 2);
        }
        assert_eq!(result.xml().matches("<di:waypoint").count(), 4);
    }
}
