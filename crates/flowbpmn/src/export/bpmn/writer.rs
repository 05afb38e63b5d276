//! BPMN 2.0 XML serialization.
//!
//! Text is escaped by `quick-xml` when attributes and text events are
//! written; HTML line breaks in labels are collapsed beforehand.

use std::{borrow::Cow, io::Cursor};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use flowbpmn_core::geometry::{Bounds, Point};

use super::{ElementKind, EventKind, FlowElement, Pool, SequenceFlow};
use crate::export::Error;

const NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:bpmn", "http://www.omg.org/spec/BPMN/20100524/MODEL"),
    ("xmlns:bpmndi", "http://www.omg.org/spec/BPMN/20100524/DI"),
    ("xmlns:dc", "http://www.omg.org/spec/DD/20100524/DC"),
    ("xmlns:di", "http://www.omg.org/spec/DD/20100524/DI"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

const TARGET_NAMESPACE: &str = "http://bpmn.io/schema/bpmn";
const COLLABORATION_ID: &str = "Collaboration_1";

/// Everything that goes into one document.
pub(super) struct Document<'a> {
    pub definitions_id: &'a str,
    pub process_id: &'a str,
    pub process_name: &'a str,
    pub elements: &'a [FlowElement],
    pub flows: &'a [SequenceFlow],
    pub pools: &'a [Pool],
}

/// Replace `<br>`, `<br/>` and `<br />` (any case) with a single space.
pub(super) fn collapse_line_breaks(text: &str) -> Cow<'_, str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    if !lower.contains("<br") {
        return Cow::Borrowed(text);
    }

    let mut collapsed = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find("<br") {
        let start = search + found;
        let tail = start + "<br".len();
        match line_break_len(&lower[tail..]) {
            Some(len) => {
                collapsed.push_str(&text[copied..start]);
                collapsed.push(' ');
                copied = tail + len;
                search = copied;
            }
            None => search = tail,
        }
    }
    collapsed.push_str(&text[copied..]);
    Cow::Owned(collapsed)
}

/// Length of the `\s*/?>` remainder of a line break tag, if `tail` has one.
fn line_break_len(tail: &str) -> Option<usize> {
    let after_space = tail.trim_start();
    let after_slash = after_space.strip_prefix('/').unwrap_or(after_space);
    after_slash
        .starts_with('>')
        .then(|| tail.len() - after_slash.len() + 1)
}

/// Serialize a document to an XML string.
pub(super) fn write_document(doc: &Document) -> Result<String, Error> {
    let mut xml = XmlWriter::new();

    xml.declaration()?;

    let mut definitions = BytesStart::new("bpmn:definitions");
    for namespace in NAMESPACES {
        definitions.push_attribute(namespace);
    }
    definitions.push_attribute(("id", doc.definitions_id));
    definitions.push_attribute(("targetNamespace", TARGET_NAMESPACE));
    definitions.push_attribute(("exporter", "flowbpmn"));
    definitions.push_attribute(("exporterVersion", env!("CARGO_PKG_VERSION")));
    xml.start(definitions)?;

    if !doc.pools.is_empty() {
        write_collaboration(&mut xml, doc)?;
    }
    write_process(&mut xml, doc)?;
    write_diagram(&mut xml, doc)?;

    xml.end("bpmn:definitions")?;
    xml.finish()
}

fn write_collaboration(xml: &mut XmlWriter, doc: &Document) -> Result<(), Error> {
    let mut collaboration = BytesStart::new("bpmn:collaboration");
    collaboration.push_attribute(("id", COLLABORATION_ID));
    xml.start(collaboration)?;

    for pool in doc.pools {
        let mut participant = BytesStart::new("bpmn:participant");
        participant.push_attribute(("id", pool.id()));
        participant.push_attribute(("name", collapse_line_breaks(pool.name()).as_ref()));
        participant.push_attribute(("processRef", doc.process_id));
        xml.empty(participant)?;
    }

    xml.end("bpmn:collaboration")
}

fn write_process(xml: &mut XmlWriter, doc: &Document) -> Result<(), Error> {
    let mut process = BytesStart::new("bpmn:process");
    process.push_attribute(("id", doc.process_id));
    process.push_attribute(("name", collapse_line_breaks(doc.process_name).as_ref()));
    process.push_attribute(("isExecutable", "true"));
    xml.start(process)?;

    for element in doc.elements {
        write_element(xml, element)?;
    }
    for flow in doc.flows {
        write_flow(xml, flow)?;
    }

    xml.end("bpmn:process")
}

/// Whether an element's label is worth writing as its `name`.
///
/// Start and end events drop labels that only repeat the element id or
/// say "start"/"end".
fn carries_name(element: &FlowElement) -> bool {
    let name = element.name();
    let redundant = |word: &str| name == element.id() || name.to_lowercase().contains(word);
    match element.kind() {
        ElementKind::Event(EventKind::Start) => !redundant("start"),
        ElementKind::Event(EventKind::End) => !redundant("end"),
        _ => true,
    }
}

fn write_element(xml: &mut XmlWriter, element: &FlowElement) -> Result<(), Error> {
    let name = collapse_line_breaks(element.name());

    if let Some(object_id) = element.data_object_id() {
        let mut object = BytesStart::new("bpmn:dataObject");
        object.push_attribute(("id", object_id));
        xml.empty(object)?;

        let mut reference = BytesStart::new("bpmn:dataObjectReference");
        reference.push_attribute(("id", element.id()));
        reference.push_attribute(("name", name.as_ref()));
        reference.push_attribute(("dataObjectRef", object_id));
        return xml.empty(reference);
    }

    let mut tag = BytesStart::new(element.kind().tag());
    tag.push_attribute(("id", element.id()));
    if carries_name(element) {
        tag.push_attribute(("name", name.as_ref()));
    }
    xml.empty(tag)
}

fn write_flow(xml: &mut XmlWriter, flow: &SequenceFlow) -> Result<(), Error> {
    let mut tag = BytesStart::new("bpmn:sequenceFlow");
    tag.push_attribute(("id", flow.id()));
    tag.push_attribute(("sourceRef", flow.source()));
    tag.push_attribute(("targetRef", flow.target()));

    let Some(label) = flow.label() else {
        return xml.empty(tag);
    };

    let label = collapse_line_breaks(label);
    tag.push_attribute(("name", label.as_ref()));
    xml.start(tag)?;

    let mut condition = BytesStart::new("bpmn:conditionExpression");
    condition.push_attribute(("xsi:type", "bpmn:tFormalExpression"));
    xml.start(condition)?;
    xml.text(&label)?;
    xml.end("bpmn:conditionExpression")?;

    xml.end("bpmn:sequenceFlow")
}

fn write_diagram(xml: &mut XmlWriter, doc: &Document) -> Result<(), Error> {
    let mut diagram = BytesStart::new("bpmndi:BPMNDiagram");
    diagram.push_attribute(("id", "BPMNDiagram_1"));
    xml.start(diagram)?;

    let plane_element = if doc.pools.is_empty() {
        doc.process_id
    } else {
        COLLABORATION_ID
    };
    let mut plane = BytesStart::new("bpmndi:BPMNPlane");
    plane.push_attribute(("id", "BPMNPlane_1"));
    plane.push_attribute(("bpmnElement", plane_element));
    xml.start(plane)?;

    for pool in doc.pools {
        if let Some(bounds) = pool.bounds() {
            write_shape(xml, pool.id(), bounds, true)?;
        }
    }
    for element in doc.elements {
        write_shape(xml, element.id(), element.bounds(), false)?;
    }
    for flow in doc.flows {
        write_edge(xml, flow)?;
    }

    xml.end("bpmndi:BPMNPlane")?;
    xml.end("bpmndi:BPMNDiagram")
}

fn write_shape(
    xml: &mut XmlWriter,
    element_id: &str,
    bounds: Bounds,
    horizontal: bool,
) -> Result<(), Error> {
    let shape_id = format!("{element_id}_di");
    let mut shape = BytesStart::new("bpmndi:BPMNShape");
    shape.push_attribute(("id", shape_id.as_str()));
    shape.push_attribute(("bpmnElement", element_id));
    if horizontal {
        shape.push_attribute(("isHorizontal", "true"));
    }
    xml.start(shape)?;

    let (x, y) = (bounds.min_x().to_string(), bounds.min_y().to_string());
    let (width, height) = (bounds.width().to_string(), bounds.height().to_string());
    let mut dc_bounds = BytesStart::new("dc:Bounds");
    dc_bounds.push_attribute(("x", x.as_str()));
    dc_bounds.push_attribute(("y", y.as_str()));
    dc_bounds.push_attribute(("width", width.as_str()));
    dc_bounds.push_attribute(("height", height.as_str()));
    xml.empty(dc_bounds)?;

    xml.end("bpmndi:BPMNShape")
}

fn write_edge(xml: &mut XmlWriter, flow: &SequenceFlow) -> Result<(), Error> {
    let edge_id = format!("{}_di", flow.id());
    let mut edge = BytesStart::new("bpmndi:BPMNEdge");
    edge.push_attribute(("id", edge_id.as_str()));
    edge.push_attribute(("bpmnElement", flow.id()));
    xml.start(edge)?;

    for point in flow.waypoints() {
        write_waypoint(xml, *point)?;
    }

    xml.end("bpmndi:BPMNEdge")
}

fn write_waypoint(xml: &mut XmlWriter, point: Point) -> Result<(), Error> {
    let (x, y) = (point.x().to_string(), point.y().to_string());
    let mut waypoint = BytesStart::new("di:waypoint");
    waypoint.push_attribute(("x", x.as_str()));
    waypoint.push_attribute(("y", y.as_str()));
    xml.empty(waypoint)
}

/// Thin wrapper mapping writer failures into [`Error`].
struct XmlWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn write(&mut self, event: Event) -> Result<(), Error> {
        self.inner
            .write_event(event)
            .map_err(|err| Error::Write(err.to_string()))
    }

    fn declaration(&mut self) -> Result<(), Error> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn start(&mut self, tag: BytesStart) -> Result<(), Error> {
        self.write(Event::Start(tag))
    }

    fn empty(&mut self, tag: BytesStart) -> Result<(), Error> {
        self.write(Event::Empty(tag))
    }

    fn text(&mut self, text: &str) -> Result<(), Error> {
        self.write(Event::Text(BytesText::new(text)))
    }

    fn end(&mut self, name: &str) -> Result<(), Error> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn finish(self) -> Result<String, Error> {
        String::from_utf8(self.inner.into_inner().into_inner()).map_err(Error::Encoding)
    }
}
