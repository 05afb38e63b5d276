//! Flowbpmn - Convert flowchart text into BPMN 2.0 process diagrams.
//!
//! Parsing, layout and BPMN generation for a flowchart notation. The
//! [`Converter`] runs the whole pipeline; the [`layout`] and [`export`]
//! modules can also be used on their own.

pub mod config;
pub mod export;
pub mod layout;

mod error;

pub use flowbpmn_core::{flowchart, geometry, identifier};

pub use error::ConversionError;
pub use export::bpmn::{ConversionResult, Statistics};

use std::fmt;

use log::{debug, info, trace};

use flowbpmn_core::{
    flowchart::{Flowchart, NodeType},
    geometry::Insets,
};
use flowbpmn_parser::ParseOutcome;

use config::AppConfig;
use export::bpmn::BpmnGenerator;
use layout::{LayoutEngine, LevelLayout};

const DEFAULT_PROCESS_NAME: &str = "Converted Process";

/// Options for a single [`Converter::convert`] call.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    auto_layout: bool,
    validate_output: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            auto_layout: true,
            validate_output: false,
        }
    }
}

impl ConvertOptions {
    /// Disabling layout places elements in a single row.
    pub fn with_auto_layout(mut self, auto_layout: bool) -> Self {
        self.auto_layout = auto_layout;
        self
    }

    /// Check the generated XML for expected start and end events.
    pub fn with_validate_output(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }

    pub fn auto_layout(&self) -> bool {
        self.auto_layout
    }

    pub fn validate_output(&self) -> bool {
        self.validate_output
    }
}

/// Outcome of a dry-run [`Converter::can_convert`] check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
    /// Features found in the flowchart that map onto BPMN.
    pub supported: Vec<String>,
    /// Notation features detected in the text that are not converted.
    pub unsupported: Vec<String>,
}

/// Coarse complexity class of a flowchart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    /// Classify `nodes + 0.5 * edges + 2 * decisions`.
    fn from_score(score: f32) -> Self {
        if score < 10.0 {
            Self::Simple
        } else if score < 20.0 {
            Self::Medium
        } else {
            Self::Complex
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// Expected BPMN element counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementEstimates {
    pub tasks: usize,
    pub gateways: usize,
    pub events: usize,
    pub pools: usize,
    pub flows: usize,
}

/// Structural summary produced by [`Converter::analyze`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub subgraph_count: usize,
    pub complexity: Complexity,
    pub estimates: ElementEstimates,
}

/// Runs flowchart text through parsing, layout and BPMN generation.
///
/// A converter holds configuration only and can be shared between threads.
///
/// # Examples
///
/// ```
/// use flowbpmn::{ConvertOptions, Converter};
///
/// let converter = Converter::default();
/// let result = converter
///     .convert("graph TD\nA[Start]-->B[Task]-->C[End]", &ConvertOptions::default())
///     .expect("Failed to convert");
///
/// assert_eq!(result.statistics().flows, 2);
/// assert!(result.xml().contains("bpmn:startEvent"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: AppConfig,
}

impl Converter {
    /// Create a converter with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Convert flowchart text into a BPMN document.
    ///
    /// Parser warnings are carried into the result. Nothing but a
    /// rejected flowchart fails the call.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Parse`] when the flowchart has errors, and
    /// [`ConversionError::Export`] if the XML cannot be written.
    pub fn convert(
        &self,
        source: &str,
        options: &ConvertOptions,
    ) -> Result<ConversionResult, ConversionError> {
        info!(auto_layout = options.auto_layout; "Converting flowchart");

        let outcome = self.parse(source);
        let (flowchart, warnings) = outcome
            .into_result()
            .map_err(|err| ConversionError::new_parse_error(err, source))?;

        let process_name = process_name(&flowchart);
        debug!(process_name = process_name.as_str(); "Derived process name");

        let layout = options.auto_layout.then(|| {
            LevelLayout::new(self.config.layout().clone()).layout(&flowchart)
        });
        if let Some(layout) = &layout {
            trace!(layout:?; "Calculated layout");
        }

        let mut result = self.generator().generate(&flowchart, &process_name, layout.as_ref())?;
        result.extend_warnings(warnings.iter().map(|warning| warning.message().to_string()));

        if options.validate_output {
            result.extend_warnings(output_warnings(&flowchart, result.xml()));
        }

        info!(
            elements = result.statistics().total_elements,
            flows = result.statistics().flows,
            warnings = result.warnings().len();
            "Flowchart converted"
        );
        Ok(result)
    }

    /// Check whether `source` converts, without generating XML.
    pub fn can_convert(&self, source: &str) -> ValidationReport {
        let outcome = self.parse(source);

        let Some(flowchart) = outcome.ast() else {
            return ValidationReport {
                valid: false,
                errors: outcome
                    .errors()
                    .iter()
                    .map(|error| error.message().to_string())
                    .collect(),
                suggestions: vec![
                    "Check flowchart syntax".to_string(),
                    "Ensure all nodes are properly defined".to_string(),
                    "Verify edge connections".to_string(),
                ],
                supported: Vec::new(),
                unsupported: Vec::new(),
            };
        };

        let unsupported = unsupported_features(source);
        let suggestions = if unsupported.is_empty() {
            Vec::new()
        } else {
            vec![format!(
                "Note: The following features will be approximated: {}",
                unsupported.join(", ")
            )]
        };

        ValidationReport {
            valid: true,
            errors: Vec::new(),
            suggestions,
            supported: supported_features(flowchart),
            unsupported,
        }
    }

    /// Summarize the structure of `source` and estimate the BPMN it yields.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Parse`] when the flowchart has errors.
    pub fn analyze(&self, source: &str) -> Result<AnalysisReport, ConversionError> {
        let (flowchart, _) = self
            .parse(source)
            .into_result()
            .map_err(|err| ConversionError::new_parse_error(err, source))?;

        let decisions = flowchart.count_of(NodeType::Decision);
        let score = flowchart.node_count() as f32
            + flowchart.edge_count() as f32 * 0.5
            + decisions as f32 * 2.0;

        let estimates = ElementEstimates {
            tasks: estimated_tasks(&flowchart),
            gateways: decisions,
            events: flowchart.count_of(NodeType::Start)
                + flowchart.count_of(NodeType::End)
                + flowchart.count_of(NodeType::Terminator),
            pools: flowchart.subgraphs().len(),
            flows: flowchart.edge_count(),
        };

        Ok(AnalysisReport {
            node_count: flowchart.node_count(),
            edge_count: flowchart.edge_count(),
            subgraph_count: flowchart.subgraphs().len(),
            complexity: Complexity::from_score(score),
            estimates,
        })
    }

    fn parse(&self, source: &str) -> ParseOutcome {
        flowbpmn_parser::parse(source, self.config.parser())
    }

    fn generator(&self) -> BpmnGenerator {
        let layout = self.config.layout();
        BpmnGenerator::new(self.config.export().clone()).with_pool_padding(Insets::new(
            layout.pool_padding_top(),
            layout.pool_padding_x(),
            layout.pool_padding_bottom(),
            layout.pool_padding_x(),
        ))
    }
}

/// Name of the process: the first start node's label without the words
/// "start" and "begin".
fn process_name(flowchart: &Flowchart) -> String {
    flowchart
        .nodes()
        .find(|node| node.node_type() == NodeType::Start)
        .map(|node| remove_ignore_case(node.label(), &["start", "begin"]))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_PROCESS_NAME.to_string())
}

/// Remove every case-insensitive occurrence of the ASCII `words` from `text`.
fn remove_ignore_case(text: &str, words: &[&str]) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let mut kept = String::with_capacity(text.len());
    let mut offset = 0;
    while offset < text.len() {
        if let Some(word) = words.iter().find(|word| lower[offset..].starts_with(**word)) {
            offset += word.len();
            continue;
        }
        let Some(ch) = text[offset..].chars().next() else {
            break;
        };
        kept.push(ch);
        offset += ch.len_utf8();
    }
    kept
}

fn output_warnings(flowchart: &Flowchart, xml: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if !xml.contains("startEvent") && flowchart.count_of(NodeType::Start) > 0 {
        warnings.push("Start event may not be properly converted".to_string());
    }
    if !xml.contains("endEvent") && flowchart.count_of(NodeType::End) > 0 {
        warnings.push("End event may not be properly converted".to_string());
    }
    warnings
}

fn supported_features(flowchart: &Flowchart) -> Vec<String> {
    let checks = [
        ("Tasks", flowchart.node_count() > 0),
        ("Gateways", flowchart.count_of(NodeType::Decision) > 0),
        (
            "Events",
            flowchart.nodes().any(|node| {
                matches!(
                    node.node_type(),
                    NodeType::Start | NodeType::End | NodeType::Terminator
                )
            }),
        ),
        ("Pools/Swimlanes", !flowchart.subgraphs().is_empty()),
        (
            "Labeled flows",
            flowchart.edges().iter().any(|edge| edge.label().is_some()),
        ),
    ];
    checks
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(feature, _)| feature.to_string())
        .collect()
}

/// Notation features detected by plain substring checks on the source.
fn unsupported_features(source: &str) -> Vec<String> {
    [
        ("linkStyle", "Link styles"),
        ("click", "Click events"),
        (":::", "CSS classes"),
        ("style ", "Inline styles"),
    ]
    .into_iter()
    .filter(|(needle, _)| source.contains(needle))
    .map(|(_, feature)| feature.to_string())
    .collect()
}

/// Nodes expected to become tasks.
///
/// Unlabeled process nodes without predecessors are left out, and end nodes
/// with a descriptive label are counted in.
fn estimated_tasks(flowchart: &Flowchart) -> usize {
    flowchart
        .nodes()
        .filter(|node| match node.node_type() {
            NodeType::Process | NodeType::Subprocess => {
                let bare = node.id().matches(|id| id == node.label());
                !(bare && flowchart.incoming(node.id()).next().is_none())
            }
            NodeType::End => !matches!(
                node.label().to_lowercase().as_str(),
                "end" | "stop" | "finish"
            ),
            _ => false,
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_ignore_case() {
        assert_eq!(remove_ignore_case("Start Order", &["start", "begin"]), " Order");
        assert_eq!(remove_ignore_case("BEGIN here", &["start", "begin"]), " here");
        assert_eq!(remove_ignore_case("restart", &["start"]), "re");
        assert_eq!(remove_ignore_case("café start", &["start"]), "café ");
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(Complexity::from_score(9.5), Complexity::Simple);
        assert_eq!(Complexity::from_score(10.0), Complexity::Medium);
        assert_eq!(Complexity::from_score(19.5), Complexity::Medium);
        assert_eq!(Complexity::from_score(20.0), Complexity::Complex);
    }

    #[test]
    fn test_unsupported_features() {
        let source = "graph TD\nA:::hot-->B\nclick A call\nstyle A fill:#f9f\nlinkStyle 0 stroke:red";
        assert_eq!(
            unsupported_features(source),
            vec!["Link styles", "Click events", "CSS classes", "Inline styles"]
        );
        assert!(unsupported_features("graph TD\nA-->B").is_empty());
    }
}
