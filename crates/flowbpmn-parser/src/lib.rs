//! # Flowbpmn Parser
//!
//! Parser for the flowchart notation understood by flowbpmn. This crate
//! turns source text into a [`Flowchart`] with inferred node types, along
//! with every diagnostic found on the way.
//!
//! ## Usage
//!
//! ```
//! # use flowbpmn_parser::{parse, ParserConfig};
//! # use flowbpmn_core::flowchart::NodeType;
//! let outcome = parse("graph TD\nA[Start]-->B[Task]-->C[End]", &ParserConfig::default());
//!
//! let ast = outcome.ast().expect("valid flowchart");
//! assert_eq!(ast.node_count(), 3);
//! assert_eq!(ast.count_of(NodeType::Start), 1);
//! ```

mod elaborate;
pub mod error;
mod infer;
mod lexer;
mod parser;
mod span;
mod tokens;
mod validate;

pub use elaborate::ParserConfig;
pub use span::Span;

use log::{debug, info, trace};

use flowbpmn_core::flowchart::Flowchart;

use elaborate::Builder;
use error::{Diagnostic, DiagnosticCollector, ParseError};

/// Result of parsing a flowchart.
///
/// The AST is present only when no error was reported. Warnings never
/// withhold it.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    ast: Option<Flowchart>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl ParseOutcome {
    pub fn ast(&self) -> Option<&Flowchart> {
        self.ast.as_ref()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Returns `true` when parsing produced an AST.
    pub fn is_ok(&self) -> bool {
        self.ast.is_some()
    }

    /// Split into the AST and its warnings, or the errors that withheld it.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying every error diagnostic.
    pub fn into_result(self) -> Result<(Flowchart, Vec<Diagnostic>), ParseError> {
        match self.ast {
            Some(ast) => Ok((ast, self.warnings)),
            None => Err(ParseError::new(self.errors)),
        }
    }
}

/// Parse flowchart source text.
///
/// The pipeline is:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Split tokens into statements and match each one
/// 3. **Elaborate** - Build nodes, edges and pools
/// 4. **Infer** - Reclassify ambiguous node types
/// 5. **Validate** - Check references and report structural advisories
///
/// Parsing never aborts early; unrecognized lines become warnings.
pub fn parse(source: &str, config: &ParserConfig) -> ParseOutcome {
    let mut diagnostics = DiagnosticCollector::new();

    let tokens = lexer::tokenize(source);
    debug!(tokens = tokens.len(); "Tokenized flowchart source");

    let statements = parser::parse_statements(&tokens);
    debug!(statements = statements.len(); "Parsed statements");

    let (mut flowchart, spans) = Builder::new(source, config).build(statements, &mut diagnostics);

    infer::infer_types(&mut flowchart);
    validate::validate(&flowchart, &spans, &mut diagnostics);

    let ast = (!diagnostics.has_errors()).then_some(flowchart);
    let (errors, warnings) = diagnostics.finish();

    match &ast {
        Some(flowchart) => {
            info!(
                nodes = flowchart.node_count(),
                edges = flowchart.edge_count(),
                pools = flowchart.subgraphs().len(),
                warnings = warnings.len();
                "Parsed flowchart"
            );
            trace!(ast:? = flowchart; "Flowchart AST");
        }
        None => debug!(errors = errors.len(); "Flowchart rejected"),
    }

    ParseOutcome {
        ast,
        errors,
        warnings,
    }
}
