//! CLI logic for the flowbpmn converter.
//!
//! This module contains the subcommand handlers behind the `flowbpmn`
//! binary and the [`store`] used to save generated documents.

pub mod error_adapter;
pub mod store;

mod args;
mod config;

pub use args::{Args, Command, ConvertArgs};

use std::{
    fmt::Write as _,
    fs,
    io::{self, Write as _},
};

use log::{info, warn};

use flowbpmn::{
    AnalysisReport, ConversionError, ConvertOptions, Converter, ValidationReport,
    config::ParserConfig,
};

use store::{ProcessStore, SaveOptions};

/// Run the flowbpmn CLI application
///
/// # Errors
///
/// Returns `ConversionError` for:
/// - File I/O and storage errors
/// - Configuration loading errors
/// - Flowchart errors that prevent conversion
pub fn run(args: &Args) -> Result<(), ConversionError> {
    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.strict {
        app_config = app_config.with_parser(ParserConfig::new(true));
    }
    let converter = Converter::new(app_config);

    match &args.command {
        Command::Convert(convert_args) => run_convert(&converter, convert_args),
        Command::Validate { input } => {
            info!(input_path = input; "Validating flowchart");
            let source = fs::read_to_string(input)?;
            let report = converter.can_convert(&source);
            print(&render_validation(&report))
        }
        Command::Analyze { input } => {
            info!(input_path = input; "Analyzing flowchart");
            let source = fs::read_to_string(input)?;
            let report = converter.analyze(&source)?;
            print(&render_analysis(&report))
        }
    }
}

fn run_convert(converter: &Converter, args: &ConvertArgs) -> Result<(), ConversionError> {
    info!(input_path = args.input; "Converting flowchart");

    let source = fs::read_to_string(&args.input)?;
    let options = ConvertOptions::default()
        .with_auto_layout(!args.no_layout)
        .with_validate_output(args.validate);

    let result = converter.convert(&source, &options)?;
    for warning in result.warnings() {
        warn!("{warning}");
    }

    if let Some(out_dir) = &args.out_dir {
        let save_options = match &args.name {
            Some(name) => SaveOptions::new(name.as_str()),
            None => SaveOptions::timestamped(result.process_name()),
        }
        .with_overwrite(args.overwrite);

        let path = ProcessStore::new(out_dir).save(result.xml(), &save_options)?;
        info!(output_file = path.display().to_string(); "BPMN saved");
    } else if let Some(output) = &args.output {
        fs::write(output, result.xml())?;
        info!(output_file = output; "BPMN exported successfully");
    } else {
        print(result.xml())?;
    }

    let stats = result.statistics();
    info!(
        tasks = stats.tasks,
        events = stats.events,
        gateways = stats.gateways,
        flows = stats.flows,
        elapsed_ms = result.elapsed().as_millis() as u64;
        "Conversion finished"
    );
    Ok(())
}

fn print(text: &str) -> Result<(), ConversionError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

fn render_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title}:");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

fn render_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    let verdict = if report.valid { "yes" } else { "no" };
    let _ = writeln!(out, "Convertible: {verdict}");
    render_list(&mut out, "Errors", &report.errors);
    render_list(&mut out, "Supported features", &report.supported);
    render_list(&mut out, "Unsupported features", &report.unsupported);
    render_list(&mut out, "Suggestions", &report.suggestions);
    out.trim_end().to_string()
}

fn render_analysis(report: &AnalysisReport) -> String {
    let estimates = report.estimates;
    format!(
        "Nodes: {}\nEdges: {}\nSubgraphs: {}\nComplexity: {}\n\
         Estimated elements: tasks={}, gateways={}, events={}, pools={}, flows={}",
        report.node_count,
        report.edge_count,
        report.subgraph_count,
        report.complexity,
        estimates.tasks,
        estimates.gateways,
        estimates.events,
        estimates.pools,
        estimates.flows,
    )
}
