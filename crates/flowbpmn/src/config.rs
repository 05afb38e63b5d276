//! Configuration types for flowchart conversion.
//!
//! This module provides configuration structures that control parsing,
//! layout and BPMN export. All types implement [`serde::Deserialize`] for
//! loading from external sources; every field has a default, so a partial
//! file only overrides what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`LayoutConfig`] - Spacing, canvas and pool metrics for the level layout.
//! - [`ParserConfig`] - Reference resolution settings for the parser.
//! - [`ExportConfig`] - Edge routing constants and id generation for export.
//!
//! # Example
//!
//! ```
//! # use flowbpmn::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().horizontal_spacing(), 150.0);
//! assert!(!config.parser().strict_references());
//! ```

use serde::Deserialize;

pub use flowbpmn_parser::ParserConfig;

/// Top-level configuration combining parser, layout and export settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Export configuration section.
    #[serde(default)]
    export: ExportConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(layout: LayoutConfig, parser: ParserConfig, export: ExportConfig) -> Self {
        Self {
            layout,
            parser,
            export,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the export configuration.
    pub fn export(&self) -> &ExportConfig {
        &self.export
    }

    /// Replaces the parser configuration.
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

/// Metrics used by the level layout.
///
/// Spacing values are the lower bounds; the layout widens horizontal spacing
/// for long labels and switches to the dense or wide variants once the
/// flowchart grows past the configured thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Y coordinate of level 0 and of the first pool.
    origin: f32,
    /// Width of the canvas each level is centered in.
    canvas_width: f32,
    horizontal_spacing: f32,
    /// Horizontal space reserved per label character.
    label_char_width: f32,
    vertical_spacing: f32,
    dense_vertical_spacing: f32,
    /// Node count above which `dense_vertical_spacing` is used.
    dense_node_threshold: usize,
    branch_offset: f32,
    wide_branch_offset: f32,
    /// Gateway count above which `wide_branch_offset` is used.
    gateway_threshold: usize,
    /// Vertical gap between stacked pools.
    pool_margin: f32,
    pool_padding_x: f32,
    pool_padding_top: f32,
    pool_padding_bottom: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin: 100.0,
            canvas_width: 800.0,
            horizontal_spacing: 150.0,
            label_char_width: 7.0,
            vertical_spacing: 100.0,
            dense_vertical_spacing: 120.0,
            dense_node_threshold: 10,
            branch_offset: 80.0,
            wide_branch_offset: 100.0,
            gateway_threshold: 3,
            pool_margin: 50.0,
            pool_padding_x: 20.0,
            pool_padding_top: 40.0,
            pool_padding_bottom: 20.0,
        }
    }
}

impl LayoutConfig {
    pub fn origin(&self) -> f32 {
        self.origin
    }

    pub fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    pub fn horizontal_spacing(&self) -> f32 {
        self.horizontal_spacing
    }

    pub fn label_char_width(&self) -> f32 {
        self.label_char_width
    }

    pub fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }

    pub fn dense_vertical_spacing(&self) -> f32 {
        self.dense_vertical_spacing
    }

    pub fn dense_node_threshold(&self) -> usize {
        self.dense_node_threshold
    }

    pub fn branch_offset(&self) -> f32 {
        self.branch_offset
    }

    pub fn wide_branch_offset(&self) -> f32 {
        self.wide_branch_offset
    }

    pub fn gateway_threshold(&self) -> usize {
        self.gateway_threshold
    }

    pub fn pool_margin(&self) -> f32 {
        self.pool_margin
    }

    pub fn pool_padding_x(&self) -> f32 {
        self.pool_padding_x
    }

    pub fn pool_padding_top(&self) -> f32 {
        self.pool_padding_top
    }

    pub fn pool_padding_bottom(&self) -> f32 {
        self.pool_padding_bottom
    }
}

/// Settings for BPMN export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Horizontal distance a target must lie behind its source for the edge
    /// to be routed as a loop-back detour.
    loop_back_threshold: f32,
    /// How far below the lower endpoint a loop-back detour runs.
    loop_back_drop: f32,
    /// Horizontal inset of the detour's middle waypoints.
    loop_back_inset: f32,
    /// Seed for the random part of the definitions id. Random when unset.
    definitions_seed: Option<u64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            loop_back_threshold: 100.0,
            loop_back_drop: 50.0,
            loop_back_inset: 30.0,
            definitions_seed: None,
        }
    }
}

impl ExportConfig {
    pub fn loop_back_threshold(&self) -> f32 {
        self.loop_back_threshold
    }

    pub fn loop_back_drop(&self) -> f32 {
        self.loop_back_drop
    }

    pub fn loop_back_inset(&self) -> f32 {
        self.loop_back_inset
    }

    pub fn definitions_seed(&self) -> Option<u64> {
        self.definitions_seed
    }

    /// Fixes the definitions id seed so output is reproducible.
    pub fn with_definitions_seed(mut self, seed: u64) -> Self {
        self.definitions_seed = Some(seed);
        self
    }
}
