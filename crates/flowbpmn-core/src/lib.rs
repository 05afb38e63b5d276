//! Flowbpmn Core Types
//!
//! This crate provides the foundational types shared by the flowbpmn
//! parser, layout engine and BPMN generator. It includes:
//!
//! - **Identifiers**: String-interned node identifiers ([`identifier::Id`])
//! - **Geometry**: Points, sizes and bounding boxes ([`geometry`] module)
//! - **Flowchart**: The flowchart AST produced by the parser ([`flowchart`] module)

pub mod flowchart;
pub mod geometry;
pub mod identifier;
