//! The batch pipeline: scan, group, merge, clean

pub mod merger;
pub mod orchestrator;
