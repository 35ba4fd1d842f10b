//! # Timelens Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Identity consolidation (scanning, grouping, merging, cleaning)
//! - The batch pipeline orchestrator
//! - The activity derivation engine (window classification, interval
//!   building, per-day statistics)
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `timelens-domain`
//! - No filesystem or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod activities;
pub mod cleaning;
pub mod identity;
pub mod pipeline;
pub mod ports;

// Re-export specific items to avoid ambiguity
pub use activities::intervals::{correct_gaps, IntervalBuilder};
pub use activities::merger::ActivityMerger;
pub use activities::report::{ActivityReport, DeveloperDayStatistic};
pub use activities::window::{Window, WindowClassifier};
pub use activities::ActivityEngine;
pub use cleaning::cleaner::{CleaningReport, EventCleaner};
pub use cleaning::filters::{default_filters, EventFilter};
pub use identity::grouper::group_related_archives;
pub use identity::scan::collect_identifiers;
pub use pipeline::merger::ArchiveMerger;
pub use pipeline::orchestrator::{PipelineOrchestrator, PipelineReport, UnitFailure};
pub use ports::{ArchiveStore, EventSink, EventSource, IdentityScanner};
