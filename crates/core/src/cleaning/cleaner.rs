//! The event cleaner: filter, deduplicate, order, persist

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use timelens_domain::{IdeEvent, Result};

use crate::cleaning::filters::EventFilter;
use crate::ports::{ArchiveStore, EventSink as _, EventSource as _};

/// Per-stage event counts of one cleaning run, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Relative path of the cleaned archive.
    pub archive: String,

    /// `(stage label, surviving event count)` per stage.
    pub counts: Vec<(String, usize)>,
}

impl CleaningReport {
    /// Number of events in the final output (the last stage's count).
    pub fn events_written(&self) -> usize {
        self.counts.last().map_or(0, |(_, count)| *count)
    }
}

/// Cleans one merged per-user archive into its canonical form.
///
/// The pipeline is strictly ordered: lazy read, all registered filters in
/// order, exact-duplicate removal, stable ordering by trigger time,
/// persist. Any I/O failure aborts the whole call; the writer creates a
/// fresh target so no partial output is ever committed over an input.
pub struct EventCleaner {
    store: Arc<dyn ArchiveStore>,
    filters: Vec<Box<dyn EventFilter>>,
}

impl EventCleaner {
    /// Create a cleaner with no filters registered.
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store, filters: Vec::new() }
    }

    /// Create a cleaner with the given ordered filter list.
    pub fn with_filters(store: Arc<dyn ArchiveStore>, filters: Vec<Box<dyn EventFilter>>) -> Self {
        let names: Vec<String> = filters.iter().map(|f| f.name()).collect();
        info!(filters = ?names, "registered cleaning filters");
        Self { store, filters }
    }

    /// Register an additional filter at the end of the list.
    pub fn add_filter(&mut self, filter: Box<dyn EventFilter>) {
        self.filters.push(filter);
    }

    /// Names of the registered filters, in application order.
    pub fn filter_names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Clean the merged archive at `rel` into the out area.
    pub fn clean(&self, rel: &str) -> Result<CleaningReport> {
        debug!(archive = rel, "reading merged archive");
        let mut source = self.store.open_merged(rel)?;

        // Stage 1+2: lazy read through the filter chain, counting each
        // stage individually.
        let mut read = 0usize;
        let mut after_filter = vec![0usize; self.filters.len()];
        let mut events: Vec<IdeEvent> = Vec::new();
        while let Some(event) = source.next_event()? {
            read += 1;
            let mut kept = true;
            for (stage, filter) in self.filters.iter().enumerate() {
                if !filter.keep(&event) {
                    kept = false;
                    break;
                }
                after_filter[stage] += 1;
            }
            if kept {
                events.push(event);
            }
        }

        let mut counts: Vec<(String, usize)> =
            vec![("before applying any filter".to_string(), read)];
        for (filter, survived) in self.filters.iter().zip(after_filter) {
            counts.push((format!("after applying '{}'", filter.name()), survived));
        }

        // Stage 3: exact-duplicate removal, first occurrence wins.
        let mut seen: HashSet<IdeEvent> = HashSet::with_capacity(events.len());
        events.retain(|event| seen.insert(event.clone()));
        counts.push(("after removing duplicates".to_string(), events.len()));

        // Stage 4: stable order by trigger time ascending.
        events.sort_by_key(|event| event.triggered_at);
        counts.push(("after ordering".to_string(), events.len()));

        // Stage 5: persist.
        debug!(archive = rel, events = events.len(), "writing cleaned archive");
        let mut sink = self.store.create_out(rel)?;
        for event in &events {
            sink.append(event)?;
        }
        sink.finish()?;

        let report = CleaningReport { archive: rel.to_string(), counts };
        info!(archive = rel, counts = ?report.counts, "finished cleaning");
        Ok(report)
    }
}
