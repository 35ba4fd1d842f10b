//! Event validity filters applied by the cleaning stage
//!
//! Each filter is a pure predicate plus a display name; the cleaner has no
//! compile-time knowledge of filter logic beyond the trait.

use timelens_domain::{CleaningConfig, EventPayload, IdeEvent};

/// A domain predicate over event validity. Events are kept iff every
/// registered filter returns `true`.
pub trait EventFilter: Send + Sync {
    /// Display name, used in per-stage diagnostics.
    fn name(&self) -> String;

    fn keep(&self, event: &IdeEvent) -> bool;
}

/// The standard filter list for raw feedback archives, in application
/// order.
pub fn default_filters(config: &CleaningConfig) -> Vec<Box<dyn EventFilter>> {
    let mut filters: Vec<Box<dyn EventFilter>> = Vec::new();
    if let Some(min) = config.min_tool_version.as_deref() {
        filters.push(Box::new(VersionFilter::new(min)));
    }
    filters.push(Box::new(ErrorAndInfoFilter));
    filters.push(Box::new(SessionIdFilter));
    filters.push(Box::new(TriggerTimeFilter));
    filters.push(Box::new(BrokenCompletionFilter));
    filters
}

/// Drops events recorded by tooling older than a minimum version.
/// Events without a version are dropped as well.
pub struct VersionFilter {
    minimum: Vec<u64>,
    display: String,
}

impl VersionFilter {
    pub fn new(minimum: &str) -> Self {
        Self { minimum: parse_version(minimum), display: minimum.to_string() }
    }
}

impl EventFilter for VersionFilter {
    fn name(&self) -> String {
        format!("version filter: >= {}", self.display)
    }

    fn keep(&self, event: &IdeEvent) -> bool {
        event
            .tool_version
            .as_deref()
            .map(parse_version)
            .is_some_and(|version| version >= self.minimum)
    }
}

/// Numeric segments of a dotted version string; non-digit suffixes within
/// a segment (e.g. "1011-Default") are ignored.
fn parse_version(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|segment| {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

/// Drops error reports and informational notices; they carry no usage
/// information.
pub struct ErrorAndInfoFilter;

impl EventFilter for ErrorAndInfoFilter {
    fn name(&self) -> String {
        "error and info filter".to_string()
    }

    fn keep(&self, event: &IdeEvent) -> bool {
        !matches!(event.payload, EventPayload::Error { .. } | EventPayload::Info { .. })
    }
}

/// Requires a non-empty session id.
pub struct SessionIdFilter;

impl EventFilter for SessionIdFilter {
    fn name(&self) -> String {
        "session id filter".to_string()
    }

    fn keep(&self, event: &IdeEvent) -> bool {
        !event.session_id.trim().is_empty()
    }
}

/// Requires a trigger timestamp.
pub struct TriggerTimeFilter;

impl EventFilter for TriggerTimeFilter {
    fn name(&self) -> String {
        "trigger time filter".to_string()
    }

    fn keep(&self, event: &IdeEvent) -> bool {
        event.triggered_at.is_some()
    }
}

/// Rejects structurally broken completion events: a completion episode
/// that never terminated.
pub struct BrokenCompletionFilter;

impl EventFilter for BrokenCompletionFilter {
    fn name(&self) -> String {
        "broken completion filter".to_string()
    }

    fn keep(&self, event: &IdeEvent) -> bool {
        match event.payload {
            EventPayload::Completion { .. } => event.terminated_at.is_some(),
            _ => true,
        }
    }
}
