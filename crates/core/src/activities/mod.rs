//! Activity derivation engine
//!
//! Consumes clean per-user event logs and derives per-developer, per-day
//! activity timelines: fixed-window classification, interval construction
//! with gap correction, and per-day statistics.

pub mod intervals;
pub mod merger;
pub mod report;
pub mod window;

use std::collections::BTreeMap;

use timelens_domain::{ActivityConfig, ActivityEvent, DeveloperDay, IntervalStream, Statistic};

use crate::activities::intervals::IntervalBuilder;

/// Facade over the interval path of the engine: raw activity-tagged events
/// in, gap-corrected per-developer-day interval streams out.
pub struct ActivityEngine {
    config: ActivityConfig,
}

impl ActivityEngine {
    pub fn new(config: ActivityConfig) -> Self {
        Self { config }
    }

    /// Derive per-day interval streams for a set of developers.
    ///
    /// Each developer's events must be in trigger-time order (the cleaning
    /// stage guarantees this for pipeline output).
    pub fn derive_timelines(
        &self,
        events_by_developer: &BTreeMap<String, Vec<ActivityEvent>>,
    ) -> BTreeMap<DeveloperDay, IntervalStream> {
        let mut builder = IntervalBuilder::new();
        for (developer, events) in events_by_developer {
            builder.on_stream_start(developer);
            for event in events {
                builder.on_event(event);
            }
            builder.on_stream_end();
        }

        let corrected = builder
            .correct_gaps_with_timeout(self.config.short_timeout(), self.config.long_threshold());

        let mut timelines = BTreeMap::new();
        for (developer, intervals) in corrected {
            let mut stream = IntervalStream::new();
            for interval in intervals {
                stream.append(interval);
            }
            for day_stream in stream.split_by_day(self.config.day_start_offset()) {
                let Some(start) = day_stream.start() else { continue };
                let offset = timelens_domain::to_delta(self.config.day_start_offset());
                let day = DeveloperDay::new(developer.clone(), (start - offset).date_naive());
                timelines.insert(day, day_stream);
            }
        }
        timelines
    }

    /// Evaluate each per-day stream into activity duration buckets.
    pub fn evaluate(
        &self,
        timelines: &BTreeMap<DeveloperDay, IntervalStream>,
    ) -> BTreeMap<DeveloperDay, Statistic> {
        timelines
            .iter()
            .map(|(day, stream)| {
                (
                    day.clone(),
                    stream.evaluate(self.config.short_timeout(), self.config.long_threshold()),
                )
            })
            .collect()
    }
}
