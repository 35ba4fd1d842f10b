//! Interval construction from resolved activity event streams

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use timelens_domain::{to_delta, Activity, ActivityEvent, Interval};

/// Converts a per-developer stream of resolved activity events into merged
/// `[start, end)` activity intervals.
///
/// Construction rules:
/// - consecutive events of the same resolved activity merge into one
///   interval whose end is the running max of the previous end and the
///   event's own end;
/// - `LeaveIDE` opens (or relabels into) an `Away` interval that stays
///   open until the next event arrives, whatever gap that implies;
/// - `EnterIDE` first closes any gap since the previous interval with an
///   `Away` interval, then contributes a normal `Other` interval for its
///   own span;
/// - `Any` resolves to `Other` and otherwise only keeps the open interval
///   alive.
pub struct IntervalBuilder {
    streams: BTreeMap<String, Vec<Interval<Activity>>>,
    current_developer: Option<String>,
}

/// The interval discriminator an event resolves to.
fn resolve_id(event: &ActivityEvent) -> Activity {
    match event.activity {
        Activity::LeaveIDE => Activity::Away,
        Activity::EnterIDE | Activity::Any => Activity::Other,
        activity => activity,
    }
}

impl IntervalBuilder {
    pub fn new() -> Self {
        Self { streams: BTreeMap::new(), current_developer: None }
    }

    /// Begin a developer's stream. Any previous stream is left as built.
    pub fn on_stream_start(&mut self, developer: &str) {
        self.current_developer = Some(developer.to_string());
        self.streams.entry(developer.to_string()).or_default();
    }

    /// Feed the next event (trigger-time order).
    pub fn on_event(&mut self, event: &ActivityEvent) {
        let Some(developer) = self.current_developer.clone() else {
            debug_assert!(false, "on_event before on_stream_start");
            return;
        };
        let intervals = self.streams.entry(developer).or_default();

        let id = resolve_id(event);
        let event_end = event.end();

        let Some(last) = intervals.last() else {
            intervals.push(Interval { start: event.triggered_at, end: event_end, id });
            return;
        };
        let (mut last_id, last_start, mut last_end) = (last.id, last.start, last.end);

        // EnterIDE closes the gap since the previous interval with Away;
        // a no-op when an Away interval is already open.
        if event.activity == Activity::EnterIDE
            && last_id != Activity::Away
            && event.triggered_at > last_end
        {
            intervals.push(Interval {
                start: last_end,
                end: event.triggered_at,
                id: Activity::Away,
            });
            last_id = Activity::Away;
            last_end = event.triggered_at;
        }

        // An event starting exactly with a freshly-opened Other interval
        // relabels it instead of opening a concurrent one.
        if last_id == Activity::Other && last_start == event.triggered_at {
            if let Some(last) = intervals.last_mut() {
                last.id = id;
                last.end = event_end;
                last_id = id;
                last_end = event_end;
            }
        }

        let requires_new = last_id != id && event.activity != Activity::Any;
        if requires_new {
            let new_start = event.triggered_at;
            // Away stays open until the next event; overlapping ends are
            // trimmed to the new start.
            if last_id == Activity::Away || last_end > new_start {
                if let Some(last) = intervals.last_mut() {
                    if last.end > new_start {
                        let trimmed = last.end - new_start;
                        if trimmed > to_delta(Duration::from_secs(1)) {
                            debug!(trimmed_ms = trimmed.num_milliseconds(), "trimming overlapping interval end");
                        }
                    }
                    last.end = new_start;
                }
            }
            intervals.push(Interval { start: new_start, end: event_end, id });
        } else if event_end > last_end {
            if let Some(last) = intervals.last_mut() {
                last.end = event_end;
            }
        }
    }

    /// End the current developer's stream. The built intervals are
    /// immutable afterwards, except for the explicit gap-correction pass.
    pub fn on_stream_end(&mut self) {
        self.current_developer = None;
    }

    /// The uncorrected intervals per developer.
    pub fn intervals(&self) -> &BTreeMap<String, Vec<Interval<Activity>>> {
        &self.streams
    }

    /// Post-hoc gap correction over the built interval lists (the built
    /// state itself is left untouched). See [`correct_gaps`].
    pub fn correct_gaps_with_timeout(
        &self,
        short_timeout: Duration,
        long_threshold: Duration,
    ) -> BTreeMap<String, Vec<Interval<Activity>>> {
        self.streams
            .iter()
            .map(|(developer, intervals)| {
                (developer.clone(), correct_gaps(intervals, short_timeout, long_threshold))
            })
            .collect()
    }
}

/// Gap-correct one ordered interval list.
///
/// For every gap between adjacent intervals: extend the previous end
/// forward by `min(gap, short_timeout)`; a positive remainder becomes
/// exactly one filler interval, `InactiveLong` iff the remainder exceeds
/// `long_threshold`, else `Inactive`. Equal-id neighbours that become
/// adjacent are merged so the stream invariant holds.
pub fn correct_gaps(
    intervals: &[Interval<Activity>],
    short_timeout: Duration,
    long_threshold: Duration,
) -> Vec<Interval<Activity>> {
    let short = to_delta(short_timeout);
    let long = to_delta(long_threshold);

    let mut corrected: Vec<Interval<Activity>> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        let interval = interval.clone();
        if let Some(prev) = corrected.last_mut() {
            if interval.start > prev.end {
                let gap = interval.start - prev.end;
                prev.end += gap.min(short);
                if interval.start > prev.end {
                    let remainder = interval.start - prev.end;
                    let id = if remainder > long {
                        Activity::InactiveLong
                    } else {
                        Activity::Inactive
                    };
                    corrected.push(Interval { start: prev.end, end: interval.start, id });
                }
            }
        }
        match corrected.last_mut() {
            Some(prev) if prev.id == interval.id && prev.end >= interval.start => {
                prev.end = prev.end.max(interval.end);
            }
            Some(prev) => {
                if prev.end > interval.start {
                    prev.end = interval.start;
                }
                corrected.push(interval);
            }
            None => corrected.push(interval),
        }
    }
    corrected
}

impl Default for IntervalBuilder {
    fn default() -> Self {
        Self::new()
    }
}
