//! Fixed-span window computation over a developer's event stream

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use timelens_domain::{to_delta, Activity, ActivityConfig, ActivityEvent};

use crate::activities::merger::ActivityMerger;

/// One fixed-length classification bucket. Append-only while it is the
/// current window, discarded after the merge strategy resolves it.
#[derive(Debug, Clone)]
pub struct Window {
    start: DateTime<Utc>,
    span: Duration,
    events: Vec<ActivityEvent>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, span: Duration) -> Self {
        Self { start, span, events: Vec::new() }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + to_delta(self.span)
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn add(&mut self, event: ActivityEvent) {
        self.events.push(event);
    }

    fn ends_before_start_of(&self, event: &ActivityEvent) -> bool {
        self.end() <= event.triggered_at
    }

    fn ends_before_end_of(&self, event: &ActivityEvent) -> bool {
        self.end() < event.end()
    }

    fn is_on_same_day_as(&self, event: &ActivityEvent) -> bool {
        self.start.date_naive() == event.triggered_at.date_naive()
    }
}

/// Split an event at a window boundary: the head keeps the original
/// trigger time, the tail starts at the boundary and carries the rest of
/// the duration.
fn split_at(event: &ActivityEvent, boundary: DateTime<Utc>) -> (ActivityEvent, ActivityEvent) {
    let head = ActivityEvent {
        activity: event.activity,
        triggered_at: event.triggered_at,
        duration: (boundary - event.triggered_at).to_std().unwrap_or(Duration::ZERO),
    };
    let tail = ActivityEvent {
        activity: event.activity,
        triggered_at: boundary,
        duration: (event.end() - boundary).to_std().unwrap_or(Duration::ZERO),
    };
    (head, tail)
}

/// Buckets one developer's activity events into fixed-span windows and
/// resolves each window through the stateful merge strategy.
///
/// Windows advance from the first event's trigger time. Events spanning a
/// window boundary are split there (the tail is re-queued). Empty windows
/// are emitted only within the same calendar day; at a day change the
/// strategy is reset and the window realigns to the next event.
pub struct WindowClassifier {
    span: Duration,
    merger: ActivityMerger,
    queue: VecDeque<ActivityEvent>,
    current: Option<Window>,
    days: BTreeMap<NaiveDate, Vec<Activity>>,
}

impl WindowClassifier {
    pub fn new(config: &ActivityConfig) -> Self {
        Self {
            span: config.window_span(),
            merger: ActivityMerger::new(config.zero_duration_floor()),
            queue: VecDeque::new(),
            current: None,
            days: BTreeMap::new(),
        }
    }

    /// Feed the next event of the stream (trigger-time order).
    pub fn on_event(&mut self, event: ActivityEvent) {
        // Split tails queued earlier must be processed first when they
        // precede the incoming event.
        while let Some(queued) = self
            .queue
            .front()
            .filter(|queued| queued.triggered_at < event.triggered_at)
            .cloned()
        {
            self.queue.pop_front();
            self.handle(queued);
        }
        self.handle(event);
    }

    /// Flush the queue and the current window, returning the per-day
    /// window classifications. The classifier is ready for the next
    /// stream afterwards.
    pub fn on_stream_end(&mut self) -> BTreeMap<NaiveDate, Vec<Activity>> {
        while let Some(queued) = self.queue.pop_front() {
            self.handle(queued);
        }
        if let Some(window) = self.current.take() {
            self.append_merged(&window);
        }
        self.merger.reset();
        std::mem::take(&mut self.days)
    }

    fn handle(&mut self, event: ActivityEvent) {
        if self.current.is_none() {
            self.current = Some(Window::new(event.triggered_at, self.span));
        }

        while self.current.as_ref().is_some_and(|w| w.ends_before_start_of(&event)) {
            self.advance(&event);
        }

        let Some(window) = self.current.as_mut() else { return };
        if window.ends_before_end_of(&event) {
            let boundary = window.end();
            let (head, tail) = split_at(&event, boundary);
            window.add(head);
            self.queue.push_back(tail);
        } else {
            window.add(event);
        }
    }

    /// Close the current window and open the next one relative to the
    /// upcoming event.
    fn advance(&mut self, upcoming: &ActivityEvent) {
        let Some(window) = self.current.take() else { return };
        let same_day = window.is_on_same_day_as(upcoming);

        if !window.is_empty() || same_day {
            self.append_merged(&window);
        }

        self.current = Some(if same_day {
            Window::new(window.end(), self.span)
        } else {
            self.merger.reset();
            Window::new(upcoming.triggered_at, self.span)
        });
    }

    fn append_merged(&mut self, window: &Window) {
        let activity = self.merger.merge(window);
        self.days.entry(window.start().date_naive()).or_default().push(activity);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().expect("valid timestamp")
    }

    fn event(activity: Activity, offset_secs: i64) -> ActivityEvent {
        ActivityEvent { activity, triggered_at: at(offset_secs), duration: Duration::ZERO }
    }

    fn long_event(activity: Activity, offset_secs: i64, duration_secs: u64) -> ActivityEvent {
        ActivityEvent {
            activity,
            triggered_at: at(offset_secs),
            duration: Duration::from_secs(duration_secs),
        }
    }

    fn classifier() -> WindowClassifier {
        WindowClassifier::new(&ActivityConfig::default()) // 1s windows
    }

    fn single_day(days: BTreeMap<NaiveDate, Vec<Activity>>) -> Vec<Activity> {
        assert_eq!(days.len(), 1, "expected one day, got {days:?}");
        days.into_values().next().unwrap_or_default()
    }

    #[test]
    fn window_ends_on_first_event_after_its_end() {
        let mut classifier = classifier();
        classifier.on_event(event(Activity::Development, 0));
        classifier.on_event(event(Activity::Navigation, 1));

        let activities = single_day(classifier.on_stream_end());
        assert_eq!(activities, vec![Activity::Development, Activity::Navigation]);
    }

    #[test]
    fn stream_end_flushes_the_open_window() {
        let mut classifier = classifier();
        classifier.on_event(event(Activity::Development, 0));

        let activities = single_day(classifier.on_stream_end());
        assert_eq!(activities, vec![Activity::Development]);
    }

    #[test]
    fn empty_windows_are_emitted_within_a_day() {
        let mut classifier = classifier();
        classifier.on_event(event(Activity::Development, 0));
        classifier.on_event(event(Activity::Navigation, 2));

        let activities = single_day(classifier.on_stream_end());
        assert_eq!(
            activities,
            vec![Activity::Development, Activity::Inactive, Activity::Navigation]
        );
    }

    #[test]
    fn events_spanning_a_boundary_are_split() {
        let mut classifier = classifier();
        classifier.on_event(long_event(Activity::Development, 0, 2));
        classifier.on_event(event(Activity::Navigation, 3));

        let activities = single_day(classifier.on_stream_end());
        // The split halves dominate their own windows; the gap window at
        // second 2..3 is empty.
        assert_eq!(
            activities,
            vec![
                Activity::Development,
                Activity::Development,
                Activity::Inactive,
                Activity::Navigation
            ]
        );
    }

    #[test]
    fn day_change_resets_and_realigns() {
        let mut classifier = classifier();
        classifier.on_event(event(Activity::Development, 0));
        // Far enough to land on the next calendar day.
        classifier.on_event(event(Activity::Navigation, 90_000));

        let days = classifier.on_stream_end();
        assert_eq!(days.len(), 2);
        let per_day: Vec<Vec<Activity>> = days.into_values().collect();
        assert_eq!(per_day[0], vec![Activity::Development]);
        // No empty windows bridge the day gap.
        assert_eq!(per_day[1], vec![Activity::Navigation]);
    }

    #[test]
    fn sentinel_windows_carry_the_previous_resolution_across() {
        let mut classifier = classifier();
        classifier.on_event(event(Activity::Development, 0));
        classifier.on_event(event(Activity::Any, 1));

        let activities = single_day(classifier.on_stream_end());
        assert_eq!(activities, vec![Activity::Development, Activity::Development]);
    }
}
