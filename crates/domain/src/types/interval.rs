//! Activity intervals, per-day interval streams and derived statistics

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::event::to_delta;

/// A maximal time span during which one discriminator value holds.
///
/// Invariant: `end >= start`. Adjacent same-id intervals are merged by the
/// code that constructs them, never left split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval<Id> {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub id: Id,
}

impl<Id> Interval<Id> {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, id: Id) -> Self {
        debug_assert!(end >= start, "interval end must not precede start");
        Self { start, end, id }
    }

    /// Length of the interval. Zero-length intervals are legal.
    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Composite key for per-developer, per-day results.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeveloperDay {
    pub developer: String,
    pub date: NaiveDate,
}

impl DeveloperDay {
    pub fn new(developer: impl Into<String>, date: NaiveDate) -> Self {
        Self { developer: developer.into(), date }
    }
}

/// Ordered sequence of non-overlapping, time-increasing activity intervals
/// for one developer-day.
///
/// Running `start`/`end` bounds widen as intervals are appended: they are
/// the min/max over all appended intervals' own fields, independent of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalStream {
    intervals: Vec<Interval<Activity>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl IntervalStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stream from a day's window classification: each window
    /// becomes one span of `window_span`, consecutive equal activities are
    /// merged into a single interval.
    pub fn from_windows(
        day_start: DateTime<Utc>,
        window_span: Duration,
        activities: &[Activity],
    ) -> Self {
        let span = to_delta(window_span);
        let mut stream = Self::new();
        let mut cursor = day_start;
        for &activity in activities {
            let next = cursor + span;
            match stream.intervals.last_mut() {
                Some(last) if last.id == activity && last.end == cursor => {
                    last.end = next;
                    stream.end = Some(stream.end.map_or(next, |e| e.max(next)));
                }
                _ => stream.append(Interval::new(cursor, next, activity)),
            }
            cursor = next;
        }
        stream
    }

    /// Append an interval, widening the running bounds.
    pub fn append(&mut self, interval: Interval<Activity>) {
        self.start = Some(self.start.map_or(interval.start, |s| s.min(interval.start)));
        self.end = Some(self.end.map_or(interval.end, |e| e.max(interval.end)));
        self.intervals.push(interval);
    }

    pub fn intervals(&self) -> &[Interval<Activity>] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Width of the running bounds (`end - start`), zero when empty.
    pub fn duration(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).to_std().unwrap_or(Duration::ZERO),
            _ => Duration::ZERO,
        }
    }

    /// Partition the ordered intervals into maximal contiguous runs that
    /// fall within the same logical day: a 24h window beginning at
    /// `midnight + day_start_offset`. Each returned stream is an
    /// independent copy; intervals themselves are not cut.
    pub fn split_by_day(&self, day_start_offset: Duration) -> Vec<IntervalStream> {
        let offset = to_delta(day_start_offset);
        let mut streams: Vec<IntervalStream> = Vec::new();
        let mut current_day: Option<NaiveDate> = None;

        for interval in &self.intervals {
            let logical_day = (interval.start - offset).date_naive();
            if current_day != Some(logical_day) {
                streams.push(IntervalStream::new());
                current_day = Some(logical_day);
            }
            if let Some(stream) = streams.last_mut() {
                stream.append(interval.clone());
            }
        }

        streams
    }

    /// Aggregate the stream into per-activity duration buckets.
    ///
    /// Walks maximal runs of identical activity. Runs tagged `Inactive`
    /// are special-cased:
    /// - run no longer than `short_merge_threshold`: its duration is
    ///   credited to the preceding run's bucket (no inactivity counted);
    ///   with no preceding run the duration stays `Inactive`;
    /// - run longer than `long_threshold`: counted as one long inactivity
    ///   and bucketed `InactiveLong`;
    /// - otherwise: counted as one inactivity and bucketed `Inactive`.
    ///
    /// Every other run credits its full duration to its own bucket.
    pub fn evaluate(&self, short_merge_threshold: Duration, long_threshold: Duration) -> Statistic {
        let mut runs: Vec<(Activity, Duration)> = Vec::new();
        for interval in &self.intervals {
            match runs.last_mut() {
                Some((activity, total)) if *activity == interval.id => {
                    *total += interval.duration();
                }
                _ => runs.push((interval.id, interval.duration())),
            }
        }

        let mut statistic = Statistic::default();
        for i in 0..runs.len() {
            let (activity, run_duration) = runs[i];
            if activity == Activity::Inactive {
                if run_duration <= short_merge_threshold {
                    match i.checked_sub(1).map(|p| runs[p].0) {
                        Some(preceding) => statistic.add(preceding, run_duration),
                        None => statistic.add(Activity::Inactive, run_duration),
                    }
                } else if run_duration > long_threshold {
                    statistic.add(Activity::InactiveLong, run_duration);
                    statistic.long_inactivity_periods += 1;
                } else {
                    statistic.add(Activity::Inactive, run_duration);
                    statistic.inactivity_periods += 1;
                }
            } else {
                statistic.add(activity, run_duration);
            }
        }
        statistic
    }
}

/// Per-activity duration buckets plus inactivity counters for one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    pub durations: BTreeMap<Activity, Duration>,
    pub inactivity_periods: usize,
    pub long_inactivity_periods: usize,
}

impl Statistic {
    fn add(&mut self, activity: Activity, duration: Duration) {
        *self.durations.entry(activity).or_default() += duration;
    }

    /// Bucket total for one activity, zero when absent.
    pub fn duration_of(&self, activity: Activity) -> Duration {
        self.durations.get(&activity).copied().unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().expect("valid timestamp")
    }

    fn interval(start: i64, end: i64, id: Activity) -> Interval<Activity> {
        Interval::new(at(start), at(end), id)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn bounds_widen_independent_of_insertion_order() {
        let mut stream = IntervalStream::new();
        stream.append(interval(10, 12, Activity::Development));
        stream.append(interval(0, 2, Activity::Navigation));

        assert_eq!(stream.start(), Some(at(0)));
        assert_eq!(stream.end(), Some(at(12)));
        assert_eq!(stream.duration(), secs(12));
    }

    #[test]
    fn empty_stream_has_zero_duration() {
        let stream = IntervalStream::new();
        assert_eq!(stream.duration(), Duration::ZERO);
        assert!(stream.is_empty());
    }

    #[test]
    fn from_windows_merges_consecutive_equal_activities() {
        let stream = IntervalStream::from_windows(
            at(0),
            secs(2),
            &[Activity::Development, Activity::Development, Activity::Navigation],
        );

        assert_eq!(
            stream.intervals(),
            &[
                interval(0, 4, Activity::Development),
                interval(4, 6, Activity::Navigation),
            ]
        );
    }

    #[test]
    fn evaluate_short_inactivity_merges_into_preceding_run() {
        // AC: [Development, Inactive, Navigation] windows of 2s with
        // evaluate(2s, 2s) count no inactivity at all.
        let stream = IntervalStream::from_windows(
            at(0),
            secs(2),
            &[Activity::Development, Activity::Inactive, Activity::Navigation],
        );
        let statistic = stream.evaluate(secs(2), secs(2));

        assert_eq!(statistic.duration_of(Activity::Inactive), Duration::ZERO);
        assert_eq!(statistic.inactivity_periods, 0);
        assert_eq!(statistic.duration_of(Activity::Development), secs(4));
        assert_eq!(statistic.duration_of(Activity::Navigation), secs(2));
    }

    #[test]
    fn evaluate_counts_medium_inactivity_period() {
        let stream = IntervalStream::from_windows(
            at(0),
            secs(2),
            &[
                Activity::Development,
                Activity::Inactive,
                Activity::Inactive,
                Activity::Navigation,
            ],
        );
        let statistic = stream.evaluate(secs(2), secs(10));

        assert_eq!(statistic.duration_of(Activity::Inactive), secs(4));
        assert_eq!(statistic.inactivity_periods, 1);
        assert_eq!(statistic.long_inactivity_periods, 0);
    }

    #[test]
    fn evaluate_counts_long_inactivity_beyond_threshold() {
        let mut stream = IntervalStream::new();
        stream.append(interval(0, 2, Activity::Development));
        stream.append(interval(2, 62, Activity::Inactive));
        stream.append(interval(62, 64, Activity::Navigation));

        let statistic = stream.evaluate(secs(5), secs(30));
        assert_eq!(statistic.duration_of(Activity::InactiveLong), secs(60));
        assert_eq!(statistic.long_inactivity_periods, 1);
        assert_eq!(statistic.inactivity_periods, 0);
    }

    #[test]
    fn evaluate_leading_inactivity_stays_inactive() {
        let mut stream = IntervalStream::new();
        stream.append(interval(0, 1, Activity::Inactive));
        stream.append(interval(1, 3, Activity::Development));

        let statistic = stream.evaluate(secs(5), secs(30));
        assert_eq!(statistic.duration_of(Activity::Inactive), secs(1));
        assert_eq!(statistic.duration_of(Activity::Development), secs(2));
    }

    #[test]
    fn split_by_day_cuts_at_offset_adjusted_boundary() {
        // AC: a stream spanning 23:59:50 to 01:00:02 splits at the
        // offset-adjusted boundary, not raw midnight.
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date");
        let start = |h: u32, m: u32, s: u32| {
            Utc.from_utc_datetime(&day.and_hms_opt(h, m, s).expect("valid time"))
        };

        let mut stream = IntervalStream::new();
        stream.append(Interval::new(
            start(23, 59, 50),
            start(23, 59, 55),
            Activity::Development,
        ));
        let next = day.succ_opt().expect("next day");
        let late = |h: u32, m: u32, s: u32| {
            Utc.from_utc_datetime(&next.and_hms_opt(h, m, s).expect("valid time"))
        };
        stream.append(Interval::new(late(0, 30, 0), late(0, 40, 0), Activity::Navigation));
        stream.append(Interval::new(late(3, 0, 0), late(3, 0, 2), Activity::Testing));

        // With no offset, the raw midnight boundary splits off the first
        // interval.
        let by_midnight = stream.split_by_day(Duration::ZERO);
        assert_eq!(by_midnight.len(), 2);
        assert_eq!(by_midnight[0].len(), 1);
        assert_eq!(by_midnight[1].len(), 2);

        // A 2h offset moves the boundary to 02:00: the 00:30 interval now
        // belongs to the previous logical day, 03:00 starts the next one.
        let by_offset = stream.split_by_day(secs(2 * 3600));
        assert_eq!(by_offset.len(), 2);
        assert_eq!(by_offset[0].len(), 2);
        assert_eq!(by_offset[1].len(), 1);
        assert_eq!(by_offset[1].intervals()[0].id, Activity::Testing);
    }

    #[test]
    fn split_by_day_returns_independent_copies() {
        let mut stream = IntervalStream::new();
        stream.append(interval(0, 5, Activity::Development));

        let days = stream.split_by_day(Duration::ZERO);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].intervals(), stream.intervals());
        assert_eq!(days[0].start(), stream.start());
        assert_eq!(days[0].end(), stream.end());
    }
}
