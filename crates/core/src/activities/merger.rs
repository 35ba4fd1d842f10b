//! Stateful merge strategy resolving one window to one activity

use std::collections::HashMap;
use std::time::Duration;

use timelens_domain::Activity;

use crate::activities::window::Window;

/// Resolves each window to a single dominant activity.
///
/// A tiny explicit state machine: `last_resolved` carries the previous
/// concrete resolution forward through sentinel-only windows, and
/// `outside_ide` remembers whether the developer last left the IDE, which
/// decides how empty windows read (`Away` vs `Inactive`). Both are cleared
/// by [`ActivityMerger::reset`].
pub struct ActivityMerger {
    zero_duration_floor: Duration,
    last_resolved: Option<Activity>,
    outside_ide: bool,
}

impl ActivityMerger {
    pub fn new(zero_duration_floor: Duration) -> Self {
        Self { zero_duration_floor, last_resolved: None, outside_ide: false }
    }

    /// Clear the carried state (start of a new stream or day).
    pub fn reset(&mut self) {
        self.last_resolved = None;
        self.outside_ide = false;
    }

    /// Resolve one window.
    pub fn merge(&mut self, window: &Window) -> Activity {
        if window.is_empty() {
            return if self.outside_ide { Activity::Away } else { Activity::Inactive };
        }

        let has_concrete = window.events().iter().any(|event| !event.activity.is_sentinel());
        if !has_concrete {
            // Sentinel-only window: update presence, then carry the last
            // concrete resolution forward (falling back to Other).
            let left_ide =
                window.events().iter().any(|event| event.activity == Activity::LeaveIDE);
            self.outside_ide = left_ide;

            return match self.last_resolved {
                None | Some(Activity::Inactive) | Some(Activity::Away) => Activity::Other,
                Some(activity) => activity,
            };
        }

        let dominant = self.dominant_activity(window);
        self.last_resolved = Some(dominant);
        self.outside_ide = false;
        dominant
    }

    /// Dominant activity by weighted duration. Sentinel events contribute
    /// nothing; zero/unset durations weigh the configured floor. Ties go
    /// to the activity of the later-occurring event.
    fn dominant_activity(&self, window: &Window) -> Activity {
        let mut weights: HashMap<Activity, (Duration, usize)> = HashMap::new();
        for (index, event) in window.events().iter().enumerate() {
            if event.activity.is_sentinel() {
                continue;
            }
            let weight = if event.duration.is_zero() {
                self.zero_duration_floor
            } else {
                event.duration
            };
            let entry = weights.entry(event.activity).or_insert((Duration::ZERO, index));
            entry.0 += weight;
            entry.1 = index;
        }

        weights
            .into_iter()
            .max_by_key(|&(_, (weight, last_index))| (weight, last_index))
            .map(|(activity, _)| activity)
            .unwrap_or(Activity::Other)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use timelens_domain::ActivityEvent;

    use super::*;

    const FLOOR: Duration = Duration::from_millis(500);

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + millis).single().expect("valid timestamp")
    }

    fn window_of(events: &[(Activity, u64)]) -> Window {
        let mut window = Window::new(at(0), Duration::from_secs(1));
        for (index, &(activity, duration_ms)) in events.iter().enumerate() {
            window.add(ActivityEvent {
                activity,
                triggered_at: at(index as i64 * 10),
                duration: Duration::from_millis(duration_ms),
            });
        }
        window
    }

    fn merger() -> ActivityMerger {
        ActivityMerger::new(FLOOR)
    }

    #[test]
    fn empty_window_is_inactive_inside_the_ide() {
        let mut merger = merger();
        assert_eq!(merger.merge(&window_of(&[])), Activity::Inactive);
    }

    #[test]
    fn empty_window_is_away_after_leaving_the_ide() {
        let mut merger = merger();
        merger.merge(&window_of(&[(Activity::LeaveIDE, 0)]));
        assert_eq!(merger.merge(&window_of(&[])), Activity::Away);
    }

    #[test]
    fn entering_the_ide_clears_the_outside_flag() {
        let mut merger = merger();
        merger.merge(&window_of(&[(Activity::LeaveIDE, 0)]));
        merger.merge(&window_of(&[(Activity::EnterIDE, 0)]));
        assert_eq!(merger.merge(&window_of(&[])), Activity::Inactive);
    }

    #[test]
    fn sentinel_window_without_history_resolves_to_other() {
        // AC: merge(Window(Any)) after reset() returns Other.
        let mut merger = merger();
        assert_eq!(merger.merge(&window_of(&[(Activity::Any, 0)])), Activity::Other);

        merger.reset();
        assert_eq!(merger.merge(&window_of(&[(Activity::Any, 0)])), Activity::Other);
    }

    #[test]
    fn sentinel_window_carries_the_last_resolution_forward() {
        // AC: merge(Window(Development)) then merge(Window(Any)) returns
        // Development.
        let mut merger = merger();
        assert_eq!(merger.merge(&window_of(&[(Activity::Development, 0)])), Activity::Development);
        assert_eq!(merger.merge(&window_of(&[(Activity::Any, 0)])), Activity::Development);
    }

    #[test]
    fn sentinel_window_after_inactivity_resolves_to_other() {
        let mut merger = merger();
        merger.merge(&window_of(&[]));
        assert_eq!(merger.merge(&window_of(&[(Activity::Any, 0)])), Activity::Other);
    }

    #[test]
    fn ties_break_toward_the_later_event() {
        // AC: equal (zero) durations resolve to the later activity.
        let mut merger = merger();
        let window = window_of(&[(Activity::Development, 0), (Activity::Navigation, 0)]);
        assert_eq!(merger.merge(&window), Activity::Navigation);
    }

    #[test]
    fn dominant_activity_wins_by_total_duration() {
        let mut merger = merger();
        let window = window_of(&[
            (Activity::Development, 100),
            (Activity::Navigation, 300),
            (Activity::Development, 100),
        ]);
        assert_eq!(merger.merge(&window), Activity::Navigation);
    }

    #[test]
    fn several_floor_weighted_events_outweigh_one_short_event() {
        // The floor makes three zero-duration navigation events beat one
        // 200ms development event.
        let mut merger = merger();
        let window = window_of(&[
            (Activity::Development, 200),
            (Activity::Navigation, 0),
            (Activity::Navigation, 0),
            (Activity::Navigation, 0),
        ]);
        assert_eq!(merger.merge(&window), Activity::Navigation);
    }

    #[test]
    fn sentinel_events_carry_no_weight() {
        let mut merger = merger();
        let window = window_of(&[
            (Activity::Any, 5_000),
            (Activity::Development, 100),
            (Activity::Any, 5_000),
        ]);
        assert_eq!(merger.merge(&window), Activity::Development);
    }

    #[test]
    fn concrete_window_clears_the_outside_flag() {
        let mut merger = merger();
        merger.merge(&window_of(&[(Activity::LeaveIDE, 0)]));
        merger.merge(&window_of(&[(Activity::Development, 100)]));
        assert_eq!(merger.merge(&window_of(&[])), Activity::Inactive);
    }
}
