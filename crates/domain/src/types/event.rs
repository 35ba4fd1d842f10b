//! Raw IDE events and the resolved activity events derived from them

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::activity::Activity;

/// One timestamped IDE-usage event as recorded by a client installation.
///
/// Events are immutable once read; structural equality (including all
/// payload fields) drives duplicate removal in the cleaning stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdeEvent {
    /// Id of the IDE session that produced the event. May be empty for
    /// broken records; the cleaning stage filters those out.
    pub session_id: String,

    /// Id of the user profile, when the client had one configured.
    pub profile_id: Option<String>,

    /// Version of the tooling that recorded the event (dotted numeric
    /// segments, e.g. "0.1011").
    pub tool_version: Option<String>,

    /// When the event was triggered. Absent on broken records.
    pub triggered_at: Option<DateTime<Utc>>,

    /// When the event terminated, for events with a lifetime.
    pub terminated_at: Option<DateTime<Utc>>,

    /// Active duration of the event.
    pub duration: Option<Duration>,

    /// Kind-specific payload.
    pub payload: EventPayload,
}

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// An event already tagged with a resolved activity.
    Activity { activity: Activity },
    /// A command invocation.
    Command { command_id: String },
    /// A code-completion episode.
    Completion { proposal_count: u32, cancelled: bool },
    /// An error report from the client.
    Error { stack_trace: String },
    /// An informational notice from the client.
    Info { message: String },
}

impl IdeEvent {
    /// The activity tag carried by the payload, if any.
    pub fn activity(&self) -> Option<Activity> {
        match self.payload {
            EventPayload::Activity { activity } => Some(activity),
            _ => None,
        }
    }

    /// Resolved form for the activity engine: requires an activity payload
    /// and a trigger timestamp, everything else has no activity meaning.
    pub fn to_activity_event(&self) -> Option<ActivityEvent> {
        let activity = self.activity()?;
        let triggered_at = self.triggered_at?;
        Some(ActivityEvent {
            activity,
            triggered_at,
            duration: self.duration.unwrap_or(Duration::ZERO),
        })
    }
}

/// A resolved, activity-tagged event consumed by the derivation engine.
///
/// Unlike [`IdeEvent`] all fields are mandatory: records missing a trigger
/// time never survive the cleaning stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub activity: Activity,
    pub triggered_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ActivityEvent {
    /// End of the event's own span (`triggered_at + duration`).
    pub fn end(&self) -> DateTime<Utc> {
        self.triggered_at + to_delta(self.duration)
    }
}

/// Convert a `std::time::Duration` into a chrono delta, saturating on
/// overflow.
pub fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn activity_event_end_adds_duration() {
        let event = ActivityEvent {
            activity: Activity::Development,
            triggered_at: at(0),
            duration: Duration::from_secs(3),
        };
        assert_eq!(event.end(), at(3));
    }

    #[test]
    fn resolved_event_requires_activity_payload_and_trigger_time() {
        let event = IdeEvent {
            session_id: "s1".into(),
            profile_id: None,
            tool_version: None,
            triggered_at: Some(at(0)),
            terminated_at: None,
            duration: None,
            payload: EventPayload::Command { command_id: "Edit.Paste".into() },
        };
        assert!(event.to_activity_event().is_none());

        let tagged = IdeEvent {
            payload: EventPayload::Activity { activity: Activity::Navigation },
            ..event.clone()
        };
        let resolved = tagged.to_activity_event().expect("activity event");
        assert_eq!(resolved.activity, Activity::Navigation);
        assert_eq!(resolved.duration, Duration::ZERO);

        let untimed = IdeEvent { triggered_at: None, ..tagged };
        assert!(untimed.to_activity_event().is_none());
    }
}
