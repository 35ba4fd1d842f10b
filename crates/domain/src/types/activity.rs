//! Activity classification tags

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of work a developer was doing during a span of time.
///
/// `EnterIDE`, `LeaveIDE` and `Any` are sentinel tags: they carry IDE
/// focus/presence information rather than a concrete work category and are
/// never emitted as final classification output (the classifier resolves
/// them to `Other`/`Away`/carry-forward values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    Development,
    Navigation,
    Debugging,
    Testing,
    VersionControl,
    ProjectManagement,
    LocalConfiguration,
    Other,
    Inactive,
    InactiveLong,
    Away,
    EnterIDE,
    LeaveIDE,
    Any,
}

impl Activity {
    /// Returns true for the focus/presence markers that never describe
    /// concrete work.
    pub fn is_sentinel(self) -> bool {
        matches!(self, Activity::Any | Activity::EnterIDE | Activity::LeaveIDE)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activity::Development => "Development",
            Activity::Navigation => "Navigation",
            Activity::Debugging => "Debugging",
            Activity::Testing => "Testing",
            Activity::VersionControl => "VersionControl",
            Activity::ProjectManagement => "ProjectManagement",
            Activity::LocalConfiguration => "LocalConfiguration",
            Activity::Other => "Other",
            Activity::Inactive => "Inactive",
            Activity::InactiveLong => "InactiveLong",
            Activity::Away => "Away",
            Activity::EnterIDE => "EnterIDE",
            Activity::LeaveIDE => "LeaveIDE",
            Activity::Any => "Any",
        };
        f.write_str(name)
    }
}
