//! Configuration structures for the pipeline and the activity engine

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DAY_START_OFFSET_SECS, DEFAULT_LONG_THRESHOLD_SECS, DEFAULT_MIN_TOOL_VERSION,
    DEFAULT_SHORT_TIMEOUT_SECS, DEFAULT_WINDOW_SPAN_SECS, DEFAULT_ZERO_DURATION_FLOOR_MS,
};

/// Top-level configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory holding the raw input archives.
    pub raw_dir: PathBuf,

    /// Intermediate working area for merged per-user archives.
    pub merged_dir: PathBuf,

    /// Final area for cleaned archives and reports.
    pub out_dir: PathBuf,

    /// Bounded worker pool size for the parallel stages.
    /// 0 means "use available parallelism".
    #[serde(default)]
    pub worker_count: usize,

    #[serde(default)]
    pub cleaning: CleaningConfig,

    #[serde(default)]
    pub activity: ActivityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            merged_dir: PathBuf::from("data/merged"),
            out_dir: PathBuf::from("data/out"),
            worker_count: 0,
            cleaning: CleaningConfig::default(),
            activity: ActivityConfig::default(),
        }
    }
}

/// Configuration for the cleaning stage filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Minimum tool version accepted by the version filter. `None`
    /// disables the version check.
    pub min_tool_version: Option<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self { min_tool_version: Some(DEFAULT_MIN_TOOL_VERSION.to_string()) }
    }
}

/// Configuration for window classification and interval derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Classification window span in seconds.
    pub window_span_secs: u64,

    /// Weight substituted for zero/unset event durations in dominant
    /// activity selection, in milliseconds.
    pub zero_duration_floor_ms: u64,

    /// Short inactivity timeout in seconds (gap correction and statistic
    /// merging).
    pub short_timeout_secs: u64,

    /// Long inactivity threshold in seconds.
    pub long_threshold_secs: u64,

    /// Logical day-start offset in seconds (0 = midnight).
    pub day_start_offset_secs: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            window_span_secs: DEFAULT_WINDOW_SPAN_SECS,
            zero_duration_floor_ms: DEFAULT_ZERO_DURATION_FLOOR_MS,
            short_timeout_secs: DEFAULT_SHORT_TIMEOUT_SECS,
            long_threshold_secs: DEFAULT_LONG_THRESHOLD_SECS,
            day_start_offset_secs: DEFAULT_DAY_START_OFFSET_SECS,
        }
    }
}

impl ActivityConfig {
    pub fn window_span(&self) -> Duration {
        Duration::from_secs(self.window_span_secs)
    }

    pub fn zero_duration_floor(&self) -> Duration {
        Duration::from_millis(self.zero_duration_floor_ms)
    }

    pub fn short_timeout(&self) -> Duration {
        Duration::from_secs(self.short_timeout_secs)
    }

    pub fn long_threshold(&self) -> Duration {
        Duration::from_secs(self.long_threshold_secs)
    }

    pub fn day_start_offset(&self) -> Duration {
        Duration::from_secs(self.day_start_offset_secs)
    }
}
