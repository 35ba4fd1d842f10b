//! Domain constants and default values

/// File extension of event archives (without the leading dot).
pub const ARCHIVE_EXTENSION: &str = "evlog";

/// Suffix of the identifier cache sidecar written next to an archive
/// (`<path minus extension>.ids.json`).
pub const ID_CACHE_SUFFIX: &str = "ids.json";

/// Namespace prefix for profile-id identity tokens.
pub const PROFILE_TOKEN_PREFIX: &str = "pid:";

/// Namespace prefix for session-id identity tokens.
pub const SESSION_TOKEN_PREFIX: &str = "sid:";

/// Default classification window span in seconds.
pub const DEFAULT_WINDOW_SPAN_SECS: u64 = 1;

/// Default weight given to zero/unset event durations during dominant
/// activity selection, in milliseconds. Large enough that a handful of
/// floor-weighted events outweigh a single 200ms event.
pub const DEFAULT_ZERO_DURATION_FLOOR_MS: u64 = 500;

/// Default short inactivity timeout in seconds (gap correction and
/// statistic merging).
pub const DEFAULT_SHORT_TIMEOUT_SECS: u64 = 15;

/// Default long inactivity threshold in seconds.
pub const DEFAULT_LONG_THRESHOLD_SECS: u64 = 300;

/// Default logical day-start offset in seconds (0 = midnight).
pub const DEFAULT_DAY_START_OFFSET_SECS: u64 = 0;

/// Default minimum tool version accepted by the cleaning stage.
pub const DEFAULT_MIN_TOOL_VERSION: &str = "0.1011";
