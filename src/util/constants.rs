// ImpLog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ImpLog";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ImpLog";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the output channel the rendered stream is written to.
pub const OUTPUT_CHANNEL_NAME: &str = "imp log stream";

/// Stream identifier used when replaying a captured log locally.
pub const REPLAY_STREAM_ID: &str = "replay";

// =============================================================================
// Rendering
// =============================================================================

/// strftime-style format of the render-time timestamp prefix.
/// Produces e.g. `2024-01-15 14:30:22+0100`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Column suffix appended to every resolved source reference.
pub const COLUMN_SUFFIX: &str = ":0";

// =============================================================================
// Source tokens
// =============================================================================

/// Symbolic name the remote runtime uses for agent code in messages.
pub const AGENT_CODE_TOKEN: &str = "agent_code";

/// Symbolic name the remote runtime uses for device code in messages.
pub const DEVICE_CODE_TOKEN: &str = "device_code";

// =============================================================================
// Source map limits
// =============================================================================

/// Maximum size of a pre-processor line table JSON file in bytes.
pub const MAX_SOURCE_MAP_FILE_SIZE: u64 = 32 * 1024 * 1024; // 32 MB

// =============================================================================
// Stream pump limits
// =============================================================================

/// Maximum number of pump events drained in a single `poll_events` call.
/// Remaining events stay queued for the next poll.
pub const MAX_PUMP_EVENTS_PER_POLL: usize = 500;

/// Maximum length of a raw line included in debug output.
/// Prevents accidental exposure of sensitive data in long lines.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default for the state-message display policy. State messages are
/// suppressed unless explicitly enabled.
pub const DEFAULT_SHOW_STATE_MESSAGES: bool = false;
