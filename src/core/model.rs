// ImpLog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Log category
// =============================================================================

/// Category token attached to each log stream record.
///
/// The set is closed: anything the remote service emits that is not one of
/// the known tokens maps to `Unknown` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    ServerLog,
    ServerError,
    ServerSleep,
    AgentLog,
    AgentError,
    Status,
    PowerState,
    LastExitCode,
    Firmware,
    IdeLog,
    Unknown,
}

impl LogCategory {
    /// All recognised categories in table order.
    pub fn all() -> &'static [LogCategory] {
        &[
            LogCategory::ServerLog,
            LogCategory::ServerError,
            LogCategory::ServerSleep,
            LogCategory::AgentLog,
            LogCategory::AgentError,
            LogCategory::Status,
            LogCategory::PowerState,
            LogCategory::LastExitCode,
            LogCategory::Firmware,
            LogCategory::IdeLog,
        ]
    }

    /// Map a raw token to a category. Exact, case-sensitive comparison.
    pub fn from_token(token: &str) -> Self {
        match token {
            "server.log" => LogCategory::ServerLog,
            "server.error" => LogCategory::ServerError,
            "server.sleep" => LogCategory::ServerSleep,
            "agent.log" => LogCategory::AgentLog,
            "agent.error" => LogCategory::AgentError,
            "status" => LogCategory::Status,
            "powerstate" => LogCategory::PowerState,
            "lastexitcode" => LogCategory::LastExitCode,
            "firmware" => LogCategory::Firmware,
            "IDE.log" => LogCategory::IdeLog,
            _ => LogCategory::Unknown,
        }
    }

    /// The wire token for this category, `None` for `Unknown`.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            LogCategory::ServerLog => Some("server.log"),
            LogCategory::ServerError => Some("server.error"),
            LogCategory::ServerSleep => Some("server.sleep"),
            LogCategory::AgentLog => Some("agent.log"),
            LogCategory::AgentError => Some("agent.error"),
            LogCategory::Status => Some("status"),
            LogCategory::PowerState => Some("powerstate"),
            LogCategory::LastExitCode => Some("lastexitcode"),
            LogCategory::Firmware => Some("firmware"),
            LogCategory::IdeLog => Some("IDE.log"),
            LogCategory::Unknown => None,
        }
    }
}

// =============================================================================
// Type info
// =============================================================================

/// Formatting class of a classified record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleClass {
    DeviceLog,
    DeviceError,
    DeviceSleep,
    AgentLog,
    AgentError,
    Status,
    PowerState,
    LastExitCode,
    Firmware,
    IdeLog,
}

impl StyleClass {
    /// Kebab-case class name (e.g. `"last-exit-code"`).
    pub fn class_name(&self) -> &'static str {
        match self {
            StyleClass::DeviceLog => "device-log",
            StyleClass::DeviceError => "device-error",
            StyleClass::DeviceSleep => "device-sleep",
            StyleClass::AgentLog => "agent-log",
            StyleClass::AgentError => "agent-error",
            StyleClass::Status => "status",
            StyleClass::PowerState => "power-state",
            StyleClass::LastExitCode => "last-exit-code",
            StyleClass::Firmware => "firmware",
            StyleClass::IdeLog => "ide-log",
        }
    }

    /// Agent-family classes render their tag with a trailing space.
    pub fn is_agent_family(&self) -> bool {
        matches!(self, StyleClass::AgentLog | StyleClass::AgentError)
    }
}

impl fmt::Display for StyleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Display name and style class derived from a `LogCategory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub display_name: &'static str,
    pub style_class: StyleClass,
}

// =============================================================================
// Parsed line
// =============================================================================

/// Deployment environment a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentEnv {
    Development,
    Production,
}

impl DeploymentEnv {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "development" => Some(DeploymentEnv::Development),
            "production" => Some(DeploymentEnv::Production),
            _ => None,
        }
    }
}

/// Fields extracted from one raw log stream line.
///
/// Ephemeral: one per parse call, borrowed from the raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// 16 lowercase hex characters identifying the device.
    pub device_token: &'a str,
    /// Free-form text between the device token and the environment keyword.
    pub label: &'a str,
    pub deployment_env: DeploymentEnv,
    /// Raw category token, e.g. `server.log`.
    pub category: &'a str,
    /// Remainder of the line.
    pub body: &'a str,
}

impl ParsedLine<'_> {
    pub fn log_category(&self) -> LogCategory {
        LogCategory::from_token(self.category)
    }
}

// =============================================================================
// Source references
// =============================================================================

/// Which half of the application produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "agent_code")]
    Agent,
    #[serde(rename = "device_code")]
    Device,
}

impl SourceKind {
    /// The symbolic token used in messages (`agent_code` / `device_code`).
    pub fn token(&self) -> &'static str {
        match self {
            SourceKind::Agent => constants::AGENT_CODE_TOKEN,
            SourceKind::Device => constants::DEVICE_CODE_TOKEN,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            constants::AGENT_CODE_TOKEN => Some(SourceKind::Agent),
            constants::DEVICE_CODE_TOKEN => Some(SourceKind::Device),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A symbolic `agent_code:NN` / `device_code:NN` reference found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceReference {
    pub kind: SourceKind,
    /// 1-based line number as it appears in the message.
    pub line_number: u32,
}

/// A reference mapped back to an original source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub file_path: PathBuf,
    pub line: u32,
    /// Always 0: the remote runtime reports no column information.
    pub column: u32,
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path.display(), self.line, self.column)
    }
}

// =============================================================================
// Error report
// =============================================================================

/// Structured error record forwarded to the diagnostics collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub source: SourceKind,
    /// File of the source map registered for `source`.
    pub file: PathBuf,
    /// Line number exactly as reported in the message.
    pub line: u32,
}
