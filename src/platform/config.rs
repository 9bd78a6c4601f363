// ImpLog - platform/config.rs
//
// Platform-specific configuration, directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ImpLog configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/implog/ or %APPDATA%\ImpLog\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[sources]` section.
    pub sources: SourcesSection,
    /// `[stream]` section.
    pub stream: StreamSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[sources]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    /// Flat path substituted for `agent_code` when no pre-processor is used.
    pub agent_path: Option<String>,
    /// Flat path substituted for `device_code` when no pre-processor is used.
    pub device_path: Option<String>,
    /// Pre-processor line table (JSON) for the agent code.
    pub agent_map: Option<String>,
    /// Pre-processor line table (JSON) for the device code.
    pub device_map: Option<String>,
}

/// `[stream]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StreamSection {
    /// Render stream state messages instead of suppressing them.
    pub show_state_messages: Option<bool>,
    /// Tag colouring: "auto", "always" or "never".
    pub colour: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// When category tags are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColourMode {
    /// Colour when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColourMode {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "auto" => Some(ColourMode::Auto),
            "always" => Some(ColourMode::Always),
            "never" => Some(ColourMode::Never),
            _ => None,
        }
    }

    /// Resolve against whether the output is a terminal.
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            ColourMode::Auto => is_terminal,
            ColourMode::Always => true,
            ColourMode::Never => false,
        }
    }
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Sources --
    pub agent_path: Option<PathBuf>,
    pub device_path: Option<PathBuf>,
    pub agent_map: Option<PathBuf>,
    pub device_map: Option<PathBuf>,

    // -- Stream --
    pub show_state_messages: bool,
    pub colour: ColourMode,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent_path: None,
            device_path: None,
            agent_map: None,
            device_map: None,
            show_state_messages: constants::DEFAULT_SHOW_STATE_MESSAGES,
            colour: ColourMode::Auto,
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate a config file.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unparseable, returns defaults with an error warning: the
/// application still starts but the user is informed.
///
/// Relative paths in `[sources]` are resolved against the config file's
/// directory.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) => {
            let e = ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            };
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let e = ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            };
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let config = validate(raw, base, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Validate each raw field, accumulating warnings for rejected values.
fn validate(raw: RawConfig, base: &Path, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Sources --
    let mut source_path = |field: &str, value: Option<String>| -> Option<PathBuf> {
        let value = value?;
        if value.trim().is_empty() {
            warnings.push(format!("[sources] {field} is empty. Ignoring it."));
            return None;
        }
        Some(base.join(value))
    };
    config.agent_path = source_path("agent_path", raw.sources.agent_path);
    config.device_path = source_path("device_path", raw.sources.device_path);
    config.agent_map = source_path("agent_map", raw.sources.agent_map);
    config.device_map = source_path("device_map", raw.sources.device_map);

    // -- Stream --
    if let Some(show) = raw.stream.show_state_messages {
        config.show_state_messages = show;
    }

    if let Some(ref colour) = raw.stream.colour {
        match ColourMode::parse(colour) {
            Some(mode) => config.colour = mode,
            None => warnings.push(format!(
                "{}. Using default (auto).",
                ConfigError::ValueOutOfRange {
                    field: "stream.colour".to_string(),
                    value: colour.clone(),
                    expected: "auto, always or never".to_string(),
                }
            )),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "{}. Using default (info).",
                ConfigError::ValueOutOfRange {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    expected: valid.join(", "),
                }
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file.clone());
        }
    }

    config
}
