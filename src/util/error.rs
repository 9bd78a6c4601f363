// ImpLog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Note: nothing in the line interpretation path returns these errors. Parsing
// and resolution degrade to raw pass-through; only collaborator calls,
// stream control operations, and startup loading are fallible.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ImpLog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ImpLogError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Pre-processor source map loading failed.
    SourceMap(SourceMapError),

    /// A collaborator (UI sink, diagnostics collector) rejected a call.
    Collateral(CollateralError),

    /// A stream control operation failed.
    Stream(StreamError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for ImpLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::SourceMap(e) => write!(f, "Source map error: {e}"),
            Self::Collateral(e) => write!(f, "Collaborator error: {e}"),
            Self::Stream(e) => write!(f, "Log stream error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ImpLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::SourceMap(e) => Some(e),
            Self::Collateral(e) => Some(e),
            Self::Stream(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Collateral errors
// ---------------------------------------------------------------------------

/// Failures reported by the injected collaborators.
///
/// These never abort line processing; the gate logs them and moves on to
/// the next line.
#[derive(Debug)]
pub enum CollateralError {
    /// The UI sink could not perform `operation`.
    Sink {
        operation: &'static str,
        source: io::Error,
    },

    /// The diagnostics collector rejected `operation`.
    Diagnostics {
        operation: &'static str,
        reason: String,
    },
}

impl fmt::Display for CollateralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink { operation, source } => {
                write!(f, "output sink failed during {operation}: {source}")
            }
            Self::Diagnostics { operation, reason } => {
                write!(f, "diagnostics collector failed during {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for CollateralError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sink { source, .. } => Some(source),
            Self::Diagnostics { .. } => None,
        }
    }
}

impl From<CollateralError> for ImpLogError {
    fn from(e: CollateralError) -> Self {
        Self::Collateral(e)
    }
}

// ---------------------------------------------------------------------------
// Stream errors
// ---------------------------------------------------------------------------

/// Errors from stream control operations (pause, clear, device management).
#[derive(Debug)]
pub enum StreamError {
    /// The operation requires an open stream.
    NotOpen { operation: &'static str },

    /// The subscription service refused to add or remove a device.
    Subscription { device_id: String, reason: String },

    /// The device ID supplied was empty.
    EmptyDeviceId,

    /// The pump thread is no longer running.
    PumpStopped,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen { operation } => write!(
                f,
                "Cannot {operation} {}: no log stream is open",
                super::constants::OUTPUT_CHANNEL_NAME
            ),
            Self::Subscription { device_id, reason } => {
                write!(f, "Device {device_id} subscription failed: {reason}")
            }
            Self::EmptyDeviceId => write!(f, "Device ID must not be empty"),
            Self::PumpStopped => write!(f, "Log stream pump has stopped"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<StreamError> for ImpLogError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

// ---------------------------------------------------------------------------
// Source map errors
// ---------------------------------------------------------------------------

/// Errors related to loading pre-processor line tables.
#[derive(Debug)]
pub enum SourceMapError {
    /// I/O error reading the line table file.
    Io { path: PathBuf, source: io::Error },

    /// The file is not a valid line table document.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },
}

impl fmt::Display for SourceMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "I/O error reading source map '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "Invalid source map '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Source map '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SourceMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::FileTooLarge { .. } => None,
        }
    }
}

impl From<SourceMapError> for ImpLogError {
    fn from(e: SourceMapError) -> Self {
        Self::SourceMap(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ImpLogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ImpLog results.
pub type Result<T> = std::result::Result<T, ImpLogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_open_names_the_output_channel() {
        let e = StreamError::NotOpen { operation: "pause" };
        assert_eq!(e.to_string(), "Cannot pause imp log stream: no log stream is open");
    }

    #[test]
    fn test_collateral_sink_error_preserves_source() {
        let e: ImpLogError = CollateralError::Sink {
            operation: "append_line",
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        }
        .into();
        let inner = e.source().expect("top-level error should expose its cause");
        assert!(inner.source().is_some(), "sink error should chain the io::Error");
        assert!(e.to_string().contains("append_line"));
    }
}
