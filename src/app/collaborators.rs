// ImpLog - app/collaborators.rs
//
// Interfaces of the external collaborators the stream gate drives.
// Handles are injected at construction; nothing here is a global.

use crate::core::model::ErrorReport;
use crate::core::resolve::SourceMaps;
use crate::util::error::{CollateralError, StreamError};

/// Collects structured errors reported by the stream and resolves source
/// names to source maps.
pub trait Diagnostics: SourceMaps {
    /// Record one error.
    fn add_error(&mut self, report: ErrorReport) -> Result<(), CollateralError>;

    /// Drop every accumulated diagnostic.
    fn clear_all(&mut self) -> Result<(), CollateralError>;
}

/// Append-only display the rendered stream is written to.
pub trait OutputSink {
    fn append_line(&mut self, text: &str) -> Result<(), CollateralError>;

    fn clear(&mut self) -> Result<(), CollateralError>;

    /// Bring the output into view. `preserve_focus` keeps input focus where it is.
    fn show(&mut self, preserve_focus: bool) -> Result<(), CollateralError>;
}

/// Remote service that routes a device's logs into a stream.
pub trait DeviceSubscriptions {
    fn add_device(&mut self, stream_id: &str, device_id: &str) -> Result<(), StreamError>;

    fn remove_device(&mut self, stream_id: &str, device_id: &str) -> Result<(), StreamError>;
}
