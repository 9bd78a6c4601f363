// ImpLog - app/gate.rs
//
// Stream gate: owns the per-session state (pause flag, subscribed devices)
// and decides, once per inbound line, what gets rendered and which
// collateral side effects fire.
//
// States:
//   Closed --open--> Active <--toggle_pause--> Paused
//   any    --close--> Closed
//
// Collaborator failures are logged and never stop the next line from being
// processed.

use crate::app::collaborators::{Diagnostics, DeviceSubscriptions, OutputSink};
use crate::core::parser::{self, RenderOptions};
use crate::core::resolve::{FlatPaths, Resolver};
use crate::util::constants;
use crate::util::error::{Result, StreamError};
use std::collections::BTreeSet;

/// Lifecycle state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Closed,
    Active,
    Paused,
}

/// Per-session policy, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPolicy {
    /// Render state/status messages. Off by default.
    pub show_state_messages: bool,
    pub render: RenderOptions,
    /// Paths used to resolve references when no pre-processor is present.
    pub flat_paths: FlatPaths,
}

impl Default for StreamPolicy {
    fn default() -> Self {
        Self {
            show_state_messages: constants::DEFAULT_SHOW_STATE_MESSAGES,
            render: RenderOptions::default(),
            flat_paths: FlatPaths::default(),
        }
    }
}

/// What happened to one inbound line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineOutcome {
    /// The rendered record reached the output sink.
    pub emitted: bool,
    /// An error report was accepted by the diagnostics collector.
    pub error_reported: bool,
    /// The diagnostics collector was reset.
    pub diagnostics_cleared: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    stream_id: Option<String>,
    paused: bool,
    devices: BTreeSet<String>,
}

/// Stateful wrapper around the pure line interpreter.
pub struct StreamGate<D, S> {
    diagnostics: D,
    sink: S,
    policy: StreamPolicy,
    session: SessionState,
    clock: fn() -> String,
}

impl<D: Diagnostics, S: OutputSink> StreamGate<D, S> {
    /// Create a closed gate around the injected collaborators.
    pub fn new(diagnostics: D, sink: S, policy: StreamPolicy) -> Self {
        Self {
            diagnostics,
            sink,
            policy,
            session: SessionState::default(),
            clock: parser::timestamp_now,
        }
    }

    /// Replace the render-time timestamp source.
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start a new stream session. Clears the pause flag and device set.
    pub fn open(&mut self, stream_id: impl Into<String>) {
        let stream_id = stream_id.into();
        tracing::info!(stream_id = %stream_id, "Log stream opened");
        self.session = SessionState {
            stream_id: Some(stream_id),
            ..SessionState::default()
        };
    }

    pub fn close(&mut self) {
        if let Some(id) = self.session.stream_id.take() {
            tracing::info!(stream_id = %id, "Log stream closed");
        }
        self.session = SessionState::default();
    }

    pub fn state(&self) -> GateState {
        match (&self.session.stream_id, self.session.paused) {
            (None, _) => GateState::Closed,
            (Some(_), false) => GateState::Active,
            (Some(_), true) => GateState::Paused,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.stream_id.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.session.paused
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.session.stream_id.as_deref()
    }

    pub fn devices(&self) -> &BTreeSet<String> {
        &self.session.devices
    }

    /// Flip between Active and Paused. Returns the new paused flag.
    pub fn toggle_pause(&mut self) -> std::result::Result<bool, StreamError> {
        if !self.is_open() {
            return Err(StreamError::NotOpen { operation: "pause" });
        }
        self.session.paused = !self.session.paused;
        tracing::info!(paused = self.session.paused, "Log stream pause toggled");
        Ok(self.session.paused)
    }

    // -------------------------------------------------------------------------
    // Line processing
    // -------------------------------------------------------------------------

    /// Process one inbound log record.
    ///
    /// Paused or closed: discarded without parsing or side effects.
    /// Otherwise, in order: error report, reload reset, render and emit.
    pub fn process_line(&mut self, raw: &str) -> LineOutcome {
        let mut outcome = LineOutcome::default();

        match self.state() {
            GateState::Active => {}
            GateState::Paused => return outcome,
            GateState::Closed => {
                tracing::debug!(line = parser::preview(raw), "Line received with no open stream");
                return outcome;
            }
        }

        if let Some(report) = parser::error_report(raw, &self.diagnostics) {
            tracing::debug!(
                source = %report.source,
                file = %report.file.display(),
                line = report.line,
                "Error reported by log stream"
            );
            match self.diagnostics.add_error(report) {
                Ok(()) => outcome.error_reported = true,
                Err(e) => tracing::warn!(error = %e, "Diagnostics rejected error report"),
            }
        }

        if parser::is_code_reload(raw) {
            tracing::info!("New code deployed; clearing diagnostics");
            match self.diagnostics.clear_all() {
                Ok(()) => outcome.diagnostics_cleared = true,
                Err(e) => tracing::warn!(error = %e, "Diagnostics reset failed"),
            }
        }

        let timestamp = (self.clock)();
        let rendered = {
            let resolver = Resolver::for_session(&self.diagnostics, &self.policy.flat_paths);
            parser::render_line(raw, &resolver, &timestamp, self.policy.render)
        };

        match self.sink.append_line(&rendered) {
            Ok(()) => outcome.emitted = true,
            Err(e) => tracing::warn!(error = %e, "Output sink rejected line"),
        }

        outcome
    }

    /// Process a stream state message (connection state, subscription changes).
    ///
    /// Suppressed entirely unless `show_state_messages` is enabled. Returns
    /// true when the message reached the sink.
    pub fn process_state(&mut self, message: &str) -> bool {
        if !self.policy.show_state_messages {
            return false;
        }
        if self.state() != GateState::Active {
            return false;
        }
        match self.sink.append_line(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Output sink rejected state message");
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Output and device control
    // -------------------------------------------------------------------------

    /// Clear the output sink.
    pub fn clear_output(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(StreamError::NotOpen { operation: "clear" }.into());
        }
        self.sink.clear()?;
        Ok(())
    }

    /// Subscribe a device to the open stream.
    ///
    /// On success the device is tracked and the output is brought into view.
    pub fn add_device<R>(&mut self, service: &mut R, device_id: &str) -> Result<()>
    where
        R: DeviceSubscriptions + ?Sized,
    {
        let stream_id = self.require_stream("add device to")?;
        let device_id = checked_device_id(device_id)?;

        service.add_device(&stream_id, device_id)?;

        if let Err(e) = self.sink.show(true) {
            tracing::warn!(error = %e, "Output sink could not be shown");
        }
        self.session.devices.insert(device_id.to_string());
        tracing::info!(device_id, stream_id = %stream_id, "Device added");
        Ok(())
    }

    /// Unsubscribe a device from the open stream.
    pub fn remove_device<R>(&mut self, service: &mut R, device_id: &str) -> Result<()>
    where
        R: DeviceSubscriptions + ?Sized,
    {
        let stream_id = self.require_stream("remove device from")?;
        let device_id = checked_device_id(device_id)?;

        service.remove_device(&stream_id, device_id)?;

        self.session.devices.remove(device_id);
        tracing::info!(device_id, stream_id = %stream_id, "Device removed");
        Ok(())
    }

    fn require_stream(&self, operation: &'static str) -> std::result::Result<String, StreamError> {
        self.session
            .stream_id
            .clone()
            .ok_or(StreamError::NotOpen { operation })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn policy(&self) -> &StreamPolicy {
        &self.policy
    }

    /// Consume the gate, returning its collaborators.
    pub fn into_parts(self) -> (D, S) {
        (self.diagnostics, self.sink)
    }
}

fn checked_device_id(device_id: &str) -> std::result::Result<&str, StreamError> {
    let trimmed = device_id.trim();
    if trimmed.is_empty() {
        Err(StreamError::EmptyDeviceId)
    } else {
        Ok(trimmed)
    }
}
