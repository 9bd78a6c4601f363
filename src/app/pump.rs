// ImpLog - app/pump.rs
//
// Single-writer command queue around the stream gate.
//
// Architecture:
//   - `StreamPump` moves the gate onto a background thread that owns it
//     exclusively. Every line, state message and control command arrives as a
//     `StreamCommand` over one mpsc channel, so the gate is only ever mutated
//     by that thread and lines are processed strictly in arrival order.
//   - `PumpHandle` is a cloneable sender for producers on other threads
//     (transport callbacks, stdin readers).
//   - Outcomes of control commands come back as `PumpEvent`s which the owner
//     polls without blocking.
//   - `shutdown` enqueues a stop marker behind everything already queued,
//     joins the thread and hands the gate back.

use crate::app::collaborators::{DeviceSubscriptions, Diagnostics, OutputSink};
use crate::app::gate::StreamGate;
use crate::util::constants::MAX_PUMP_EVENTS_PER_POLL;
use crate::util::error::StreamError;
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Subscription service handle owned by the pump thread.
pub type SubscriptionService = Box<dyn DeviceSubscriptions + Send>;

/// Work item for the pump thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamCommand {
    Open(String),
    Close,
    Line(String),
    State(String),
    TogglePause,
    Clear,
    AddDevice(String),
    RemoveDevice(String),
    Shutdown,
}

impl StreamCommand {
    fn name(&self) -> &'static str {
        match self {
            StreamCommand::Open(_) => "open",
            StreamCommand::Close => "close",
            StreamCommand::Line(_) => "line",
            StreamCommand::State(_) => "state",
            StreamCommand::TogglePause => "pause",
            StreamCommand::Clear => "clear",
            StreamCommand::AddDevice(_) => "add device",
            StreamCommand::RemoveDevice(_) => "remove device",
            StreamCommand::Shutdown => "shutdown",
        }
    }
}

/// Outcome notifications sent from the pump thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpEvent {
    Opened { stream_id: String },
    Closed,
    PauseToggled { paused: bool },
    Cleared,
    DeviceAdded { device_id: String },
    DeviceRemoved { device_id: String },
    /// A control command was rejected. Line processing never produces this.
    CommandFailed {
        command: &'static str,
        message: String,
    },
    Stopped,
}

/// Line counters accumulated over the pump's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub lines_received: u64,
    pub lines_emitted: u64,
    pub errors_reported: u64,
    pub diagnostic_resets: u64,
}

/// Cloneable producer side of the pump queue.
#[derive(Debug, Clone)]
pub struct PumpHandle {
    tx: mpsc::Sender<StreamCommand>,
}

impl PumpHandle {
    pub fn send(&self, command: StreamCommand) -> Result<(), StreamError> {
        self.tx.send(command).map_err(|_| StreamError::PumpStopped)
    }

    pub fn push_line(&self, line: impl Into<String>) -> Result<(), StreamError> {
        self.send(StreamCommand::Line(line.into()))
    }

    pub fn push_state(&self, message: impl Into<String>) -> Result<(), StreamError> {
        self.send(StreamCommand::State(message.into()))
    }
}

/// Owns the background thread that owns the gate.
pub struct StreamPump<D, S> {
    handle: PumpHandle,
    events_rx: mpsc::Receiver<PumpEvent>,
    worker: Option<JoinHandle<(StreamGate<D, S>, PumpStats)>>,
}

impl<D, S> StreamPump<D, S>
where
    D: Diagnostics + Send + 'static,
    S: OutputSink + Send + 'static,
{
    /// Move `gate` onto a new pump thread.
    ///
    /// `subscriptions` serves `AddDevice` / `RemoveDevice`; without it those
    /// commands fail with a `CommandFailed` event.
    pub fn start(gate: StreamGate<D, S>, subscriptions: Option<SubscriptionService>) -> Self {
        let (tx, rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();

        let worker = std::thread::spawn(move || run_pump(gate, subscriptions, rx, events_tx));
        tracing::info!("Stream pump started");

        Self {
            handle: PumpHandle { tx },
            events_rx,
            worker: Some(worker),
        }
    }

    pub fn handle(&self) -> PumpHandle {
        self.handle.clone()
    }

    pub fn send(&self, command: StreamCommand) -> Result<(), StreamError> {
        self.handle.send(command)
    }

    pub fn push_line(&self, line: impl Into<String>) -> Result<(), StreamError> {
        self.handle.push_line(line)
    }

    /// Drain pending events without blocking, up to `MAX_PUMP_EVENTS_PER_POLL`.
    pub fn poll_events(&self) -> Vec<PumpEvent> {
        self.events_rx
            .try_iter()
            .take(MAX_PUMP_EVENTS_PER_POLL)
            .collect()
    }

    /// Process everything already queued, stop the thread and return the gate.
    pub fn shutdown(mut self) -> Result<(StreamGate<D, S>, PumpStats), StreamError> {
        // The worker may already be gone if it panicked; join reports that.
        let _ = self.handle.send(StreamCommand::Shutdown);
        let worker = self.worker.take().ok_or(StreamError::PumpStopped)?;
        worker.join().map_err(|_| {
            tracing::error!("Stream pump thread panicked");
            StreamError::PumpStopped
        })
    }
}

fn run_pump<D, S>(
    mut gate: StreamGate<D, S>,
    mut subscriptions: Option<SubscriptionService>,
    rx: mpsc::Receiver<StreamCommand>,
    events: mpsc::Sender<PumpEvent>,
) -> (StreamGate<D, S>, PumpStats)
where
    D: Diagnostics,
    S: OutputSink,
{
    // Nobody listening for events is not a reason to stop processing lines.
    let emit = |event: PumpEvent| {
        let _ = events.send(event);
    };
    let mut stats = PumpStats::default();

    for command in rx.iter() {
        let name = command.name();
        match command {
            StreamCommand::Line(raw) => {
                stats.lines_received += 1;
                let outcome = gate.process_line(&raw);
                stats.lines_emitted += u64::from(outcome.emitted);
                stats.errors_reported += u64::from(outcome.error_reported);
                stats.diagnostic_resets += u64::from(outcome.diagnostics_cleared);
            }
            StreamCommand::State(message) => {
                gate.process_state(&message);
            }
            StreamCommand::Open(stream_id) => {
                gate.open(stream_id.clone());
                emit(PumpEvent::Opened { stream_id });
            }
            StreamCommand::Close => {
                gate.close();
                emit(PumpEvent::Closed);
            }
            StreamCommand::TogglePause => match gate.toggle_pause() {
                Ok(paused) => emit(PumpEvent::PauseToggled { paused }),
                Err(e) => emit(failed(name, &e)),
            },
            StreamCommand::Clear => match gate.clear_output() {
                Ok(()) => emit(PumpEvent::Cleared),
                Err(e) => emit(failed(name, &e)),
            },
            StreamCommand::AddDevice(device_id) => {
                let result = match subscriptions.as_deref_mut() {
                    Some(service) => gate.add_device(service, &device_id),
                    None => Err(no_service(&device_id).into()),
                };
                match result {
                    Ok(()) => emit(PumpEvent::DeviceAdded { device_id }),
                    Err(e) => emit(failed(name, &e)),
                }
            }
            StreamCommand::RemoveDevice(device_id) => {
                let result = match subscriptions.as_deref_mut() {
                    Some(service) => gate.remove_device(service, &device_id),
                    None => Err(no_service(&device_id).into()),
                };
                match result {
                    Ok(()) => emit(PumpEvent::DeviceRemoved { device_id }),
                    Err(e) => emit(failed(name, &e)),
                }
            }
            StreamCommand::Shutdown => break,
        }
    }

    tracing::info!(
        lines = stats.lines_received,
        emitted = stats.lines_emitted,
        errors = stats.errors_reported,
        resets = stats.diagnostic_resets,
        "Stream pump stopped"
    );
    emit(PumpEvent::Stopped);
    (gate, stats)
}

fn failed(command: &'static str, error: &dyn std::fmt::Display) -> PumpEvent {
    tracing::warn!(command, error = %error, "Stream command failed");
    PumpEvent::CommandFailed {
        command,
        message: error.to_string(),
    }
}

fn no_service(device_id: &str) -> StreamError {
    StreamError::Subscription {
        device_id: device_id.to_string(),
        reason: "no subscription service attached".to_string(),
    }
}
