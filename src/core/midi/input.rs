use crossbeam_channel::{bounded, Sender};
use log::{debug, info, warn};
use midir::{MidiInput, MidiInputConnection};
use std::thread;

use super::MidiMessage;
use crate::error::PianoError;
use crate::messaging::PianoMessage;

/// Answer of the permission query that precedes MIDI access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Prompt,
    Denied,
}

/// Metadata of a connected input, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub manufacturer: Option<String>,
}

/// An open input. Messages keep arriving for as long as this value lives.
pub struct InputDevice {
    pub info: DeviceInfo,
    _connection: Option<MidiInputConnection<()>>,
}

impl InputDevice {
    /// A device that is not backed by a live connection.
    pub fn detached(info: DeviceInfo) -> Self {
        Self {
            info,
            _connection: None,
        }
    }
}

/// The permission-gated MIDI capability.
pub trait MidiAccess {
    fn permission(&self) -> Permission;

    /// Opens every available input. Decoded messages are sent on `sink`.
    fn open_inputs(&self, sink: Sender<PianoMessage>) -> Result<Vec<InputDevice>, PianoError>;
}

/// Result of one connection attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Denied,
    Error(String),
    Connected(Vec<DeviceInfo>),
}

impl ConnectOutcome {
    pub fn error(&self) -> Option<PianoError> {
        match self {
            ConnectOutcome::Denied => Some(PianoError::PermissionDenied),
            ConnectOutcome::Error(cause) => Some(PianoError::Connection(cause.clone())),
            ConnectOutcome::Connected(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Pending,
    Connected(Vec<DeviceInfo>),
}

/// Runs one connection attempt synchronously.
///
/// A denied permission returns without touching the inputs.
pub fn establish<A: MidiAccess>(
    access: &A,
    sink: Sender<PianoMessage>,
) -> (ConnectOutcome, Vec<InputDevice>) {
    if access.permission() == Permission::Denied {
        return (ConnectOutcome::Denied, Vec::new());
    }

    match access.open_inputs(sink) {
        Ok(devices) => {
            let infos = devices.iter().map(|device| device.info.clone()).collect();
            (ConnectOutcome::Connected(infos), devices)
        }
        Err(err) => (ConnectOutcome::Error(err.to_string()), Vec::new()),
    }
}

/// Drives the `Disconnected -> Pending -> {Denied | Error | Connected}`
/// machine. Attempts run on their own thread; the outcome comes back over the
/// bus as [`PianoMessage::Connection`] and must be fed to [`resolve`].
///
/// [`resolve`]: MidiConnector::resolve
pub struct MidiConnector {
    state: ConnectionState,
    shutdown: Option<Sender<()>>,
}

impl MidiConnector {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            shutdown: None,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Starts an attempt. Returns `false` when one is already pending or the
    /// session is connected.
    pub fn connect<A>(&mut self, access: A, sink: Sender<PianoMessage>) -> bool
    where
        A: MidiAccess + Send + 'static,
    {
        if self.state != ConnectionState::Disconnected {
            debug!("midi@connect ignored in state {:?}", self.state);
            return false;
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let spawned = thread::Builder::new()
            .name("midi-connect".into())
            .spawn(move || {
                let (outcome, devices) = establish(&access, sink.clone());
                let connected = matches!(outcome, ConnectOutcome::Connected(_));
                sink.send(PianoMessage::Connection(outcome)).ok();

                if connected {
                    // Connections stay open until the connector goes away.
                    let _ = shutdown_rx.recv();
                }
                drop(devices);
                debug!("midi@connect thread finished");
            });

        match spawned {
            Ok(_) => {
                self.state = ConnectionState::Pending;
                self.shutdown = Some(shutdown_tx);
                true
            }
            Err(err) => {
                warn!("could not start MIDI connection thread: {}", err);
                false
            }
        }
    }

    /// Applies the outcome of the pending attempt.
    pub fn resolve(&mut self, outcome: &ConnectOutcome) {
        match outcome {
            ConnectOutcome::Connected(devices) => {
                info!("MIDI connected with {} input(s)", devices.len());
                self.state = ConnectionState::Connected(devices.clone());
            }
            ConnectOutcome::Denied | ConnectOutcome::Error(_) => {
                if let Some(err) = outcome.error() {
                    warn!("{}", err);
                }
                self.reset();
            }
        }
    }

    fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.shutdown = None;
    }
}

impl Default for MidiConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// [`MidiAccess`] over the system MIDI inputs.
///
/// There is no OS-level prompt for MIDI on desktop platforms, so the
/// permission comes from the application settings.
pub struct MidirAccess {
    client_name: String,
    enabled: bool,
}

impl MidirAccess {
    pub fn new(enabled: bool) -> Self {
        Self {
            client_name: "Virtual Piano MIDI Input".to_string(),
            enabled,
        }
    }
}

impl MidiAccess for MidirAccess {
    fn permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    fn open_inputs(&self, sink: Sender<PianoMessage>) -> Result<Vec<InputDevice>, PianoError> {
        let probe = MidiInput::new(&self.client_name)
            .map_err(|e| PianoError::Connection(format!("failed to create MIDI input: {}", e)))?;

        let mut devices = Vec::new();
        for port in probe.ports() {
            let id = port.id();
            let name = probe.port_name(&port).unwrap_or_else(|_| id.clone());

            // Each connection consumes its own MidiInput.
            let midi_in = MidiInput::new(&self.client_name)
                .map_err(|e| {
                    PianoError::Connection(format!("failed to create MIDI input: {}", e))
                })?;
            let Some(port) = midi_in.ports().into_iter().find(|p| p.id() == id) else {
                warn!("MIDI port '{}' disappeared while connecting", name);
                continue;
            };

            let sender = sink.clone();
            let connection = midi_in
                .connect(
                    &port,
                    "virtual-piano-read-input",
                    move |_stamp, bytes, _| {
                        if let Some(message) = MidiMessage::decode(bytes) {
                            sender.send(PianoMessage::Midi(message)).ok();
                        }
                    },
                    (),
                )
                .map_err(|e| {
                    PianoError::Connection(format!("failed to connect to '{}': {}", name, e))
                })?;

            debug!("midi@input {} ({})", name, id);
            devices.push(InputDevice {
                info: DeviceInfo {
                    id,
                    name,
                    manufacturer: None,
                },
                _connection: Some(connection),
            });
        }

        Ok(devices)
    }
}
