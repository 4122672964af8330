//! Command and event vocabulary between callers and the link task
//!
//! Commands flow from [`LinkHandle`](crate::LinkHandle) to the task over a
//! bounded channel. Adapter events, timer tokens and [`AppEvent`]s use
//! unbounded channels: they are produced from contexts that must never block
//! (adapter callbacks, timer tasks, the manager's observer).

use blelink_core::{AdapterEvent, ConnectionState, DeviceRecord, SessionConfig, TimerId};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

/// Operations requested of the link task
#[derive(Debug)]
pub enum Command {
    Scan,
    StopScan,
    Connect { session: SessionConfig },
    Reconnect,
    Disconnect,
    Send(Vec<u8>),
    GetState { reply: oneshot::Sender<ConnectionState> },
    GetDevices { reply: oneshot::Sender<Vec<DeviceRecord>> },
    Shutdown,
}

impl Command {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Scan => "scan",
            Command::StopScan => "stop_scan",
            Command::Connect { .. } => "connect",
            Command::Reconnect => "reconnect",
            Command::Disconnect => "disconnect",
            Command::Send(_) => "send",
            Command::GetState { .. } => "get_state",
            Command::GetDevices { .. } => "get_devices",
            Command::Shutdown => "shutdown",
        }
    }
}

// ----------------------------------------------------------------------------
// App Events
// ----------------------------------------------------------------------------

/// Observer notifications, delivered in the order the link produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    DevicesChanged(Vec<DeviceRecord>),
    StateChanged(ConnectionState),
    MessageReceived(Vec<u8>),
}

// ----------------------------------------------------------------------------
// Channel Types
// ----------------------------------------------------------------------------

pub type CommandSender = mpsc::Sender<Command>;
pub type CommandReceiver = mpsc::Receiver<Command>;
pub type AdapterEventSender = mpsc::UnboundedSender<AdapterEvent>;
pub type AdapterEventReceiver = mpsc::UnboundedReceiver<AdapterEvent>;
pub type AppEventSender = mpsc::UnboundedSender<AppEvent>;
pub type AppEventReceiver = mpsc::UnboundedReceiver<AppEvent>;
pub type TimerSender = mpsc::UnboundedSender<TimerId>;
pub type TimerReceiver = mpsc::UnboundedReceiver<TimerId>;

/// Channel sizing for the link task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Capacity of the command channel; senders wait when it is full
    pub command_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 64,
        }
    }
}

impl ChannelConfig {
    pub fn with_command_buffer_size(mut self, size: usize) -> Self {
        self.command_buffer_size = size.max(1);
        self
    }
}

pub fn create_command_channel(config: &ChannelConfig) -> (CommandSender, CommandReceiver) {
    mpsc::channel(config.command_buffer_size.max(1))
}

/// Channel an adapter pushes its events into
pub fn create_adapter_event_channel() -> (AdapterEventSender, AdapterEventReceiver) {
    mpsc::unbounded_channel()
}

pub fn create_app_event_channel() -> (AppEventSender, AppEventReceiver) {
    mpsc::unbounded_channel()
}

pub fn create_timer_channel() -> (TimerSender, TimerReceiver) {
    mpsc::unbounded_channel()
}
