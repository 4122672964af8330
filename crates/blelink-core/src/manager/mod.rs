//! Link manager: the single owner of all session state
//!
//! [`LinkManager`] ties the state machine, scan session, connection session,
//! discovery pipeline and message channel together. It is a plain struct with
//! no interior locking; the caller must funnel public operations, adapter
//! events and timer firings through one serialized context (see
//! `blelink-runtime` for the tokio actor that does this).

mod channel;
mod connection;
mod discovery;
mod scan;

use tracing::{debug, info};

use crate::adapter::{AdapterEvent, PlatformAdapter};
use crate::config::LinkConfig;
use crate::observer::Observer;
use crate::scheduler::{Scheduler, TimerId};
use crate::state::{ConnectionState, PowerState, StateMachine};
use crate::types::{BoundChannel, DeviceRecord, PeripheralId, SessionConfig};

// ----------------------------------------------------------------------------
// Link Manager
// ----------------------------------------------------------------------------

/// Central-role link to one BLE peripheral
pub struct LinkManager<A, O, S> {
    adapter: A,
    observer: O,
    scheduler: S,
    config: LinkConfig,
    machine: StateMachine,
    /// Devices seen in the open scan session; `None` once a connect closes it
    devices: Option<Vec<DeviceRecord>>,
    /// Armed scan timeout, if any
    scan_timer: Option<TimerId>,
    last_timer: TimerId,
    session: Option<SessionConfig>,
    peripheral: Option<PeripheralId>,
    channel: BoundChannel,
}

impl<A, O, S> LinkManager<A, O, S>
where
    A: PlatformAdapter,
    O: Observer,
    S: Scheduler,
{
    /// Create a manager whose initial state mirrors the adapter's radio state
    pub fn new(adapter: A, observer: O, scheduler: S, config: LinkConfig) -> Self {
        let mut machine = StateMachine::new();
        machine.set(adapter.power_state().into());

        Self {
            adapter,
            observer,
            scheduler,
            config,
            machine,
            devices: None,
            scan_timer: None,
            last_timer: TimerId::new(0),
            session: None,
            peripheral: None,
            channel: BoundChannel::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.machine.current()
    }

    /// Devices discovered in the current scan session, in first-seen order
    pub fn discovered_devices(&self) -> &[DeviceRecord] {
        self.devices.as_deref().unwrap_or(&[])
    }

    pub fn session_config(&self) -> Option<&SessionConfig> {
        self.session.as_ref()
    }

    pub fn bound_channel(&self) -> &BoundChannel {
        &self.channel
    }

    /// Peripheral targeted by the current or last connection
    pub fn peripheral(&self) -> Option<&PeripheralId> {
        self.peripheral.as_ref()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Consume the manager, handing back its adapter
    pub fn into_adapter(self) -> A {
        self.adapter
    }

    // ------------------------------------------------------------------------
    // State Machine
    // ------------------------------------------------------------------------

    /// Move to `to` and notify the observer
    pub(crate) fn transition(&mut self, to: ConnectionState) {
        let from = self.machine.set(to);
        info!("Link state: {} -> {}", from, to);
        self.observer.on_connection_state_changed(to);
    }

    /// Radio power changes override the current state unconditionally
    pub fn on_power_state_changed(&mut self, power: PowerState) {
        debug!("Radio power state reported: {:?}", power);
        self.transition(power.into());
    }

    // ------------------------------------------------------------------------
    // Event Dispatch
    // ------------------------------------------------------------------------

    /// Apply one adapter event
    pub fn handle_event(&mut self, event: AdapterEvent) {
        debug!("Adapter event: {}", event.name());

        match event {
            AdapterEvent::PowerStateChanged(power) => self.on_power_state_changed(power),
            AdapterEvent::DeviceDiscovered { id, advertisement } => {
                self.on_device_discovered(id, advertisement)
            }
            AdapterEvent::Connected(id) => self.on_connected(id),
            AdapterEvent::ConnectFailed { id, error } => self.on_connect_failed(id, error),
            AdapterEvent::Disconnected { id, error } => self.on_disconnected(id, error),
            AdapterEvent::ServicesDiscovered { id, result } => {
                self.on_services_discovered(id, result)
            }
            AdapterEvent::CharacteristicsDiscovered {
                id,
                service,
                result,
            } => self.on_characteristics_discovered(id, service, result),
            AdapterEvent::WriteConfirmed {
                characteristic,
                error,
            } => self.on_write_confirmed(characteristic, error),
            AdapterEvent::ValueUpdated {
                characteristic,
                result,
            } => self.on_value_updated(characteristic, result),
        }
    }

    /// Event concerns a peripheral other than the current one
    fn is_stale(&self, id: &PeripheralId) -> bool {
        match &self.peripheral {
            Some(current) if current != id => {
                debug!("Ignoring event for stale peripheral {} (current {})", id, current);
                true
            }
            Some(_) => false,
            None => {
                debug!("Ignoring event for {} with no peripheral attached", id);
                true
            }
        }
    }
}
