//! Platform adapter seam
//!
//! The link manager drives the radio exclusively through [`PlatformAdapter`].
//! Every call returns immediately; its outcome arrives later as an
//! [`AdapterEvent`] that the owner feeds back into
//! [`LinkManager::handle_event`](crate::LinkManager::handle_event) on the same
//! serialized context as the public operations.

use crate::errors::AdapterError;
use crate::state::PowerState;
use crate::types::{
    Advertisement, GattCharacteristic, GattService, PeripheralId, WriteKind,
};

// ----------------------------------------------------------------------------
// Adapter Commands
// ----------------------------------------------------------------------------

/// Central- and peripheral-role operations of a BLE platform
pub trait PlatformAdapter: Send {
    /// Radio state as last reported by the platform
    fn power_state(&self) -> PowerState;

    /// Start scanning for all peripherals
    fn start_scan(&mut self);

    fn stop_scan(&mut self);

    /// Request a connection; answered by `Connected` or `ConnectFailed`
    fn connect(&mut self, peripheral: &PeripheralId);

    /// Tear down or abort a connection; answered by `Disconnected`
    fn cancel_connection(&mut self, peripheral: &PeripheralId);

    /// Answered by `ServicesDiscovered`
    fn discover_services(&mut self, peripheral: &PeripheralId);

    /// Answered by `CharacteristicsDiscovered`
    fn discover_characteristics(&mut self, peripheral: &PeripheralId, service: &GattService);

    fn set_notify(
        &mut self,
        peripheral: &PeripheralId,
        characteristic: &GattCharacteristic,
        enabled: bool,
    );

    /// Answered by `ValueUpdated`
    fn read_value(&mut self, peripheral: &PeripheralId, characteristic: &GattCharacteristic);

    /// Answered by `WriteConfirmed` for [`WriteKind::WithResponse`]
    fn write_value(
        &mut self,
        peripheral: &PeripheralId,
        characteristic: &GattCharacteristic,
        value: &[u8],
        kind: WriteKind,
    );
}

// ----------------------------------------------------------------------------
// Adapter Events
// ----------------------------------------------------------------------------

/// Asynchronous notifications from a platform adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    PowerStateChanged(PowerState),
    DeviceDiscovered {
        id: PeripheralId,
        advertisement: Advertisement,
    },
    Connected(PeripheralId),
    ConnectFailed {
        id: PeripheralId,
        error: Option<AdapterError>,
    },
    Disconnected {
        id: PeripheralId,
        error: Option<AdapterError>,
    },
    ServicesDiscovered {
        id: PeripheralId,
        result: Result<Vec<GattService>, AdapterError>,
    },
    CharacteristicsDiscovered {
        id: PeripheralId,
        service: GattService,
        result: Result<Vec<GattCharacteristic>, AdapterError>,
    },
    WriteConfirmed {
        characteristic: GattCharacteristic,
        error: Option<AdapterError>,
    },
    ValueUpdated {
        characteristic: GattCharacteristic,
        result: Result<Vec<u8>, AdapterError>,
    },
}

impl AdapterEvent {
    /// Event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AdapterEvent::PowerStateChanged(_) => "PowerStateChanged",
            AdapterEvent::DeviceDiscovered { .. } => "DeviceDiscovered",
            AdapterEvent::Connected(_) => "Connected",
            AdapterEvent::ConnectFailed { .. } => "ConnectFailed",
            AdapterEvent::Disconnected { .. } => "Disconnected",
            AdapterEvent::ServicesDiscovered { .. } => "ServicesDiscovered",
            AdapterEvent::CharacteristicsDiscovered { .. } => "CharacteristicsDiscovered",
            AdapterEvent::WriteConfirmed { .. } => "WriteConfirmed",
            AdapterEvent::ValueUpdated { .. } => "ValueUpdated",
        }
    }
}
