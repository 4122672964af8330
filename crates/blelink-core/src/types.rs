//! Core data model: peripheral identities, advertisement snapshots, the
//! negotiated session and the characteristic handles bound to it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Peripheral Identity
// ----------------------------------------------------------------------------

/// Platform-assigned peripheral identity
///
/// A MAC address on Linux and Windows, a CoreBluetooth UUID on macOS. The core
/// only compares identities; it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeripheralId(String);

impl PeripheralId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeripheralId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeripheralId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ----------------------------------------------------------------------------
// Scan Results
// ----------------------------------------------------------------------------

/// Advertisement data seen for a peripheral during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub local_name: Option<String>,
    pub rssi: Option<i16>,
    pub tx_power_level: Option<i16>,
    pub services: Vec<Uuid>,
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
    pub service_data: HashMap<Uuid, Vec<u8>>,
}

/// A peripheral discovered during the current scan session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: PeripheralId,
    /// Most recent advertisement snapshot
    pub advertisement: Advertisement,
}

impl DeviceRecord {
    pub fn new(id: PeripheralId, advertisement: Advertisement) -> Self {
        Self { id, advertisement }
    }

    /// Advertised name, if any
    pub fn name(&self) -> Option<&str> {
        self.advertisement.local_name.as_deref()
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// Target peripheral plus the three negotiated UUIDs
///
/// Constructed only with all four parts present; partial sessions are
/// rejected before they reach the link manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub peripheral: PeripheralId,
    pub service_uuid: Uuid,
    /// Characteristic the central writes to
    pub output_uuid: Uuid,
    /// Characteristic the central reads from and subscribes to
    pub input_uuid: Uuid,
}

impl SessionConfig {
    pub fn new(
        peripheral: PeripheralId,
        service_uuid: Uuid,
        output_uuid: Uuid,
        input_uuid: Uuid,
    ) -> Self {
        Self {
            peripheral,
            service_uuid,
            output_uuid,
            input_uuid,
        }
    }
}

// ----------------------------------------------------------------------------
// GATT Handles
// ----------------------------------------------------------------------------

/// Service reported by the adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GattService {
    pub uuid: Uuid,
    pub primary: bool,
}

/// Characteristic property bits, as defined by the Core Specification
pub mod char_props {
    pub const BROADCAST: u8 = 0x01;
    pub const READ: u8 = 0x02;
    pub const WRITE_WITHOUT_RESPONSE: u8 = 0x04;
    pub const WRITE: u8 = 0x08;
    pub const NOTIFY: u8 = 0x10;
    pub const INDICATE: u8 = 0x20;
}

/// Characteristic reported by the adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GattCharacteristic {
    pub uuid: Uuid,
    pub service_uuid: Uuid,
    /// Property bits, see [`char_props`]
    pub properties: u8,
}

impl GattCharacteristic {
    pub fn new(uuid: Uuid, service_uuid: Uuid) -> Self {
        Self {
            uuid,
            service_uuid,
            properties: 0,
        }
    }

    pub fn with_properties(mut self, properties: u8) -> Self {
        self.properties = properties;
        self
    }
}

/// How a write is issued to the peripheral
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    /// Acknowledged write; the adapter reports a write confirmation
    #[default]
    WithResponse,
    WithoutResponse,
}

/// Handles resolved by service and characteristic discovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundChannel {
    pub service: Option<GattService>,
    pub output: Option<GattCharacteristic>,
    pub input: Option<GattCharacteristic>,
}

impl BoundChannel {
    /// Both characteristic roles are bound
    pub fn is_usable(&self) -> bool {
        self.output.is_some() && self.input.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
