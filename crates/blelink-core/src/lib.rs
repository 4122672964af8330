//! blelink core: central-role link to a single BLE peripheral
//!
//! This crate holds the platform-independent part of the link: the connection
//! state machine, the scan and connection sessions, the two-phase GATT
//! discovery walk and the opaque message channel. It performs no I/O itself.
//!
//! ## Architecture
//!
//! - [`state`] - [`ConnectionState`], [`PowerState`] and the state holder
//! - [`types`] - peripheral identities, device records, session and bound handles
//! - [`adapter`] - the [`PlatformAdapter`] seam and its [`AdapterEvent`]s
//! - [`observer`] - the [`Observer`] sink
//! - [`scheduler`] - the injected single-shot timer capability
//! - [`LinkManager`] - the single owner of all session state
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut link = LinkManager::new(adapter, observer, scheduler, LinkConfig::default());
//! link.scan();
//! // feed every adapter event back on the same task:
//! link.handle_event(event);
//! link.connect(peripheral, service_uuid, output_uuid, input_uuid);
//! link.send(b"ping");
//! ```

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod adapter;
pub mod config;
pub mod errors;
pub mod gatt_uuid;
mod manager;
pub mod observer;
pub mod scheduler;
pub mod state;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use adapter::{AdapterEvent, PlatformAdapter};
pub use config::{LinkConfig, DEFAULT_SCAN_TIMEOUT};
pub use errors::{AdapterError, LinkError, LinkResult};
pub use gatt_uuid::{parse_uuid, uuid_from_u16, uuid_from_u32, BLUETOOTH_BASE_UUID};
pub use manager::LinkManager;
pub use observer::Observer;
pub use scheduler::{Scheduler, TimerId};
pub use state::{ConnectionState, PowerState, StateMachine};
pub use types::{
    Advertisement, BoundChannel, DeviceRecord, GattCharacteristic, GattService, PeripheralId,
    SessionConfig, WriteKind,
};
