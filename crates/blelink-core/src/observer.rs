//! Observer sink for link activity
//!
//! Deliveries are synchronous and ordered: the link manager calls the observer
//! from its own serialized context, in the order the underlying changes
//! happen.

use crate::state::ConnectionState;
use crate::types::DeviceRecord;

/// Receiver of device lists, state transitions and inbound messages
pub trait Observer: Send {
    /// Full snapshot of the devices discovered in the current scan
    fn on_discovered_devices_changed(&mut self, devices: &[DeviceRecord]);

    fn on_connection_state_changed(&mut self, state: ConnectionState);

    /// Bytes received on the input characteristic, verbatim
    fn on_message_received(&mut self, message: &[u8]);
}
