//! Message channel over the bound characteristics

use tracing::{debug, warn};

use super::LinkManager;
use crate::adapter::PlatformAdapter;
use crate::errors::AdapterError;
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::types::GattCharacteristic;

impl<A, O, S> LinkManager<A, O, S>
where
    A: PlatformAdapter,
    O: Observer,
    S: Scheduler,
{
    /// Write `message` to the output characteristic
    ///
    /// Silently does nothing until a peripheral and an output characteristic
    /// are bound.
    pub fn send(&mut self, message: &[u8]) {
        let (Some(peripheral), Some(output)) = (&self.peripheral, &self.channel.output) else {
            debug!("Send of {} bytes dropped: no output characteristic", message.len());
            return;
        };

        debug!("Writing {} bytes to {}", message.len(), output.uuid);
        self.adapter
            .write_value(peripheral, output, message, self.config.write_kind);
    }

    pub(crate) fn on_write_confirmed(
        &mut self,
        characteristic: GattCharacteristic,
        err: Option<AdapterError>,
    ) {
        match err {
            Some(e) => warn!("Write to {} failed: {}", characteristic.uuid, e),
            None => debug!("Write to {} confirmed", characteristic.uuid),
        }
    }

    /// Forward input characteristic values to the observer, whatever the state
    pub(crate) fn on_value_updated(
        &mut self,
        characteristic: GattCharacteristic,
        result: Result<Vec<u8>, AdapterError>,
    ) {
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                warn!("Read from {} failed: {}", characteristic.uuid, e);
                return;
            }
        };

        let is_input = self
            .session
            .as_ref()
            .is_some_and(|s| s.input_uuid == characteristic.uuid);
        if !is_input {
            debug!("Value from unbound characteristic {} ignored", characteristic.uuid);
            return;
        }

        debug!("Received {} bytes: {}", value.len(), hex::encode(&value));
        self.observer.on_message_received(&value);
    }
}
