//! Discovery pipeline: service match, then characteristic match

use tracing::{debug, error, info, warn};

use super::LinkManager;
use crate::adapter::PlatformAdapter;
use crate::errors::AdapterError;
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::state::ConnectionState;
use crate::types::{GattCharacteristic, GattService, PeripheralId};

impl<A, O, S> LinkManager<A, O, S>
where
    A: PlatformAdapter,
    O: Observer,
    S: Scheduler,
{
    /// Bind the first service matching the session's service UUID
    ///
    /// When nothing matches, the state stays `DiscoveringServices`.
    pub(crate) fn on_services_discovered(
        &mut self,
        id: PeripheralId,
        result: Result<Vec<GattService>, AdapterError>,
    ) {
        if self.is_stale(&id) {
            return;
        }

        let services = match result {
            Ok(services) => services,
            Err(e) => {
                error!("Service discovery on {} failed: {}", id, e);
                self.transition(ConnectionState::ServiceDiscoveryFailed);
                return;
            }
        };
        debug!("Discovered {} services on {}", services.len(), id);

        let Some(wanted) = self.session.as_ref().map(|s| s.service_uuid) else {
            warn!("Services discovered without a session, ignoring");
            return;
        };

        let Some(service) = services.into_iter().find(|s| s.uuid == wanted) else {
            warn!("Service {} not offered by {}", wanted, id);
            return;
        };

        info!("Bound service {}, discovering characteristics", service.uuid);
        self.channel.service = Some(service.clone());
        self.transition(ConnectionState::DiscoveringCharacteristics);
        self.adapter.discover_characteristics(&id, &service);
    }

    /// Bind the output and input characteristics
    ///
    /// Entries are matched in order and matching stops as soon as both roles
    /// are bound. The input characteristic gets notifications enabled and an
    /// immediate read.
    pub(crate) fn on_characteristics_discovered(
        &mut self,
        id: PeripheralId,
        service: GattService,
        result: Result<Vec<GattCharacteristic>, AdapterError>,
    ) {
        if self.is_stale(&id) {
            return;
        }
        if self.channel.service.as_ref() != Some(&service) {
            debug!("Ignoring characteristics of unbound service {}", service.uuid);
            return;
        }

        let characteristics = match result {
            Ok(characteristics) => characteristics,
            Err(e) => {
                error!("Characteristic discovery on {} failed: {}", service.uuid, e);
                self.transition(ConnectionState::CharacteristicDiscoveryFailed);
                return;
            }
        };
        debug!(
            "Discovered {} characteristics on service {}",
            characteristics.len(),
            service.uuid
        );

        let Some((output_uuid, input_uuid)) = self
            .session
            .as_ref()
            .map(|s| (s.output_uuid, s.input_uuid))
        else {
            warn!("Characteristics discovered without a session, ignoring");
            return;
        };

        for characteristic in characteristics {
            if characteristic.uuid == output_uuid {
                debug!("Bound output characteristic {}", characteristic.uuid);
                self.channel.output = Some(characteristic.clone());
            }
            if characteristic.uuid == input_uuid {
                debug!("Bound input characteristic {}", characteristic.uuid);
                self.adapter.set_notify(&id, &characteristic, true);
                self.adapter.read_value(&id, &characteristic);
                self.channel.input = Some(characteristic);
            }
            if self.channel.is_usable() {
                info!("Channel ready on {}", id);
                self.transition(ConnectionState::Ready);
                return;
            }
        }

        warn!(
            "Service {} lacks a required characteristic (output bound: {}, input bound: {})",
            service.uuid,
            self.channel.output.is_some(),
            self.channel.input.is_some()
        );
    }
}
