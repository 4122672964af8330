//! Connection session: connect, reconnect and disconnect

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::LinkManager;
use crate::adapter::PlatformAdapter;
use crate::errors::{AdapterError, LinkError, LinkResult};
use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::state::ConnectionState;
use crate::types::{PeripheralId, SessionConfig};

impl<A, O, S> LinkManager<A, O, S>
where
    A: PlatformAdapter,
    O: Observer,
    S: Scheduler,
{
    /// Store a new session and connect to it
    ///
    /// The session replaces any previous one and is reused by every later
    /// [`reconnect`](Self::reconnect).
    pub fn connect(
        &mut self,
        peripheral: PeripheralId,
        service_uuid: Uuid,
        output_uuid: Uuid,
        input_uuid: Uuid,
    ) {
        self.connect_session(SessionConfig::new(
            peripheral,
            service_uuid,
            output_uuid,
            input_uuid,
        ));
    }

    /// [`connect`](Self::connect) with a prebuilt session
    pub fn connect_session(&mut self, session: SessionConfig) {
        debug!("Session configured for {}", session.peripheral);
        self.session = Some(session);
        self.devices = None;

        // A stored session is always complete
        let _ = self.reconnect();
    }

    /// Connect again using the stored session
    ///
    /// Without a session this changes nothing and reports
    /// [`LinkError::MissingSessionConfig`].
    pub fn reconnect(&mut self) -> LinkResult<()> {
        let Some(target) = self.session.as_ref().map(|s| s.peripheral.clone()) else {
            warn!("Reconnect requested without a session; call connect first");
            return Err(LinkError::MissingSessionConfig);
        };

        self.stop_scan();
        self.disconnect();
        self.channel.clear();

        info!("Connecting to peripheral {}", target);
        self.adapter.connect(&target);
        self.peripheral = Some(target);
        self.transition(ConnectionState::Connecting);
        Ok(())
    }

    /// Cancel the connection to the current peripheral, if there is one
    ///
    /// The state changes only once the adapter reports the disconnect.
    pub fn disconnect(&mut self) {
        match &self.peripheral {
            Some(peripheral) => {
                debug!("Cancelling connection to {}", peripheral);
                self.adapter.cancel_connection(peripheral);
            }
            None => debug!("Disconnect requested with no peripheral"),
        }
    }

    pub(crate) fn on_connected(&mut self, id: PeripheralId) {
        info!("Connected to {}, discovering services", id);
        self.channel.clear();

        self.adapter.discover_services(&id);
        self.peripheral = Some(id);
        self.transition(ConnectionState::DiscoveringServices);
    }

    pub(crate) fn on_connect_failed(&mut self, id: PeripheralId, err: Option<AdapterError>) {
        match err {
            Some(e) => error!("Failed to connect to {}: {}", id, e),
            None => error!("Failed to connect to {}", id),
        }
        self.transition(ConnectionState::ConnectFailed);
    }

    /// Solicited or not, a disconnect always lands in `Disconnected`
    pub(crate) fn on_disconnected(&mut self, id: PeripheralId, err: Option<AdapterError>) {
        match err {
            Some(e) => warn!("Peripheral {} disconnected: {}", id, e),
            None => info!("Peripheral {} disconnected", id),
        }
        self.channel.clear();
        self.transition(ConnectionState::Disconnected);
    }
}
