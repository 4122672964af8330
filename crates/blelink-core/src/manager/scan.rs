//! Scan session: scan lifecycle, device accumulation and timeout

use tracing::{debug, info};

use super::LinkManager;
use crate::adapter::PlatformAdapter;
use crate::observer::Observer;
use crate::scheduler::{Scheduler, TimerId};
use crate::state::ConnectionState;
use crate::types::{Advertisement, DeviceRecord, PeripheralId};

impl<A, O, S> LinkManager<A, O, S>
where
    A: PlatformAdapter,
    O: Observer,
    S: Scheduler,
{
    /// Start a fresh scan
    ///
    /// Always ends any prior scan and any existing connection first, and
    /// empties the device list. Scanning only starts while the radio is on;
    /// otherwise the state reflects the reported radio state.
    pub fn scan(&mut self) {
        self.stop_scan();
        self.disconnect();

        self.devices = Some(Vec::new());

        let power = self.adapter.power_state();
        if !power.is_on() {
            info!("Radio not powered on ({:?}), scan not started", power);
            self.transition(power.into());
            return;
        }

        info!("Starting scan for peripherals");
        self.adapter.start_scan();
        self.transition(ConnectionState::Scanning);
        self.arm_scan_timer();
    }

    /// Stop scanning; idempotent
    ///
    /// Flips `Scanning` to `ScanTimedOut` whether the stop comes from the
    /// timeout or the caller.
    pub fn stop_scan(&mut self) {
        debug!("Stopping scan");
        self.cancel_scan_timer();
        self.adapter.stop_scan();

        if self.state() == ConnectionState::Scanning {
            self.transition(ConnectionState::ScanTimedOut);
        }
    }

    /// Timer callback from the scheduler
    pub fn on_timer_fired(&mut self, id: TimerId) {
        if self.scan_timer != Some(id) {
            debug!("Ignoring stale {}", id);
            return;
        }

        info!("Scan timed out after {:?}", self.config.scan_timeout);
        self.scan_timer = None;
        self.stop_scan();
    }

    pub(crate) fn on_device_discovered(&mut self, id: PeripheralId, advertisement: Advertisement) {
        let Some(devices) = self.devices.as_mut() else {
            debug!("Discovery of {} outside a scan session ignored", id);
            return;
        };

        if let Some(existing) = devices.iter_mut().find(|record| record.id == id) {
            existing.advertisement = advertisement;
            return;
        }

        debug!(
            "Discovered peripheral {} ({})",
            id,
            advertisement.local_name.as_deref().unwrap_or("unnamed")
        );
        devices.push(DeviceRecord::new(id, advertisement));
        self.observer.on_discovered_devices_changed(devices);
    }

    fn arm_scan_timer(&mut self) {
        self.cancel_scan_timer();

        let id = self.last_timer.next();
        self.last_timer = id;
        self.scan_timer = Some(id);
        self.scheduler.schedule(id, self.config.scan_timeout);
    }

    fn cancel_scan_timer(&mut self) {
        if let Some(id) = self.scan_timer.take() {
            self.scheduler.cancel(id);
        }
    }
}
