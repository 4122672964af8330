//! btleplug adapter: command front, serial operation worker and event pump
//!
//! [`PlatformAdapter`] calls are synchronous and must not block, so the
//! adapter only queues an [`Operation`]. A single worker task executes
//! operations in submission order against btleplug and reports each outcome
//! as an [`AdapterEvent`]. A second task pumps the central's event stream
//! (discoveries, radio changes, unsolicited disconnects) into the same
//! channel.
//!
//! Dropping the adapter stops the event pump only. The worker finishes every
//! operation already queued (typically the final disconnect) and then exits;
//! [`BtleplugAdapter::close`] waits for that.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock as StdRwLock};

use blelink_core::{
    AdapterError, AdapterEvent, GattCharacteristic, GattService, PeripheralId, PlatformAdapter,
    PowerState, WriteKind,
};
use blelink_runtime::{create_adapter_event_channel, AdapterEventReceiver, AdapterEventSender};
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{Stream, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::BleAdapterConfig;
use crate::convert;
use crate::error::{BleError, BleResult};

type PeripheralMap = Arc<RwLock<HashMap<PeripheralId, Peripheral>>>;
type ConnectedSet = Arc<RwLock<HashSet<PeripheralId>>>;

/// Queued adapter request
#[derive(Debug)]
enum Operation {
    StartScan,
    StopScan,
    Connect(PeripheralId),
    Disconnect(PeripheralId),
    DiscoverServices(PeripheralId),
    DiscoverCharacteristics(PeripheralId, GattService),
    SetNotify(PeripheralId, GattCharacteristic, bool),
    Read(PeripheralId, GattCharacteristic),
    Write(PeripheralId, GattCharacteristic, Vec<u8>, WriteKind),
    /// Peripheral dropped the link on its own
    Release(PeripheralId),
}

fn write_type(kind: WriteKind) -> WriteType {
    match kind {
        WriteKind::WithResponse => WriteType::WithResponse,
        WriteKind::WithoutResponse => WriteType::WithoutResponse,
    }
}

fn emit(events: &AdapterEventSender, event: AdapterEvent) {
    if events.send(event).is_err() {
        debug!("Adapter event receiver dropped");
    }
}

/// Drop cached peripherals that are not connected
fn retain_connected<T>(
    peripherals: &mut HashMap<PeripheralId, T>,
    connected: &HashSet<PeripheralId>,
) {
    let before = peripherals.len();
    peripherals.retain(|id, _| connected.contains(id));
    if peripherals.len() < before {
        debug!("Evicted {} idle peripherals", before - peripherals.len());
    }
}

// ----------------------------------------------------------------------------
// Notification Pumps
// ----------------------------------------------------------------------------

/// One notification forwarding task per connected peripheral
#[derive(Default)]
struct NotificationPumps {
    pumps: HashMap<PeripheralId, JoinHandle<()>>,
}

impl NotificationPumps {
    fn insert(&mut self, id: PeripheralId, pump: JoinHandle<()>) {
        if let Some(previous) = self.pumps.insert(id, pump) {
            previous.abort();
        }
    }

    fn stop(&mut self, id: &PeripheralId) -> bool {
        match self.pumps.remove(id) {
            Some(pump) => {
                pump.abort();
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.pumps.len()
    }
}

impl Drop for NotificationPumps {
    fn drop(&mut self) {
        for (_, pump) in self.pumps.drain() {
            pump.abort();
        }
    }
}

// ----------------------------------------------------------------------------
// Adapter Front
// ----------------------------------------------------------------------------

/// [`PlatformAdapter`] backed by a btleplug central
pub struct BtleplugAdapter {
    power: Arc<StdRwLock<PowerState>>,
    operations: mpsc::UnboundedSender<Operation>,
    event_pump: JoinHandle<()>,
    worker: Option<JoinHandle<()>>,
}

impl BtleplugAdapter {
    /// Open the configured system adapter and start its background tasks
    ///
    /// The initial radio state is available from
    /// [`power_state`](PlatformAdapter::power_state); the returned receiver
    /// carries every later change.
    pub async fn open(config: BleAdapterConfig) -> BleResult<(Self, AdapterEventReceiver)> {
        let manager = Manager::new().await?;
        let mut adapters = manager.adapters().await?;
        if adapters.is_empty() {
            return Err(BleError::AdapterNotAvailable);
        }
        if config.adapter_index >= adapters.len() {
            return Err(BleError::AdapterIndexOutOfRange {
                index: config.adapter_index,
                available: adapters.len(),
            });
        }
        let central = adapters.swap_remove(config.adapter_index);

        let info = central
            .adapter_info()
            .await
            .unwrap_or_else(|_| "unknown adapter".to_string());
        let initial = match central.adapter_state().await {
            Ok(state) => convert::power_state(state),
            Err(e) => {
                warn!("Could not read radio state of {}: {}", info, e);
                PowerState::Unknown
            }
        };
        info!("BLE adapter {} initialized, radio {:?}", info, initial);

        let central_events = central
            .events()
            .await
            .map_err(|e| BleError::EventStreamFailed(e.to_string()))?;

        let (events, receiver) = create_adapter_event_channel();
        let (operations, operation_rx) = mpsc::unbounded_channel();
        let power = Arc::new(StdRwLock::new(initial));
        let peripherals: PeripheralMap = Arc::new(RwLock::new(HashMap::new()));
        let connected: ConnectedSet = Arc::new(RwLock::new(HashSet::new()));

        let pump = EventPump {
            central: central.clone(),
            power: power.clone(),
            peripherals: peripherals.clone(),
            connected: connected.clone(),
            events: events.clone(),
            operations: operations.downgrade(),
        };
        let worker = Worker {
            central,
            config,
            peripherals,
            connected,
            events,
            notification_pumps: NotificationPumps::default(),
        };

        Ok((
            Self {
                power,
                operations,
                event_pump: tokio::spawn(pump.run(central_events)),
                worker: Some(tokio::spawn(worker.run(operation_rx))),
            },
            receiver,
        ))
    }

    /// Stop accepting operations and wait until the queued ones have run
    pub async fn close(mut self) {
        let worker = self.worker.take();
        drop(self);

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Adapter worker ended abnormally: {}", e);
            }
        }
    }

    fn submit(&self, operation: Operation) {
        if let Err(e) = self.operations.send(operation) {
            error!("{}: dropping {:?}", BleError::WorkerStopped, e.0);
        }
    }
}

impl Drop for BtleplugAdapter {
    fn drop(&mut self) {
        self.event_pump.abort();
    }
}

impl PlatformAdapter for BtleplugAdapter {
    fn power_state(&self) -> PowerState {
        self.power.read().map(|p| *p).unwrap_or_default()
    }

    fn start_scan(&mut self) {
        self.submit(Operation::StartScan);
    }

    fn stop_scan(&mut self) {
        self.submit(Operation::StopScan);
    }

    fn connect(&mut self, peripheral: &PeripheralId) {
        self.submit(Operation::Connect(peripheral.clone()));
    }

    fn cancel_connection(&mut self, peripheral: &PeripheralId) {
        self.submit(Operation::Disconnect(peripheral.clone()));
    }

    fn discover_services(&mut self, peripheral: &PeripheralId) {
        self.submit(Operation::DiscoverServices(peripheral.clone()));
    }

    fn discover_characteristics(&mut self, peripheral: &PeripheralId, service: &GattService) {
        self.submit(Operation::DiscoverCharacteristics(
            peripheral.clone(),
            service.clone(),
        ));
    }

    fn set_notify(
        &mut self,
        peripheral: &PeripheralId,
        characteristic: &GattCharacteristic,
        enabled: bool,
    ) {
        self.submit(Operation::SetNotify(
            peripheral.clone(),
            characteristic.clone(),
            enabled,
        ));
    }

    fn read_value(&mut self, peripheral: &PeripheralId, characteristic: &GattCharacteristic) {
        self.submit(Operation::Read(peripheral.clone(), characteristic.clone()));
    }

    fn write_value(
        &mut self,
        peripheral: &PeripheralId,
        characteristic: &GattCharacteristic,
        value: &[u8],
        kind: WriteKind,
    ) {
        self.submit(Operation::Write(
            peripheral.clone(),
            characteristic.clone(),
            value.to_vec(),
            kind,
        ));
    }
}

// ----------------------------------------------------------------------------
// Event Pump
// ----------------------------------------------------------------------------

struct EventPump {
    central: Adapter,
    power: Arc<StdRwLock<PowerState>>,
    peripherals: PeripheralMap,
    connected: ConnectedSet,
    events: AdapterEventSender,
    operations: mpsc::WeakUnboundedSender<Operation>,
}

impl EventPump {
    async fn run<S>(self, mut stream: S)
    where
        S: Stream<Item = CentralEvent> + Unpin,
    {
        while let Some(event) = stream.next().await {
            self.handle(event).await;
        }
        warn!("Central event stream ended");
    }

    async fn handle(&self, event: CentralEvent) {
        match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                self.report_device(&id).await;
            }
            CentralEvent::DeviceDisconnected(id) => {
                let key = convert::peripheral_id(&id);
                // Explicit disconnects are reported by the worker
                if self.connected.write().await.remove(&key) {
                    warn!("Peripheral {} dropped the connection", key);
                    if let Some(operations) = self.operations.upgrade() {
                        // Best effort; a closed queue means the worker is gone
                        let _ = operations.send(Operation::Release(key.clone()));
                    }
                    emit(
                        &self.events,
                        AdapterEvent::Disconnected {
                            id: key,
                            error: None,
                        },
                    );
                }
            }
            CentralEvent::StateUpdate(state) => {
                let power = convert::power_state(state);
                if let Ok(mut current) = self.power.write() {
                    *current = power;
                }
                info!("Radio state changed: {:?}", power);
                emit(&self.events, AdapterEvent::PowerStateChanged(power));
            }
            _ => {}
        }
    }

    async fn report_device(&self, id: &btleplug::platform::PeripheralId) {
        let peripheral = match self.central.peripheral(id).await {
            Ok(p) => p,
            Err(e) => {
                debug!("Discovered peripheral {:?} vanished: {}", id, e);
                return;
            }
        };
        let properties = match peripheral.properties().await {
            Ok(Some(properties)) => properties,
            Ok(None) => return,
            Err(e) => {
                debug!("No properties for {:?}: {}", id, e);
                return;
            }
        };

        let key = convert::peripheral_id(id);
        self.peripherals
            .write()
            .await
            .insert(key.clone(), peripheral);
        emit(
            &self.events,
            AdapterEvent::DeviceDiscovered {
                id: key,
                advertisement: convert::advertisement(&properties),
            },
        );
    }
}

// ----------------------------------------------------------------------------
// Operation Worker
// ----------------------------------------------------------------------------

struct Worker {
    central: Adapter,
    config: BleAdapterConfig,
    peripherals: PeripheralMap,
    connected: ConnectedSet,
    events: AdapterEventSender,
    notification_pumps: NotificationPumps,
}

impl Worker {
    async fn run(mut self, mut operations: mpsc::UnboundedReceiver<Operation>) {
        while let Some(operation) = operations.recv().await {
            self.execute(operation).await;
        }
        debug!(
            "Adapter worker stopped, releasing {} notification pumps",
            self.notification_pumps.len()
        );
    }

    async fn execute(&mut self, operation: Operation) {
        match operation {
            Operation::StartScan => {
                let connected = self.connected.read().await;
                retain_connected(&mut *self.peripherals.write().await, &connected);
                drop(connected);

                let filter = ScanFilter {
                    services: self.config.scan_services.clone(),
                };
                match self.central.start_scan(filter).await {
                    Ok(()) => info!("Started BLE scanning"),
                    Err(e) => error!("Failed to start BLE scan: {}", e),
                }
            }
            Operation::StopScan => {
                // Stopping an idle scan is routine; some backends report it as an error
                if let Err(e) = self.central.stop_scan().await {
                    debug!("Stop scan: {}", e);
                }
            }
            Operation::Connect(id) => match self.connect(&id).await {
                Ok(()) => {
                    info!("Connected to {}", id);
                    emit(&self.events, AdapterEvent::Connected(id));
                }
                Err(e) => {
                    error!("Failed to connect to {}: {}", id, e);
                    emit(
                        &self.events,
                        AdapterEvent::ConnectFailed {
                            id,
                            error: Some(e.into()),
                        },
                    );
                }
            },
            Operation::Disconnect(id) => self.disconnect(id).await,
            Operation::Release(id) => {
                // A queued reconnect may already have re-established the link
                if !self.connected.read().await.contains(&id) {
                    self.notification_pumps.stop(&id);
                    self.peripherals.write().await.remove(&id);
                    debug!("Released {}", id);
                }
            }
            Operation::DiscoverServices(id) => {
                let result = self.discover_services(&id).await.map_err(AdapterError::from);
                emit(&self.events, AdapterEvent::ServicesDiscovered { id, result });
            }
            Operation::DiscoverCharacteristics(id, service) => {
                let result = self
                    .characteristics_of(&id, &service)
                    .await
                    .map_err(AdapterError::from);
                emit(
                    &self.events,
                    AdapterEvent::CharacteristicsDiscovered {
                        id,
                        service,
                        result,
                    },
                );
            }
            Operation::SetNotify(id, characteristic, enabled) => {
                if let Err(e) = self.set_notify(&id, &characteristic, enabled).await {
                    error!(
                        "Failed to set notify={} on {}: {}",
                        enabled, characteristic.uuid, e
                    );
                }
            }
            Operation::Read(id, characteristic) => {
                let result = self
                    .read(&id, &characteristic)
                    .await
                    .map_err(AdapterError::from);
                emit(
                    &self.events,
                    AdapterEvent::ValueUpdated {
                        characteristic,
                        result,
                    },
                );
            }
            Operation::Write(id, characteristic, value, kind) => {
                let result = self.write(&id, &characteristic, &value, kind).await;
                match kind {
                    WriteKind::WithResponse => emit(
                        &self.events,
                        AdapterEvent::WriteConfirmed {
                            characteristic,
                            error: result.err().map(AdapterError::from),
                        },
                    ),
                    WriteKind::WithoutResponse => {
                        if let Err(e) = result {
                            warn!("Write to {} failed: {}", characteristic.uuid, e);
                        }
                    }
                }
            }
        }
    }

    async fn peripheral(&self, id: &PeripheralId) -> BleResult<Peripheral> {
        if let Some(peripheral) = self.peripherals.read().await.get(id) {
            return Ok(peripheral.clone());
        }

        // Not seen in a scan yet; the platform may still know it
        for peripheral in self.central.peripherals().await? {
            let key = convert::peripheral_id(&peripheral.id());
            if &key == id {
                self.peripherals
                    .write()
                    .await
                    .insert(key, peripheral.clone());
                return Ok(peripheral);
            }
        }

        Err(BleError::PeripheralNotFound { id: id.to_string() })
    }

    async fn connect(&mut self, id: &PeripheralId) -> BleResult<()> {
        let peripheral = self.peripheral(id).await?;

        if !peripheral.is_connected().await.unwrap_or(false) {
            timeout(self.config.connection_timeout, peripheral.connect())
                .await
                .map_err(|_| BleError::ConnectionTimeout)??;
        }

        self.connected.write().await.insert(id.clone());
        self.start_notification_pump(id, &peripheral).await
    }

    async fn disconnect(&mut self, id: PeripheralId) {
        self.notification_pumps.stop(&id);
        if !self.connected.write().await.remove(&id) {
            debug!("{} not connected; nothing to cancel", id);
            return;
        }

        let error = match self.peripheral(&id).await {
            Ok(peripheral) => peripheral
                .disconnect()
                .await
                .err()
                .map(|e| AdapterError::from(BleError::from(e))),
            Err(e) => Some(e.into()),
        };
        info!("Disconnected from {}", id);
        emit(&self.events, AdapterEvent::Disconnected { id, error });
    }

    async fn start_notification_pump(
        &mut self,
        id: &PeripheralId,
        peripheral: &Peripheral,
    ) -> BleResult<()> {
        let mut notifications = peripheral.notifications().await?;
        let events = self.events.clone();
        let source = peripheral.clone();
        let key = id.clone();

        let pump = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                debug!(
                    "Notification from {} on {}: {}",
                    key,
                    notification.uuid,
                    hex::encode(&notification.value)
                );
                let characteristic = source
                    .characteristics()
                    .iter()
                    .find(|c| c.uuid == notification.uuid)
                    .map(convert::characteristic)
                    .unwrap_or_else(|| GattCharacteristic::new(notification.uuid, Uuid::nil()));

                let event = AdapterEvent::ValueUpdated {
                    characteristic,
                    result: Ok(notification.value),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            debug!("Notification pump for {} ended", key);
        });

        self.notification_pumps.insert(id.clone(), pump);
        Ok(())
    }

    async fn discover_services(&self, id: &PeripheralId) -> BleResult<Vec<GattService>> {
        let peripheral = self.peripheral(id).await?;
        peripheral.discover_services().await?;

        let services: Vec<GattService> =
            peripheral.services().iter().map(convert::service).collect();
        debug!("{} exposes {} services", id, services.len());
        Ok(services)
    }

    /// btleplug discovers characteristics together with services
    async fn characteristics_of(
        &self,
        id: &PeripheralId,
        service: &GattService,
    ) -> BleResult<Vec<GattCharacteristic>> {
        let peripheral = self.peripheral(id).await?;
        let found = peripheral
            .services()
            .into_iter()
            .find(|s| s.uuid == service.uuid)
            .ok_or(BleError::ServiceNotFound { uuid: service.uuid })?;

        Ok(found
            .characteristics
            .iter()
            .map(convert::characteristic)
            .collect())
    }

    async fn characteristic(
        &self,
        id: &PeripheralId,
        characteristic: &GattCharacteristic,
    ) -> BleResult<(Peripheral, Characteristic)> {
        let peripheral = self.peripheral(id).await?;
        let found = peripheral
            .characteristics()
            .into_iter()
            .find(|c| {
                c.uuid == characteristic.uuid && c.service_uuid == characteristic.service_uuid
            })
            .ok_or(BleError::CharacteristicNotFound {
                uuid: characteristic.uuid,
            })?;
        Ok((peripheral, found))
    }

    async fn set_notify(
        &self,
        id: &PeripheralId,
        characteristic: &GattCharacteristic,
        enabled: bool,
    ) -> BleResult<()> {
        let (peripheral, target) = self.characteristic(id, characteristic).await?;
        if enabled {
            peripheral.subscribe(&target).await?;
        } else {
            peripheral.unsubscribe(&target).await?;
        }
        Ok(())
    }

    async fn read(
        &self,
        id: &PeripheralId,
        characteristic: &GattCharacteristic,
    ) -> BleResult<Vec<u8>> {
        let (peripheral, target) = self.characteristic(id, characteristic).await?;
        Ok(peripheral.read(&target).await?)
    }

    async fn write(
        &self,
        id: &PeripheralId,
        characteristic: &GattCharacteristic,
        value: &[u8],
        kind: WriteKind,
    ) -> BleResult<()> {
        let (peripheral, target) = self.characteristic(id, characteristic).await?;
        peripheral.write(&target, value, write_type(kind)).await?;
        debug!("Wrote {} bytes to {}", value.len(), characteristic.uuid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;

    #[test]
    fn test_write_kind_maps_to_write_type() {
        assert_eq!(write_type(WriteKind::WithResponse), WriteType::WithResponse);
        assert_eq!(
            write_type(WriteKind::WithoutResponse),
            WriteType::WithoutResponse
        );
    }

    type Executed = Arc<Mutex<Vec<Operation>>>;

    /// Adapter front whose worker records operations after yielding once each
    fn recording_adapter() -> (BtleplugAdapter, Executed, oneshot::Receiver<()>) {
        let (operations, mut operation_rx) = mpsc::unbounded_channel();
        let executed: Executed = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = oneshot::channel();

        let record = executed.clone();
        let worker = tokio::spawn(async move {
            while let Some(operation) = operation_rx.recv().await {
                tokio::task::yield_now().await;
                record.lock().unwrap().push(operation);
            }
            let _ = done_tx.send(());
        });

        let adapter = BtleplugAdapter {
            power: Arc::new(StdRwLock::new(PowerState::PoweredOn)),
            operations,
            event_pump: tokio::spawn(std::future::pending()),
            worker: Some(worker),
        };
        (adapter, executed, done_rx)
    }

    #[tokio::test]
    async fn test_close_runs_queued_disconnect() {
        let (mut adapter, executed, _done) = recording_adapter();
        let id = PeripheralId::new("AA:BB:CC:DD:EE:01");

        adapter.stop_scan();
        adapter.cancel_connection(&id);
        adapter.close().await;

        let executed = executed.lock().unwrap();
        assert_eq!(executed.len(), 2);
        assert!(matches!(executed[0], Operation::StopScan));
        assert!(matches!(&executed[1], Operation::Disconnect(p) if *p == id));
    }

    #[tokio::test]
    async fn test_drop_lets_worker_drain_queue() {
        let (mut adapter, executed, done) = recording_adapter();
        let id = PeripheralId::new("AA:BB:CC:DD:EE:01");

        adapter.cancel_connection(&id);
        drop(adapter);

        assert!(done.await.is_ok(), "worker was aborted instead of draining");
        assert!(matches!(
            executed.lock().unwrap().as_slice(),
            [Operation::Disconnect(_)]
        ));
    }

    #[tokio::test]
    async fn test_stopped_notification_pump_is_aborted() {
        let mut pumps = NotificationPumps::default();
        let id = PeripheralId::new("AA:BB:CC:DD:EE:01");
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        pumps.insert(
            id.clone(),
            tokio::spawn(async move {
                let _alive = alive_tx;
                std::future::pending::<()>().await;
            }),
        );

        assert!(pumps.stop(&id));
        assert!(!pumps.stop(&id));
        assert_eq!(pumps.len(), 0);
        // Sender dropped with the aborted task
        assert!(alive_rx.await.is_err());
    }

    #[tokio::test]
    async fn test_replaced_notification_pump_is_aborted() {
        let mut pumps = NotificationPumps::default();
        let id = PeripheralId::new("AA:BB:CC:DD:EE:01");
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        pumps.insert(
            id.clone(),
            tokio::spawn(async move {
                let _alive = alive_tx;
                std::future::pending::<()>().await;
            }),
        );

        pumps.insert(id, tokio::spawn(async {}));

        assert_eq!(pumps.len(), 1);
        assert!(alive_rx.await.is_err());
    }

    #[test]
    fn test_scan_start_evicts_idle_peripherals() {
        let connected_id = PeripheralId::new("AA:BB:CC:DD:EE:01");
        let mut peripherals: HashMap<PeripheralId, ()> = HashMap::new();
        peripherals.insert(connected_id.clone(), ());
        peripherals.insert(PeripheralId::new("AA:BB:CC:DD:EE:02"), ());
        peripherals.insert(PeripheralId::new("AA:BB:CC:DD:EE:03"), ());
        let connected = HashSet::from([connected_id.clone()]);

        retain_connected(&mut peripherals, &connected);

        assert_eq!(peripherals.len(), 1);
        assert!(peripherals.contains_key(&connected_id));
    }
}
