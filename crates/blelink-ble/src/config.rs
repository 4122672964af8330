//! Adapter configuration

use std::time::Duration;

use uuid::Uuid;

/// Configuration for [`BtleplugAdapter`](crate::BtleplugAdapter)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BleAdapterConfig {
    /// Which system adapter to use, in btleplug's enumeration order
    pub adapter_index: usize,
    /// Upper bound on a single connection attempt
    pub connection_timeout: Duration,
    /// Services to filter scans by; empty scans for everything
    pub scan_services: Vec<Uuid>,
}

impl Default for BleAdapterConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            connection_timeout: Duration::from_secs(10),
            scan_services: Vec::new(),
        }
    }
}

impl BleAdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Only report peripherals advertising one of `services`
    pub fn with_scan_services(mut self, services: Vec<Uuid>) -> Self {
        self.scan_services = services;
        self
    }
}
