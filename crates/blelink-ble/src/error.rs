//! Error types for the btleplug adapter

use blelink_core::AdapterError;
use thiserror::Error;
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum BleError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("BLE adapter index {index} out of range ({available} available)")]
    AdapterIndexOutOfRange { index: usize, available: usize },

    #[error("Failed to get BLE events: {0}")]
    EventStreamFailed(String),

    #[error("Peripheral not found: {id}")]
    PeripheralNotFound { id: String },

    #[error("Service not found: {uuid}")]
    ServiceNotFound { uuid: Uuid },

    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound { uuid: Uuid },

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Adapter worker stopped")]
    WorkerStopped,

    #[error("BLE error: {0}")]
    Btleplug(#[from] btleplug::Error),
}

pub type BleResult<T> = Result<T, BleError>;

impl From<BleError> for AdapterError {
    fn from(err: BleError) -> Self {
        AdapterError::new(err.to_string())
    }
}
