//! btleplug platform adapter for blelink
//!
//! [`BtleplugAdapter`] implements [`PlatformAdapter`](blelink_core::PlatformAdapter)
//! on top of the host's Bluetooth stack through `btleplug`.
//!
//! ## Architecture
//!
//! - [`config`] - adapter selection, connect timeout and scan filter
//! - [`error`] - [`BleError`] and its conversion into adapter errors
//! - [`convert`] - translation of btleplug types into link types
//! - [`adapter`] - the adapter front, a serial operation worker and the
//!   central event pump
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blelink_ble::{BleAdapterConfig, BtleplugAdapter};
//! use blelink_runtime::LinkRuntimeBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (adapter, adapter_events) = BtleplugAdapter::open(BleAdapterConfig::default()).await?;
//! let runtime = LinkRuntimeBuilder::new().spawn(adapter, adapter_events);
//! runtime.handle.scan().await?;
//! # Ok(())
//! # }
//! ```

mod adapter;
pub mod config;
pub mod convert;
mod error;

pub use adapter::BtleplugAdapter;
pub use config::BleAdapterConfig;
pub use error::{BleError, BleResult};
