//! blelink runtime: tokio actor around the link manager
//!
//! [`LinkManager`](blelink_core::LinkManager) is a plain single-threaded state
//! machine. This crate gives it a home: a [`LinkTask`] that owns the manager
//! and serializes commands, adapter events and timer firings through one
//! `tokio::select!` loop, plus a cloneable [`LinkHandle`] for callers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (adapter, adapter_events) = BtleplugAdapter::open(config).await?;
//! let mut runtime = LinkRuntimeBuilder::new()
//!     .with_link_config(LinkConfig::default())
//!     .spawn(adapter, adapter_events);
//!
//! runtime.handle.scan().await?;
//! while let Some(event) = runtime.app_events.recv().await { /* ... */ }
//! ```

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod builder;
pub mod channels;
pub mod error;
pub mod handle;
pub mod observer;
pub mod scheduler;
pub mod task;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use builder::{LinkRuntime, LinkRuntimeBuilder};
pub use channels::{
    create_adapter_event_channel, AdapterEventReceiver, AdapterEventSender, AppEvent,
    AppEventReceiver, ChannelConfig, Command,
};
pub use error::{RuntimeError, RuntimeResult};
pub use handle::LinkHandle;
pub use observer::ChannelObserver;
pub use scheduler::TokioScheduler;
pub use task::{LinkTask, RuntimeLink};
