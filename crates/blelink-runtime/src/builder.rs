//! Runtime builder: wires channels, observer and scheduler around an adapter

use blelink_core::{LinkConfig, LinkManager, PlatformAdapter};
use tokio::task::JoinHandle;
use tracing::info;

use crate::channels::{
    create_app_event_channel, create_command_channel, create_timer_channel, AdapterEventReceiver,
    AppEventReceiver, ChannelConfig,
};
use crate::handle::LinkHandle;
use crate::observer::ChannelObserver;
use crate::scheduler::TokioScheduler;
use crate::task::{LinkTask, RuntimeLink};

// ----------------------------------------------------------------------------
// Runtime Builder
// ----------------------------------------------------------------------------

/// Builder for a running link task
#[derive(Debug, Clone, Default)]
pub struct LinkRuntimeBuilder {
    link_config: LinkConfig,
    channel_config: ChannelConfig,
}

impl LinkRuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link_config(mut self, config: LinkConfig) -> Self {
        self.link_config = config;
        self
    }

    pub fn with_channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Spawn the link task on the current tokio runtime
    ///
    /// `adapter_events` must be the stream the adapter reports into. The
    /// initial state is taken from [`PlatformAdapter::power_state`].
    pub fn spawn<A>(self, adapter: A, adapter_events: AdapterEventReceiver) -> LinkRuntime<A>
    where
        A: PlatformAdapter + 'static,
    {
        let (command_sender, command_receiver) = create_command_channel(&self.channel_config);
        let (app_event_sender, app_events) = create_app_event_channel();
        let (timer_sender, timer_receiver) = create_timer_channel();

        let link = LinkManager::new(
            adapter,
            ChannelObserver::new(app_event_sender),
            TokioScheduler::new(timer_sender),
            self.link_config,
        );
        info!(
            "Spawning link task (scan timeout {:?}, command buffer {})",
            link.config().scan_timeout,
            self.channel_config.command_buffer_size
        );

        let task = LinkTask::new(link, command_receiver, adapter_events, timer_receiver);
        let join = tokio::spawn(task.run());

        LinkRuntime {
            handle: LinkHandle::new(command_sender),
            app_events,
            join,
        }
    }
}

/// Handles to a spawned link task
pub struct LinkRuntime<A: PlatformAdapter> {
    pub handle: LinkHandle,
    pub app_events: AppEventReceiver,
    /// Resolves to the manager once the task exits
    pub join: JoinHandle<RuntimeLink<A>>,
}
