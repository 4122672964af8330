//! Link task: the serialized context that owns the link manager

use blelink_core::{LinkManager, PlatformAdapter};
use tracing::{debug, info, warn};

use crate::channels::{AdapterEventReceiver, Command, CommandReceiver, TimerReceiver};
use crate::observer::ChannelObserver;
use crate::scheduler::TokioScheduler;

/// Link manager as driven by the runtime
pub type RuntimeLink<A> = LinkManager<A, ChannelObserver, TokioScheduler>;

// ----------------------------------------------------------------------------
// Link Task
// ----------------------------------------------------------------------------

/// Actor that applies commands, adapter events and timer firings one at a time
pub struct LinkTask<A: PlatformAdapter> {
    link: RuntimeLink<A>,
    command_receiver: CommandReceiver,
    adapter_events: AdapterEventReceiver,
    timer_receiver: TimerReceiver,
    /// Adapter stream still open
    adapter_open: bool,
}

impl<A: PlatformAdapter> LinkTask<A> {
    pub fn new(
        link: RuntimeLink<A>,
        command_receiver: CommandReceiver,
        adapter_events: AdapterEventReceiver,
        timer_receiver: TimerReceiver,
    ) -> Self {
        Self {
            link,
            command_receiver,
            adapter_events,
            timer_receiver,
            adapter_open: true,
        }
    }

    /// Run until [`Command::Shutdown`] or until every handle is dropped
    ///
    /// On exit any running scan is stopped and the current connection is
    /// cancelled. The manager is returned for inspection.
    pub async fn run(mut self) -> RuntimeLink<A> {
        info!("Link task starting in state {}", self.link.state());

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(Command::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(cmd) => self.process_command(cmd),
                        None => {
                            info!("Command channel closed, shutting down");
                            break;
                        }
                    }
                }

                event = self.adapter_events.recv(), if self.adapter_open => {
                    match event {
                        Some(evt) => self.link.handle_event(evt),
                        None => {
                            // Commands are still served; nothing will answer them
                            warn!("Adapter event stream closed");
                            self.adapter_open = false;
                        }
                    }
                }

                Some(timer) = self.timer_receiver.recv() => {
                    self.link.on_timer_fired(timer);
                }
            }
        }

        self.link.stop_scan();
        self.link.disconnect();
        info!("Link task stopped in state {}", self.link.state());
        self.link
    }

    fn process_command(&mut self, command: Command) {
        debug!("Link command: {}", command.name());

        match command {
            Command::Scan => self.link.scan(),
            Command::StopScan => self.link.stop_scan(),
            Command::Connect { session } => self.link.connect_session(session),
            Command::Reconnect => {
                if let Err(e) = self.link.reconnect() {
                    warn!("Reconnect ignored: {}", e);
                }
            }
            Command::Disconnect => self.link.disconnect(),
            Command::Send(bytes) => self.link.send(&bytes),
            Command::GetState { reply } => {
                let _ = reply.send(self.link.state());
            }
            Command::GetDevices { reply } => {
                let _ = reply.send(self.link.discovered_devices().to_vec());
            }
            // Handled by the run loop
            Command::Shutdown => {}
        }
    }
}
