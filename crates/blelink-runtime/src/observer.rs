//! Observer that forwards link activity as [`AppEvent`]s

use blelink_core::{ConnectionState, DeviceRecord, Observer};
use tracing::debug;

use crate::channels::{AppEvent, AppEventSender};

/// Pushes every notification onto an unbounded channel
///
/// Once the receiver is gone, notifications are dropped; the link keeps
/// running.
pub struct ChannelObserver {
    sender: AppEventSender,
    receiver_gone: bool,
}

impl ChannelObserver {
    pub fn new(sender: AppEventSender) -> Self {
        Self {
            sender,
            receiver_gone: false,
        }
    }

    fn forward(&mut self, event: AppEvent) {
        if self.sender.send(event).is_err() && !self.receiver_gone {
            debug!("App event receiver dropped; discarding further notifications");
            self.receiver_gone = true;
        }
    }
}

impl Observer for ChannelObserver {
    fn on_discovered_devices_changed(&mut self, devices: &[DeviceRecord]) {
        self.forward(AppEvent::DevicesChanged(devices.to_vec()));
    }

    fn on_connection_state_changed(&mut self, state: ConnectionState) {
        self.forward(AppEvent::StateChanged(state));
    }

    fn on_message_received(&mut self, message: &[u8]) {
        self.forward(AppEvent::MessageReceived(message.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::create_app_event_channel;

    #[test]
    fn test_events_forwarded_in_order() {
        let (tx, mut rx) = create_app_event_channel();
        let mut observer = ChannelObserver::new(tx);

        observer.on_connection_state_changed(ConnectionState::Scanning);
        observer.on_message_received(b"hi");

        assert_eq!(
            rx.try_recv().unwrap(),
            AppEvent::StateChanged(ConnectionState::Scanning)
        );
        assert_eq!(rx.try_recv().unwrap(), AppEvent::MessageReceived(b"hi".to_vec()));
    }

    #[test]
    fn test_dropped_receiver_is_tolerated() {
        let (tx, rx) = create_app_event_channel();
        let mut observer = ChannelObserver::new(tx);
        drop(rx);

        observer.on_connection_state_changed(ConnectionState::Ready);
        observer.on_message_received(b"lost");

        assert!(observer.receiver_gone);
    }
}
