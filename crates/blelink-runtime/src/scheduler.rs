//! Tokio-backed single-shot timers

use std::collections::HashMap;
use std::time::Duration;

use blelink_core::{Scheduler, TimerId};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::channels::TimerSender;

/// Each armed timer is a spawned sleep that posts its token back to the
/// link task; cancelling aborts the sleep.
///
/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    sender: TimerSender,
    timers: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(sender: TimerSender) -> Self {
        Self {
            sender,
            timers: HashMap::new(),
        }
    }

    /// Number of timers that have not fired or been cancelled
    pub fn armed(&self) -> usize {
        self.timers.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.timers.retain(|_, handle| !handle.is_finished());

        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(id);
        });

        debug!("Armed {} for {:?}", id, delay);
        if let Some(previous) = self.timers.insert(id, handle) {
            previous.abort();
        }
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(&id) {
            debug!("Cancelled {}", id);
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::create_timer_channel;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = create_timer_channel();
        let mut scheduler = TokioScheduler::new(tx);

        scheduler.schedule(TimerId::new(7), Duration::from_secs(60));

        assert_eq!(rx.recv().await, Some(TimerId::new(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = create_timer_channel();
        let mut scheduler = TokioScheduler::new(tx);

        scheduler.schedule(TimerId::new(1), Duration::from_secs(5));
        scheduler.cancel(TimerId::new(1));
        scheduler.schedule(TimerId::new(2), Duration::from_secs(10));

        assert_eq!(rx.recv().await, Some(TimerId::new(2)));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.armed(), 0);
    }
}
