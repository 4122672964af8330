//! Injected timer capability
//!
//! The link manager arms at most one timer (the scan timeout). When a timer
//! fires, its owner must call
//! [`LinkManager::on_timer_fired`](crate::LinkManager::on_timer_fired) with the
//! same [`TimerId`] on the manager's serialized context.

use std::fmt;
use std::time::Duration;

/// Token identifying one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Single-shot timer service
pub trait Scheduler: Send {
    /// Arm a timer that fires once after `delay`
    fn schedule(&mut self, id: TimerId, delay: Duration);

    /// Disarm a timer; cancelling a fired or unknown timer is a no-op
    fn cancel(&mut self, id: TimerId);
}
