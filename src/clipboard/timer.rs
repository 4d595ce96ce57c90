//! ClipMon - Single-shot timers
//!
//! Timers are plain deadlines owned by the monitor. The event loop sleeps until
//! the earliest one and then asks the monitor to fire whatever is due.

use std::time::{Duration, Instant};

/// Single-shot timer, rearmed by overwrite
#[derive(Debug, Clone)]
pub struct SingleShot {
    interval: Duration,
    deadline: Option<Instant>,
}

impl SingleShot {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// (Re)start the timer; any earlier deadline is replaced
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Armed and not yet fired
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and return true if the deadline has passed
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_overwrites_deadline() {
        let now = Instant::now();
        let mut timer = SingleShot::new(Duration::from_millis(100));
        timer.start(now);
        timer.start(now + Duration::from_millis(50));
        assert_eq!(timer.deadline(), Some(now + Duration::from_millis(150)));

        assert!(!timer.fire_if_due(now + Duration::from_millis(120)));
        assert!(timer.fire_if_due(now + Duration::from_millis(150)));
        assert!(!timer.is_active());
        assert!(!timer.fire_if_due(now + Duration::from_secs(1)));
    }
}
