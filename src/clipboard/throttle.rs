//! ClipMon - Remote content applier
//!
//! Items from the server are written to the OS buffers at a bounded rate.
//! Within a throttle window only the latest item survives; earlier ones are
//! replaced, never queued.

use std::time::{Duration, Instant};

use super::models::Item;
use super::monitor::ClipboardMonitor;
use super::platform::ClipboardBackend;
use super::timer::SingleShot;

#[derive(Debug)]
pub(crate) struct ApplyThrottle {
    /// Latest remote item not yet written
    pending: Option<Item>,
    window: SingleShot,
}

impl ApplyThrottle {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            pending: None,
            window: SingleShot::new(window),
        }
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.window.deadline()
    }

    pub(crate) fn window_elapsed(&mut self, now: Instant) -> bool {
        self.window.fire_if_due(now)
    }
}

impl<B: ClipboardBackend> ClipboardMonitor<B> {
    /// Handle an item decoded from the server
    pub fn receive_item(&mut self, item: Item, now: Instant) {
        self.submit(item, now, false);
    }

    /// Handle an item that must be applied even inside a throttle window
    pub fn receive_item_forced(&mut self, item: Item, now: Instant) {
        self.submit(item, now, true);
    }

    /// Item waiting for the current throttle window to end
    pub fn pending_item(&self) -> Option<&Item> {
        self.throttle.pending.as_ref()
    }

    /// Whether remote updates are currently being coalesced
    pub fn is_throttling(&self) -> bool {
        self.throttle.window.is_active()
    }

    fn submit(&mut self, item: Item, now: Instant, force: bool) {
        let fingerprint = self.fingerprint(&item);
        let current_everywhere = self
            .targets()
            .into_iter()
            .all(|target| self.last_fingerprint(target) == fingerprint);
        if current_everywhere {
            log::trace!("[Throttle] Item {} already in clipboard", fingerprint.short());
            return;
        }

        if self.throttle.pending.replace(item).is_some() {
            log::trace!("[Throttle] Superseded pending item");
        }

        if !force && self.throttle.window.is_active() {
            log::debug!("[Throttle] Deferring item {}", fingerprint.short());
            return;
        }

        self.apply_now(now);
    }

    fn apply_now(&mut self, now: Instant) {
        let Some(item) = self.throttle.pending.take() else {
            return;
        };
        let fingerprint = self.fingerprint(&item);

        for target in self.targets() {
            if self.last_fingerprint(target) != fingerprint {
                log::debug!(
                    "[Throttle] Applying {} to {}",
                    fingerprint.short(),
                    target.as_str()
                );
                self.write_target(target, &item, fingerprint, now);
            }
        }

        self.throttle.window.start(now);
    }

    /// Throttle window ended: re-submit whatever arrived meanwhile
    pub(crate) fn apply_pending(&mut self, now: Instant) {
        if let Some(item) = self.throttle.pending.take() {
            self.submit(item, now, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::clipboard::models::{Snapshot, Target};
    use crate::clipboard::monitor::{ClipboardMonitor, MonitorPolicy};
    use crate::clipboard::platform::MemoryBackend;
    use std::time::{Duration, Instant};

    fn monitor() -> ClipboardMonitor<MemoryBackend> {
        ClipboardMonitor::new(MemoryBackend::with_selection(), MonitorPolicy::default())
    }

    #[test]
    fn first_item_is_applied_to_both_targets() {
        let mut m = monitor();
        let item = Snapshot::from_text("remote");
        m.receive_item(item.clone(), Instant::now());

        assert_eq!(m.backend().writes_to(Target::Clipboard), vec![&item]);
        assert_eq!(m.backend().writes_to(Target::Selection), vec![&item]);
        assert!(m.is_throttling());
        assert!(!m.is_applying());
    }

    #[test]
    fn only_differing_targets_are_written() {
        let mut m = monitor();
        let now = Instant::now();
        let item = Snapshot::from_text("same");

        // Selection already holds the item and has been seen
        m.backend_mut().set_content(Target::Selection, item.clone());
        m.on_clipboard_changed(Target::Selection, now);
        m.pop_outgoing();

        m.receive_item(item.clone(), now);
        assert_eq!(m.backend().writes_to(Target::Clipboard).len(), 1);
        assert!(m.backend().writes_to(Target::Selection).is_empty());
    }

    #[test]
    fn forced_item_skips_the_window() {
        let mut m = monitor();
        let now = Instant::now();
        m.receive_item(Snapshot::from_text("one"), now);
        m.receive_item_forced(Snapshot::from_text("two"), now + Duration::from_millis(10));

        assert_eq!(m.backend().writes_to(Target::Clipboard).len(), 2);
        assert!(m.pending_item().is_none());
    }

    #[test]
    fn expired_window_without_pending_does_nothing() {
        let mut m = monitor();
        let now = Instant::now();
        m.receive_item(Snapshot::from_text("one"), now);
        m.backend_mut().clear_log();

        m.fire_timers(now + Duration::from_millis(500));
        assert!(m.backend().writes().is_empty());
        assert!(!m.is_throttling());
    }
}
