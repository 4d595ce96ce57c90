//! ClipMon - Clipboard monitoring module
//!
//! Reacts to OS change notifications for each target: deduplicates by
//! fingerprint, optionally mirrors between clipboard and selection, and queues
//! real changes for the server. Remote content is applied through the
//! throttler in `throttle.rs`, which shares this state.
//!
//! Everything here runs on one thread, one event at a time. The `self_write`
//! flag is therefore enough to recognise notifications caused by our own
//! writes; it needs no lock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::fingerprint::{compute_fingerprint, Fingerprint};
use super::models::{Snapshot, Target};
use super::platform::ClipboardBackend;
use super::throttle::ApplyThrottle;
use super::timer::SingleShot;
use crate::config::Settings;

/// Policy the monitor applies, taken from the settings
#[derive(Debug, Clone)]
pub struct MonitorPolicy {
    pub formats: Vec<String>,
    pub check_clipboard: bool,
    pub check_selection: bool,
    pub copy_clipboard: bool,
    pub copy_selection: bool,
    pub noise_max_chars: usize,
    pub settle_delay: Duration,
    pub throttle_window: Duration,
}

impl From<&Settings> for MonitorPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            formats: settings.formats.clone(),
            check_clipboard: settings.check_clipboard,
            check_selection: settings.check_selection,
            copy_clipboard: settings.copy_clipboard,
            copy_selection: settings.copy_selection,
            noise_max_chars: settings.noise_max_chars,
            settle_delay: settings.settle_delay(),
            throttle_window: settings.throttle_window(),
        }
    }
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Per-process monitor state
#[derive(Debug, Default)]
pub(crate) struct MonitorState {
    /// Last fingerprint seen or applied, per target
    last: [Fingerprint; 2],
    /// True exactly while this process writes to an OS buffer
    self_write: bool,
}

/// Clipboard monitor
pub struct ClipboardMonitor<B: ClipboardBackend> {
    backend: B,
    policy: MonitorPolicy,
    pub(crate) state: MonitorState,
    settle: SingleShot,
    pub(crate) throttle: ApplyThrottle,
    outgoing: VecDeque<Snapshot>,
}

impl<B: ClipboardBackend> ClipboardMonitor<B> {
    /// Create a new monitor
    pub fn new(backend: B, policy: MonitorPolicy) -> Self {
        let settle = SingleShot::new(policy.settle_delay);
        let throttle = ApplyThrottle::new(policy.throttle_window);
        Self {
            backend,
            policy,
            state: MonitorState::default(),
            settle,
            throttle,
            outgoing: VecDeque::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn policy(&self) -> &MonitorPolicy {
        &self.policy
    }

    /// Last recorded fingerprint for `target`
    pub fn last_fingerprint(&self, target: Target) -> Fingerprint {
        self.state.last[target.index()]
    }

    /// Fingerprint of a snapshot under the configured format priority
    pub fn fingerprint(&self, snapshot: &Snapshot) -> Fingerprint {
        compute_fingerprint(snapshot, &self.policy.formats)
    }

    /// Targets the platform provides
    pub fn targets(&self) -> Vec<Target> {
        if self.backend.has_selection() {
            vec![Target::Clipboard, Target::Selection]
        } else {
            vec![Target::Clipboard]
        }
    }

    /// Whether notifications for `target` are acted upon
    pub fn is_watching(&self, target: Target) -> bool {
        match target {
            Target::Clipboard => self.policy.check_clipboard,
            Target::Selection => self.policy.check_selection && self.backend.has_selection(),
        }
    }

    /// Initial check of every watched target, seeding the fingerprints
    pub fn start(&mut self, now: Instant) {
        log::info!(
            "[Monitor] Started (clipboard: {}, selection: {})",
            self.is_watching(Target::Clipboard),
            self.is_watching(Target::Selection)
        );
        self.on_clipboard_changed(Target::Selection, now);
        self.on_clipboard_changed(Target::Clipboard, now);
    }

    /// One notification for every watched target
    ///
    /// The platform adapters have no change callback, so the event loop calls
    /// this on every poll tick.
    pub fn poll(&mut self, now: Instant) {
        for target in self.targets() {
            self.on_clipboard_changed(target, now);
        }
    }

    /// Handle an OS change notification for `target`
    pub fn on_clipboard_changed(&mut self, target: Target, now: Instant) {
        if self.state.self_write || !self.is_watching(target) {
            return;
        }

        if target == Target::Selection {
            // Duplicates while a re-check is pending are dropped
            if self.settle.is_active() {
                return;
            }
            if self.backend.is_selection_settling() {
                log::trace!("[Monitor] Selection still being made, deferring");
                self.settle.start(now);
                return;
            }
        }

        self.check(target, now);
    }

    fn check(&mut self, target: Target, now: Instant) {
        let snapshot = self.backend.read_snapshot(target);
        let fingerprint = self.fingerprint(&snapshot);

        if fingerprint == self.last_fingerprint(target) {
            return;
        }

        let other = target.other();
        if self.mirrors(target) && fingerprint != self.last_fingerprint(other) {
            log::debug!(
                "[Monitor] Mirroring {} -> {} ({})",
                target.as_str(),
                other.as_str(),
                fingerprint.short()
            );
            let mirrored = snapshot.filtered(&self.policy.formats);
            self.write_target(other, &mirrored, fingerprint, now);
        }

        if !self.is_notable(&snapshot) {
            log::trace!("[Monitor] Ignoring trivial {} change", target.as_str());
            return;
        }

        log::debug!(
            "[Monitor] New content in {}: {} format(s), {} bytes, hash: {}",
            target.as_str(),
            snapshot.len(),
            snapshot.byte_len(),
            fingerprint.short()
        );
        self.state.last[target.index()] = fingerprint;
        self.outgoing.push_back(snapshot.filtered(&self.policy.formats));
    }

    fn mirrors(&self, from: Target) -> bool {
        if !self.backend.has_selection() {
            return false;
        }
        match from {
            Target::Clipboard => self.policy.copy_clipboard,
            Target::Selection => self.policy.copy_selection,
        }
    }

    /// Worth forwarding to the server
    ///
    /// Empty or single-character text is noise (a keystroke, an empty
    /// selection) whatever else accompanies it. Anything without text is
    /// notable, a cleared clipboard included.
    pub fn is_notable(&self, snapshot: &Snapshot) -> bool {
        match snapshot.text() {
            Some(text) => text.chars().count() > self.policy.noise_max_chars,
            None => true,
        }
    }

    /// Write to an OS buffer with `self_write` held, then record the fingerprint
    ///
    /// Change notifications the backend raises during the write are delivered
    /// before the flag drops, so they are ignored.
    pub(crate) fn write_target(
        &mut self,
        target: Target,
        snapshot: &Snapshot,
        fingerprint: Fingerprint,
        now: Instant,
    ) {
        self.state.self_write = true;
        self.backend.write_snapshot(target, snapshot);
        for changed in self.backend.take_changes() {
            self.on_clipboard_changed(changed, now);
        }
        self.state.self_write = false;
        self.state.last[target.index()] = fingerprint;
    }

    /// True while a self-write is in progress
    pub fn is_applying(&self) -> bool {
        self.state.self_write
    }

    /// Earliest armed timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.settle.deadline(), self.throttle.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer whose deadline has passed
    pub fn fire_timers(&mut self, now: Instant) {
        if self.settle.fire_if_due(now) {
            self.on_clipboard_changed(Target::Selection, now);
        }
        if self.throttle.window_elapsed(now) {
            self.apply_pending(now);
        }
    }

    /// Next snapshot to send to the server
    pub fn pop_outgoing(&mut self) -> Option<Snapshot> {
        self.outgoing.pop_front()
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }
}
