//! ClipMon - In-memory clipboard backend
//!
//! Stands in for the OS in tests. Every read and write is
//! recorded so callers can assert on exactly what the monitor touched.

use super::ClipboardBackend;
use crate::clipboard::models::{Snapshot, Target};

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    clipboard: Snapshot,
    selection: Option<Snapshot>,
    settling: bool,
    notify_on_write: bool,
    changes: Vec<Target>,
    reads: Vec<Target>,
    writes: Vec<(Target, Snapshot)>,
}

impl MemoryBackend {
    /// Backend with only a `Clipboard` target
    pub fn single_target() -> Self {
        Self::default()
    }

    /// Backend with both `Clipboard` and `Selection`
    pub fn with_selection() -> Self {
        Self {
            selection: Some(Snapshot::new()),
            ..Self::default()
        }
    }

    /// Simulate another application changing a target
    pub fn set_content(&mut self, target: Target, snapshot: Snapshot) {
        match target {
            Target::Clipboard => self.clipboard = snapshot,
            Target::Selection => {
                if let Some(selection) = self.selection.as_mut() {
                    *selection = snapshot;
                }
            }
        }
    }

    pub fn content(&self, target: Target) -> Option<&Snapshot> {
        match target {
            Target::Clipboard => Some(&self.clipboard),
            Target::Selection => self.selection.as_ref(),
        }
    }

    /// Simulate a held mouse button / Shift key
    pub fn set_settling(&mut self, settling: bool) {
        self.settling = settling;
    }

    /// Report a change notification for every write, as callback-driven
    /// platforms do
    pub fn set_notify_on_write(&mut self, notify: bool) {
        self.notify_on_write = notify;
    }

    /// Notifications raised by writes and not yet taken
    pub fn pending_changes(&self) -> &[Target] {
        &self.changes
    }

    pub fn reads(&self) -> &[Target] {
        &self.reads
    }

    pub fn writes(&self) -> &[(Target, Snapshot)] {
        &self.writes
    }

    pub fn writes_to(&self, target: Target) -> Vec<&Snapshot> {
        self.writes
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, s)| s)
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.reads.clear();
        self.writes.clear();
    }
}

impl ClipboardBackend for MemoryBackend {
    fn read_snapshot(&mut self, target: Target) -> Snapshot {
        self.reads.push(target);
        self.content(target).cloned().unwrap_or_default()
    }

    fn write_snapshot(&mut self, target: Target, snapshot: &Snapshot) {
        self.writes.push((target, snapshot.clone()));
        self.set_content(target, snapshot.clone());
        if self.notify_on_write {
            self.changes.push(target);
        }
    }

    fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    fn is_selection_settling(&mut self) -> bool {
        self.has_selection() && self.settling
    }

    fn take_changes(&mut self) -> Vec<Target> {
        std::mem::take(&mut self.changes)
    }
}
