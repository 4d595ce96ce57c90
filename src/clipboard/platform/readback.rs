//! ClipMon - Read-back of our own writes
//!
//! The OS does not always hand back the bytes we wrote: images are stored
//! decoded and re-encoded on every read. Remembering what a read returned
//! right after a write lets later reads of that same content map back to
//! the snapshot actually written, keeping its fingerprint stable.

use crate::clipboard::models::{Snapshot, Target};

/// Per-target pairs of (content as read back, content as written)
#[derive(Debug, Default)]
pub struct ReadBack {
    entries: [Option<(Snapshot, Snapshot)>; 2],
}

impl ReadBack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `target` reads as `observed` after writing `written`
    pub fn record(&mut self, target: Target, observed: Snapshot, written: &Snapshot) {
        self.entries[target.index()] = Some((observed, written.clone()));
    }

    pub fn forget(&mut self, target: Target) {
        self.entries[target.index()] = None;
    }

    /// Map freshly read content back to what we wrote, if it is still ours
    pub fn resolve(&mut self, target: Target, observed: Snapshot) -> Snapshot {
        let index = target.index();
        if let Some((seen, written)) = &self.entries[index] {
            if *seen == observed {
                return written.clone();
            }
            // Someone else wrote since
            self.entries[index] = None;
        }
        observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::models::{MIME_PNG, MIME_TEXT};

    #[test]
    fn own_content_reads_as_written() {
        let mut readback = ReadBack::new();
        let written = Snapshot::new().with(MIME_PNG, vec![1, 2, 3]);
        let reencoded = Snapshot::new().with(MIME_PNG, vec![9, 9, 9, 9]);

        readback.record(Target::Clipboard, reencoded.clone(), &written);
        assert_eq!(readback.resolve(Target::Clipboard, reencoded.clone()), written);
        assert_eq!(readback.resolve(Target::Clipboard, reencoded), written);
    }

    #[test]
    fn foreign_content_clears_the_entry() {
        let mut readback = ReadBack::new();
        let written = Snapshot::new().with(MIME_PNG, vec![1, 2, 3]);
        let reencoded = Snapshot::new().with(MIME_PNG, vec![9, 9, 9, 9]);
        readback.record(Target::Selection, reencoded.clone(), &written);

        let foreign = Snapshot::from_text("someone else");
        assert_eq!(readback.resolve(Target::Selection, foreign.clone()), foreign);
        // The same bytes coming back later are no longer ours
        assert_eq!(readback.resolve(Target::Selection, reencoded.clone()), reencoded);
    }

    #[test]
    fn targets_are_independent() {
        let mut readback = ReadBack::new();
        let written = Snapshot::from_text("mine");
        readback.record(Target::Clipboard, Snapshot::new().with(MIME_TEXT, "mine\n"), &written);

        let other = Snapshot::new().with(MIME_TEXT, "mine\n");
        assert_eq!(readback.resolve(Target::Selection, other.clone()), other);
    }
}
