//! ClipMon - Platform clipboard adapters
//!
//! The monitor only talks to the OS through [`ClipboardBackend`]. Platforms
//! without a primary selection keep the default `has_selection` and
//! `is_selection_settling`, which turns every selection-specific path off.

mod arboard_backend;
mod memory;
mod readback;
#[cfg(target_os = "linux")]
mod x11;

pub use arboard_backend::ArboardBackend;
pub use memory::MemoryBackend;
pub use readback::ReadBack;

use super::models::{Snapshot, Target};

/// Read/write access to the OS buffer targets
///
/// Operations are synchronous and infallible from the caller's point of view:
/// a target holding nothing, or one that cannot be read, yields an empty
/// snapshot.
pub trait ClipboardBackend {
    /// Current content of `target`
    fn read_snapshot(&mut self, target: Target) -> Snapshot;

    /// Replace the content of `target`
    ///
    /// May cause the OS to report a change for that target.
    fn write_snapshot(&mut self, target: Target, snapshot: &Snapshot);

    /// Whether the platform has a `Selection` target at all
    fn has_selection(&self) -> bool {
        false
    }

    /// True while a selection gesture (pointer drag, Shift held) is in progress
    fn is_selection_settling(&mut self) -> bool {
        false
    }

    /// Change notifications raised synchronously by the last write
    ///
    /// Polling backends have none.
    fn take_changes(&mut self) -> Vec<Target> {
        Vec::new()
    }
}
