//! ClipMon - Clipboard module
//!
//! Provides clipboard monitoring, change detection and remote content apply

pub mod fingerprint;
pub mod models;
pub mod monitor;
pub mod platform;
pub mod throttle;
pub mod timer;

pub use fingerprint::{compute_fingerprint, Fingerprint};
pub use models::{Item, Snapshot, Target};
pub use monitor::{ClipboardMonitor, MonitorPolicy};
pub use platform::{ArboardBackend, ClipboardBackend, MemoryBackend, ReadBack};
