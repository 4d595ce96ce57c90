//! ClipMon - Change-detection fingerprints

use std::fmt;

use blake3::Hasher;

use super::models::Snapshot;

/// Opaque change-detection value for a snapshot
///
/// Only meaningful for equality within one process lifetime.
/// Backed by blake3 for speed; only equality is compared, so its
/// cryptographic strength is incidental.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    /// Fingerprint of a snapshot with none of the watched formats
    pub fn empty() -> Self {
        Self(hash_bytes(&[]))
    }

    /// Short hex form for logs
    pub fn short(&self) -> String {
        self.0.to_hex().as_str()[..8].to_string()
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

/// Hash the first format in `format_priority` that the snapshot holds with
/// non-empty bytes
///
/// Formats after the matched one are ignored, so rich-text variants carrying
/// incidental metadata do not count as a change. An empty priority list falls
/// back to the snapshot's own format order.
pub fn compute_fingerprint(snapshot: &Snapshot, format_priority: &[String]) -> Fingerprint {
    let bytes = if format_priority.is_empty() {
        snapshot.iter().map(|(_, data)| data).find(|data| !data.is_empty())
    } else {
        format_priority
            .iter()
            .filter_map(|format| snapshot.get(format))
            .find(|data| !data.is_empty())
    };
    Fingerprint(hash_bytes(bytes.unwrap_or(&[])))
}

fn hash_bytes(data: &[u8]) -> blake3::Hash {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::models::{MIME_HTML, MIME_PNG, MIME_TEXT};

    fn formats() -> Vec<String> {
        vec![MIME_TEXT.into(), MIME_HTML.into(), MIME_PNG.into()]
    }

    #[test]
    fn ignores_formats_after_the_match() {
        let a = Snapshot::new()
            .with(MIME_TEXT, "Hello")
            .with(MIME_HTML, "<b>Hello</b><!-- a -->");
        let b = Snapshot::new()
            .with(MIME_HTML, "<i>Hello</i>")
            .with(MIME_TEXT, "Hello");
        assert_eq!(compute_fingerprint(&a, &formats()), compute_fingerprint(&b, &formats()));
    }

    #[test]
    fn skips_empty_formats() {
        let a = Snapshot::new().with(MIME_TEXT, "").with(MIME_HTML, "<p>x</p>");
        let b = Snapshot::new().with(MIME_HTML, "<p>x</p>");
        assert_eq!(compute_fingerprint(&a, &formats()), compute_fingerprint(&b, &formats()));
    }

    #[test]
    fn unwatched_content_is_empty() {
        let s = Snapshot::new().with("application/x-other", "data");
        assert_eq!(compute_fingerprint(&s, &formats()), Fingerprint::empty());
        assert_eq!(compute_fingerprint(&Snapshot::new(), &formats()), Fingerprint::empty());
    }

    #[test]
    fn different_text_differs() {
        let a = Snapshot::from_text("Hello");
        let b = Snapshot::from_text("Hello!");
        assert_ne!(compute_fingerprint(&a, &formats()), compute_fingerprint(&b, &formats()));
    }
}
