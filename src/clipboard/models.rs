//! ClipMon - Clipboard content data models
//!
//! Defines the buffer targets and the format → bytes snapshots exchanged
//! with the OS and with the server

use serde::{Deserialize, Serialize};

/// Plain text format identifier
pub const MIME_TEXT: &str = "text/plain";
/// Rich text (HTML) format identifier
pub const MIME_HTML: &str = "text/html";
/// PNG image format identifier
pub const MIME_PNG: &str = "image/png";

/// OS-level buffer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Regular clipboard (Ctrl+C / Ctrl+V)
    Clipboard,
    /// Primary selection (select / middle-click), where the platform has one
    Selection,
}

impl Target {
    /// The opposite buffer, used for mirroring
    pub fn other(self) -> Self {
        match self {
            Target::Clipboard => Target::Selection,
            Target::Selection => Target::Clipboard,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Target::Clipboard => 0,
            Target::Selection => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Clipboard => "clipboard",
            Target::Selection => "selection",
        }
    }
}

/// Content of one buffer target at one instant
///
/// An ordered format → bytes mapping. Formats keep their insertion order and
/// appear at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: Vec<(String, Vec<u8>)>,
}

/// Wire entity exchanged with the server; same shape as a snapshot
pub type Item = Snapshot;

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot holding only plain text
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut snapshot = Self::new();
        snapshot.insert(MIME_TEXT, text.into().into_bytes());
        snapshot
    }

    /// Set the bytes for a format, replacing any previous value in place
    pub fn insert(&mut self, format: impl Into<String>, data: Vec<u8>) {
        let format = format.into();
        match self.entries.iter_mut().find(|(f, _)| *f == format) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((format, data)),
        }
    }

    /// Builder form of [`Snapshot::insert`]
    pub fn with(mut self, format: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(format, data.into());
        self
    }

    pub fn get(&self, format: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(f, _)| f == format)
            .map(|(_, data)| data.as_slice())
    }

    pub fn contains(&self, format: &str) -> bool {
        self.get(format).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(f, d)| (f.as_str(), d.as_slice()))
    }

    /// Copy of this snapshot restricted to `formats`, in that order
    ///
    /// An empty format list keeps everything.
    pub fn filtered(&self, formats: &[String]) -> Snapshot {
        if formats.is_empty() {
            return self.clone();
        }
        let mut out = Snapshot::new();
        for format in formats {
            if let Some(data) = self.get(format) {
                out.insert(format.clone(), data.to_vec());
            }
        }
        out
    }

    /// Decoded plain text, if the snapshot carries a text format
    ///
    /// Accepts `text/plain` as well as parameterised variants such as
    /// `text/plain;charset=utf-8`.
    pub fn text(&self) -> Option<String> {
        self.entries
            .iter()
            .find(|(f, _)| is_text_format(f))
            .map(|(_, data)| String::from_utf8_lossy(data).into_owned())
    }

    /// Size in bytes of all format payloads
    pub fn byte_len(&self) -> usize {
        self.entries.iter().map(|(_, d)| d.len()).sum()
    }
}

fn is_text_format(format: &str) -> bool {
    format == MIME_TEXT || format.starts_with("text/plain;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces_in_place() {
        let mut s = Snapshot::new();
        s.insert("a", b"1".to_vec());
        s.insert("b", b"2".to_vec());
        s.insert("a", b"3".to_vec());

        let formats: Vec<_> = s.formats().collect();
        assert_eq!(formats, vec!["a", "b"]);
        assert_eq!(s.get("a"), Some(&b"3"[..]));
    }

    #[test]
    fn filtered_follows_priority_order() {
        let s = Snapshot::new()
            .with(MIME_PNG, vec![1, 2])
            .with("x-special/junk", vec![9])
            .with(MIME_TEXT, "hi");
        let formats = vec![MIME_TEXT.to_string(), MIME_PNG.to_string()];

        let f = s.filtered(&formats);
        assert_eq!(f.formats().collect::<Vec<_>>(), vec![MIME_TEXT, MIME_PNG]);
        assert!(!f.contains("x-special/junk"));
        assert_eq!(s.filtered(&[]), s);
    }

    #[test]
    fn text_accepts_charset_variant() {
        let s = Snapshot::new().with("text/plain;charset=utf-8", "héllo");
        assert_eq!(s.text().as_deref(), Some("héllo"));
        assert_eq!(Snapshot::new().with(MIME_HTML, "<b>x</b>").text(), None);
    }

    #[test]
    fn other_target_swaps() {
        assert_eq!(Target::Clipboard.other(), Target::Selection);
        assert_eq!(Target::Selection.other(), Target::Clipboard);
    }
}
