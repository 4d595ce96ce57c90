//! ClipMon - Monitor settings
//!
//! Read once at startup from the JSON file the server hands over. Missing keys
//! take their defaults; a missing or broken file means all defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clipboard::models::{MIME_HTML, MIME_PNG, MIME_TEXT};

/// Monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Formats used for fingerprinting and forwarding, highest priority first
    pub formats: Vec<String>,
    /// Watch the clipboard
    pub check_clipboard: bool,
    /// Watch the primary selection (platforms that have one)
    pub check_selection: bool,
    /// Mirror clipboard changes into the selection
    pub copy_clipboard: bool,
    /// Mirror selection changes into the clipboard
    pub copy_selection: bool,
    /// Delay before re-checking a selection that is still being made
    pub settle_delay_ms: u64,
    /// Window during which remote updates are coalesced
    pub throttle_window_ms: u64,
    /// Text this short (in characters) is not forwarded
    pub noise_max_chars: usize,
    /// Clipboard polling interval
    pub poll_interval_ms: u64,
    /// How long to wait for the server endpoint at startup
    pub connect_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            formats: vec![MIME_TEXT.to_string(), MIME_HTML.to_string(), MIME_PNG.to_string()],
            check_clipboard: true,
            check_selection: true,
            copy_clipboard: false,
            copy_selection: false,
            settle_delay_ms: 100,
            throttle_window_ms: 500,
            noise_max_chars: 1,
            poll_interval_ms: 150,
            connect_timeout_ms: 2000,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("No settings file given, using defaults");
            return Settings::default();
        };

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to read settings {:?}: {}, using defaults", path, e);
                return Settings::default();
            }
        };

        match serde_json::from_str::<Settings>(&text) {
            Ok(settings) => {
                log::info!("Settings loaded from {:?}", path);
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings {:?}: {}, using defaults", path, e);
                Settings::default()
            }
        }
    }

    /// Split a format list written as one string
    ///
    /// Separators are any run of `;`, `,` or spaces.
    pub fn parse_formats(list: &str) -> Vec<String> {
        list.split([';', ',', ' '])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_formats_splits_on_separator_runs() {
        assert_eq!(
            Settings::parse_formats("text/plain; text/html,,image/png  "),
            vec!["text/plain", "text/html", "image/png"]
        );
        assert!(Settings::parse_formats(" ;, ").is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"copy_selection": true, "formats": ["text/html"]}}"#).unwrap();

        let settings = Settings::load(Some(file.path()));
        assert!(settings.copy_selection);
        assert_eq!(settings.formats, vec!["text/html"]);
        assert_eq!(settings.throttle_window_ms, 500);
        assert_eq!(settings.settle_delay_ms, 100);
    }

    #[test]
    fn broken_or_missing_file_means_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert_eq!(Settings::load(Some(file.path())), Settings::default());
        assert_eq!(
            Settings::load(Some(Path::new("/nonexistent/clipmon.json"))),
            Settings::default()
        );
    }
}
