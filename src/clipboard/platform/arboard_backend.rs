//! ClipMon - arboard clipboard backend
//!
//! Reads and writes the system clipboard through arboard. On Linux the
//! PRIMARY selection is exposed as the `Selection` target.

use std::borrow::Cow;

use arboard::{Clipboard, ImageData};

use super::{ClipboardBackend, ReadBack};
use crate::clipboard::models::{Snapshot, Target, MIME_HTML, MIME_PNG, MIME_TEXT};

/// OS clipboard access via arboard
pub struct ArboardBackend {
    /// Kept alive between calls: on X11 the instance that last wrote
    /// serves the data to other applications
    clipboard: Option<Clipboard>,
    read_text: bool,
    read_image: bool,
    /// What our own writes read back as
    readback: ReadBack,
    #[cfg(target_os = "linux")]
    pointer: super::x11::PointerProbe,
}

impl ArboardBackend {
    /// Create a backend that reads only the formats in `formats`
    pub fn new(formats: &[String]) -> Self {
        let wants = |mime: &str| formats.is_empty() || formats.iter().any(|f| f == mime);
        Self {
            clipboard: None,
            read_text: wants(MIME_TEXT),
            read_image: wants(MIME_PNG),
            readback: ReadBack::new(),
            #[cfg(target_os = "linux")]
            pointer: super::x11::PointerProbe::new(),
        }
    }

    /// Shared clipboard handle, reopened after a failure
    fn handle(&mut self) -> Option<&mut Clipboard> {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(cb) => self.clipboard = Some(cb),
                Err(e) => {
                    log::error!("Failed to create clipboard instance: {}", e);
                    return None;
                }
            }
        }
        self.clipboard.as_mut()
    }

    fn reset_handle(&mut self) {
        self.clipboard = None;
    }

    /// Watched formats exactly as the OS currently serves them
    fn read_raw(&mut self, target: Target) -> Snapshot {
        let (read_text, read_image) = (self.read_text, self.read_image);
        let Some(clipboard) = self.handle() else {
            return Snapshot::new();
        };

        let mut snapshot = Snapshot::new();

        if read_text {
            match get_text(clipboard, target) {
                Ok(text) if !text.is_empty() => snapshot.insert(MIME_TEXT, text.into_bytes()),
                Ok(_) => {}
                Err(e) => log::trace!("[Clipboard] No text in {}: {}", target.as_str(), e),
            }
        }

        if read_image {
            match get_image(clipboard, target) {
                Ok(image) => {
                    log::trace!("[Clipboard] Detected image: {}x{}", image.width, image.height);
                    let png = rgba_to_png(&image);
                    if png.is_empty() {
                        log::error!("[Clipboard] Failed to convert image to PNG");
                    } else {
                        snapshot.insert(MIME_PNG, png);
                    }
                }
                Err(e) => {
                    log::trace!("[Clipboard] No image in {}: {}", target.as_str(), e);
                    if let Some(png) = read_dib_image() {
                        snapshot.insert(MIME_PNG, png);
                    }
                }
            }
        }

        snapshot
    }
}

impl ClipboardBackend for ArboardBackend {
    fn read_snapshot(&mut self, target: Target) -> Snapshot {
        let observed = self.read_raw(target);
        self.readback.resolve(target, observed)
    }

    fn write_snapshot(&mut self, target: Target, snapshot: &Snapshot) {
        self.readback.forget(target);
        let Some(clipboard) = self.handle() else {
            return;
        };

        let result = if snapshot.is_empty() {
            clear(clipboard, target)
        } else if let Some(html) = snapshot.get(MIME_HTML) {
            let html = String::from_utf8_lossy(html).into_owned();
            let alt = snapshot.text();
            set_html(clipboard, target, html, alt)
        } else if let Some(text) = snapshot.text() {
            set_text(clipboard, target, text)
        } else if let Some(png) = snapshot.get(MIME_PNG) {
            match png_to_rgba(png) {
                Some(image) => set_image(clipboard, target, image),
                None => return,
            }
        } else {
            log::warn!(
                "[Clipboard] No writable format among {:?}",
                snapshot.formats().collect::<Vec<_>>()
            );
            return;
        };

        if let Err(e) = result {
            log::error!("[Clipboard] Failed to write {}: {}", target.as_str(), e);
            self.reset_handle();
            return;
        }

        // Images come back re-encoded; remember how ours looks
        let observed = self.read_raw(target);
        self.readback.record(target, observed, snapshot);
    }

    fn has_selection(&self) -> bool {
        cfg!(target_os = "linux")
    }

    #[cfg(target_os = "linux")]
    fn is_selection_settling(&mut self) -> bool {
        self.pointer.selection_settling()
    }
}

#[cfg(target_os = "linux")]
fn linux_kind(target: Target) -> arboard::LinuxClipboardKind {
    match target {
        Target::Clipboard => arboard::LinuxClipboardKind::Clipboard,
        Target::Selection => arboard::LinuxClipboardKind::Primary,
    }
}

#[cfg(target_os = "linux")]
fn get_text(clipboard: &mut Clipboard, target: Target) -> Result<String, arboard::Error> {
    use arboard::GetExtLinux;
    clipboard.get().clipboard(linux_kind(target)).text()
}

#[cfg(not(target_os = "linux"))]
fn get_text(clipboard: &mut Clipboard, _target: Target) -> Result<String, arboard::Error> {
    clipboard.get_text()
}

#[cfg(target_os = "linux")]
fn get_image(
    clipboard: &mut Clipboard,
    target: Target,
) -> Result<ImageData<'static>, arboard::Error> {
    use arboard::GetExtLinux;
    clipboard.get().clipboard(linux_kind(target)).image()
}

#[cfg(not(target_os = "linux"))]
fn get_image(
    clipboard: &mut Clipboard,
    _target: Target,
) -> Result<ImageData<'static>, arboard::Error> {
    clipboard.get_image()
}

#[cfg(target_os = "linux")]
fn clear(clipboard: &mut Clipboard, target: Target) -> Result<(), arboard::Error> {
    use arboard::ClearExtLinux;
    clipboard.clear_with().clipboard(linux_kind(target))
}

#[cfg(not(target_os = "linux"))]
fn clear(clipboard: &mut Clipboard, _target: Target) -> Result<(), arboard::Error> {
    clipboard.clear()
}

#[cfg(target_os = "linux")]
fn set_text(clipboard: &mut Clipboard, target: Target, text: String) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;
    clipboard.set().clipboard(linux_kind(target)).text(text)
}

#[cfg(not(target_os = "linux"))]
fn set_text(clipboard: &mut Clipboard, _target: Target, text: String) -> Result<(), arboard::Error> {
    clipboard.set_text(text)
}

#[cfg(target_os = "linux")]
fn set_html(
    clipboard: &mut Clipboard,
    target: Target,
    html: String,
    alt: Option<String>,
) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;
    clipboard.set().clipboard(linux_kind(target)).html(html, alt)
}

#[cfg(not(target_os = "linux"))]
fn set_html(
    clipboard: &mut Clipboard,
    _target: Target,
    html: String,
    alt: Option<String>,
) -> Result<(), arboard::Error> {
    clipboard.set_html(html, alt)
}

#[cfg(target_os = "linux")]
fn set_image(
    clipboard: &mut Clipboard,
    target: Target,
    image: ImageData<'static>,
) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;
    clipboard.set().clipboard(linux_kind(target)).image(image)
}

#[cfg(not(target_os = "linux"))]
fn set_image(
    clipboard: &mut Clipboard,
    _target: Target,
    image: ImageData<'static>,
) -> Result<(), arboard::Error> {
    clipboard.set_image(image)
}

/// Convert RGBA image data to PNG
fn rgba_to_png(image: &ImageData) -> Vec<u8> {
    use image::{ImageBuffer, Rgba};

    let Some(img) = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
        image.width as u32,
        image.height as u32,
        image.bytes.to_vec(),
    ) else {
        return Vec::new();
    };

    let mut png_data = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut png_data);
    if let Err(e) = img.write_to(&mut cursor, image::ImageFormat::Png) {
        log::error!("Failed to write PNG data: {}", e);
        return Vec::new();
    }

    png_data
}

/// Decode PNG bytes into the RGBA layout arboard expects
fn png_to_rgba(png: &[u8]) -> Option<ImageData<'static>> {
    match image::load_from_memory(png) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            Some(ImageData {
                width: rgba.width() as usize,
                height: rgba.height() as usize,
                bytes: Cow::Owned(rgba.into_raw()),
            })
        }
        Err(e) => {
            log::error!("[Clipboard] Failed to decode PNG for writing: {}", e);
            None
        }
    }
}

/// Read a DIB bitmap (third-party screenshot tools) and convert it to PNG
#[cfg(windows)]
fn read_dib_image() -> Option<Vec<u8>> {
    use clipboard_win::{formats, get_clipboard};

    let bitmap_data: Vec<u8> = match get_clipboard::<Vec<u8>, _>(formats::Bitmap) {
        Ok(data) if !data.is_empty() => data,
        Ok(_) => return None,
        Err(e) => {
            log::trace!("[Clipboard] No DIB/Bitmap data: {}", e);
            return None;
        }
    };

    match image::load_from_memory(&bitmap_data) {
        Ok(img) => {
            let mut png_data = Vec::new();
            let mut cursor = std::io::Cursor::new(&mut png_data);
            if img.write_to(&mut cursor, image::ImageFormat::Png).is_ok() {
                log::debug!("[Clipboard] Converted DIB to PNG: {} bytes", png_data.len());
                return Some(png_data);
            }
            log::error!("[Clipboard] Failed to convert DIB to PNG");
        }
        Err(e) => log::debug!("[Clipboard] Failed to decode DIB data: {}", e),
    }

    None
}

#[cfg(not(windows))]
fn read_dib_image() -> Option<Vec<u8>> {
    None
}
