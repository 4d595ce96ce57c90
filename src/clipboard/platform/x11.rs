//! ClipMon - X11 pointer state probe
//!
//! The PRIMARY selection changes continuously while text is being selected.
//! Reading it before the gesture ends yields partial text, so the monitor asks
//! whether Button1 or Shift is currently held.

use once_cell::unsync::OnceCell;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt as _, KeyButMask, Window};
use x11rb::rust_connection::RustConnection;

/// Lazily connected X display used for pointer queries
pub struct PointerProbe {
    display: OnceCell<Option<(RustConnection, Window)>>,
}

impl PointerProbe {
    pub fn new() -> Self {
        Self {
            display: OnceCell::new(),
        }
    }

    /// Button1 or Shift currently held down
    ///
    /// Without a reachable display the selection is considered settled.
    pub fn selection_settling(&self) -> bool {
        let Some((conn, root)) = self.display.get_or_init(open_display) else {
            return false;
        };

        let cookie = match conn.query_pointer(*root) {
            Ok(cookie) => cookie,
            Err(e) => {
                log::warn!("[Clipboard] XQueryPointer request failed: {}", e);
                return false;
            }
        };
        match cookie.reply() {
            Ok(reply) => {
                let held = u16::from(KeyButMask::BUTTON1) | u16::from(KeyButMask::SHIFT);
                u16::from(reply.mask) & held != 0
            }
            Err(e) => {
                log::warn!("[Clipboard] XQueryPointer reply failed: {}", e);
                false
            }
        }
    }
}

impl Default for PointerProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn open_display() -> Option<(RustConnection, Window)> {
    match x11rb::connect(None) {
        Ok((conn, screen_num)) => {
            let root = conn.setup().roots.get(screen_num)?.root;
            log::debug!("[Clipboard] Connected to X display, screen {}", screen_num);
            Some((conn, root))
        }
        Err(e) => {
            log::warn!("[Clipboard] No X display for selection probing: {}", e);
            None
        }
    }
}
