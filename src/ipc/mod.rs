//! ClipMon - IPC channel to the clipboard server
//!
//! The monitor is a client of one local endpoint: a Unix domain socket, or a
//! named pipe on Windows. The connection is made once at startup and never
//! re-established.

pub mod codec;

use std::path::PathBuf;
use std::time::Duration;

#[cfg(unix)]
use tokio::net::UnixStream;
#[cfg(windows)]
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};

use crate::error::MonitorError;

pub use codec::{CodecError, ItemCodec};

/// Byte stream to the server
#[cfg(unix)]
pub type IpcStream = UnixStream;
#[cfg(windows)]
pub type IpcStream = NamedPipeClient;

/// Name of the server's monitor endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(PathBuf);

impl Endpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Default for Endpoint {
    /// `<runtime dir>/clipmon/monitor.sock`, falling back to the cache dir and
    /// then the temp dir
    #[cfg(unix)]
    fn default() -> Self {
        let dir = dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir);
        Self(dir.join("clipmon").join("monitor.sock"))
    }

    #[cfg(windows)]
    fn default() -> Self {
        Self(PathBuf::from(r"\\.\pipe\clipmon-monitor"))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Connect to the server endpoint, giving up after `timeout`
pub async fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<IpcStream, MonitorError> {
    log::info!("[Ipc] Connecting to {}", endpoint);
    match tokio::time::timeout(timeout, open(endpoint)).await {
        Ok(Ok(stream)) => {
            log::info!("[Ipc] Connected");
            Ok(stream)
        }
        Ok(Err(e)) => Err(MonitorError::Connect {
            endpoint: endpoint.to_string(),
            source: e,
        }),
        Err(_) => Err(MonitorError::ConnectTimeout {
            endpoint: endpoint.to_string(),
            timeout,
        }),
    }
}

#[cfg(unix)]
async fn open(endpoint: &Endpoint) -> std::io::Result<IpcStream> {
    UnixStream::connect(endpoint.path()).await
}

#[cfg(windows)]
async fn open(endpoint: &Endpoint) -> std::io::Result<IpcStream> {
    use windows::Win32::Foundation::ERROR_PIPE_BUSY;

    loop {
        match ClientOptions::new().open(endpoint.path()) {
            Ok(client) => return Ok(client),
            // All server instances busy; the caller's timeout bounds the wait
            Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY.0 as i32) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_to_listening_socket() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(dir.path().join("monitor.sock"));
        let _listener = tokio::net::UnixListener::bind(endpoint.path()).unwrap();

        assert!(connect(&endpoint, Duration::from_secs(2)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_endpoint_is_a_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::new(dir.path().join("absent.sock"));

        let err = connect(&endpoint, Duration::from_secs(2)).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
