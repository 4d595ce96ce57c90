//! ClipMon - Fatal monitor errors
//!
//! Every variant ends the process; supervision is the server's job.

use std::time::Duration;

use crate::ipc::CodecError;

/// Exit code: IPC connection could not be established
pub const EXIT_CONNECT: i32 = 1;
/// Exit code: malformed or corrupt frame received
pub const EXIT_PROTOCOL: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out after {timeout:?} connecting to {endpoint}")]
    ConnectTimeout { endpoint: String, timeout: Duration },
    #[error("Incorrect message received: {0}")]
    Protocol(#[source] CodecError),
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl MonitorError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::Connect { .. }
            | MonitorError::ConnectTimeout { .. }
            | MonitorError::Runtime(_) => EXIT_CONNECT,
            MonitorError::Protocol(_) => EXIT_PROTOCOL,
        }
    }
}
