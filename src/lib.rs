//! ClipMon - Clipboard monitor process
//!
//! Standalone process that watches the system clipboard (and the primary
//! selection where the platform has one), forwards real changes to the
//! clipboard server over a local socket, and writes content received from the
//! server back to the OS without echoing it.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod ipc;
pub mod service;

use std::path::PathBuf;

use clap::Parser;

use clipboard::{ArboardBackend, ClipboardMonitor, MonitorPolicy};
use config::Settings;
use error::MonitorError;
use ipc::Endpoint;

/// Command line arguments passed by the server when it spawns the monitor
#[derive(Debug, Parser)]
#[command(name = "clipmon-monitor", version, about = "Clipboard monitor process")]
pub struct Args {
    /// Server endpoint (socket path, or pipe name on Windows)
    #[arg(long)]
    pub endpoint: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the watched formats, e.g. "text/plain;text/html"
    #[arg(long)]
    pub formats: Option<String>,
}

impl Args {
    /// Settings from the file, with command line overrides applied
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::load(self.config.as_deref());
        if let Some(list) = &self.formats {
            settings.formats = Settings::parse_formats(list);
        }
        settings
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.clone().map(Endpoint::new).unwrap_or_default()
    }
}

/// Connect, then monitor until the server goes away
async fn monitor_main(args: Args) -> Result<(), MonitorError> {
    let settings = args.settings();
    let stream = ipc::connect(&args.endpoint(), settings.connect_timeout()).await?;

    log::info!("Watching formats: {:?}", settings.formats);
    let backend = ArboardBackend::new(&settings.formats);
    let mut monitor = ClipboardMonitor::new(backend, MonitorPolicy::from(&settings));

    service::run_monitor(stream, &mut monitor, settings.poll_interval()).await?;
    Ok(())
}

/// Application main entry point
///
/// Returns the process exit code.
pub fn run() -> i32 {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    log::info!("ClipMon monitor starting...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let e = MonitorError::Runtime(e);
            log::error!("{}", e);
            return e.exit_code();
        }
    };

    match runtime.block_on(monitor_main(args)) {
        Ok(()) => {
            log::info!("ClipMon monitor stopped");
            0
        }
        Err(e) => {
            log::error!("{}", e);
            e.exit_code()
        }
    }
}
