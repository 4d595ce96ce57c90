//! ClipMon - Monitor event loop
//!
//! Single-threaded and cooperative: inbound frames, poll ticks and timer
//! deadlines are handled one at a time, each to completion, and outgoing
//! items are written and flushed before the next event is looked at.

use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::clipboard::{ClipboardBackend, ClipboardMonitor};
use crate::error::MonitorError;
use crate::ipc::{CodecError, ItemCodec};

/// Why the loop stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Server closed the channel
    Disconnected,
}

/// Run the monitor over `stream` until the server disconnects
///
/// Returns an error only for protocol violations; a closed or broken stream
/// is a normal shutdown.
pub async fn run_monitor<S, B>(
    stream: S,
    monitor: &mut ClipboardMonitor<B>,
    poll_interval: Duration,
) -> Result<Shutdown, MonitorError>
where
    S: AsyncRead + AsyncWrite,
    B: ClipboardBackend,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut inbound = FramedRead::new(reader, ItemCodec::new());
    let mut outbound = FramedWrite::new(writer, ItemCodec::new());

    monitor.start(Instant::now().into_std());
    if let Err(e) = flush_outgoing(monitor, &mut outbound).await {
        return channel_closed(e);
    }

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The initial check above covers the immediate first tick
    ticker.tick().await;

    loop {
        let deadline = monitor.next_deadline().map(Instant::from_std);

        tokio::select! {
            frame = inbound.next() => {
                let mut frame = frame;
                loop {
                    match frame {
                        Some(Ok(item)) => {
                            log::debug!("[Ipc] Received item: {} format(s)", item.len());
                            monitor.receive_item(item, Instant::now().into_std());
                        }
                        Some(Err(e)) => return protocol_failure(e),
                        None => {
                            log::info!("[Ipc] Server disconnected");
                            return Ok(Shutdown::Disconnected);
                        }
                    }
                    // Drain frames that are already complete
                    match inbound.next().now_or_never() {
                        Some(next) => frame = next,
                        None => break,
                    }
                }
            }
            _ = ticker.tick() => {
                monitor.poll(Instant::now().into_std());
            }
            _ = sleep_until(deadline), if deadline.is_some() => {
                monitor.fire_timers(Instant::now().into_std());
            }
        }

        if let Err(e) = flush_outgoing(monitor, &mut outbound).await {
            return channel_closed(e);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending::<()>().await,
    }
}

async fn flush_outgoing<W, B>(
    monitor: &mut ClipboardMonitor<B>,
    outbound: &mut FramedWrite<W, ItemCodec>,
) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    B: ClipboardBackend,
{
    while let Some(item) = monitor.pop_outgoing() {
        match outbound.send(&item).await {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => return Err(e),
            // Unencodable item: drop it, the stream is still aligned
            Err(e) => log::error!("[Ipc] Failed to send item: {}", e),
        }
    }
    Ok(())
}

fn protocol_failure(e: CodecError) -> Result<Shutdown, MonitorError> {
    if e.is_disconnect() {
        log::info!("[Ipc] Connection lost: {}", e);
        return Ok(Shutdown::Disconnected);
    }
    log::error!("[Ipc] Incorrect message received: {}", e);
    Err(MonitorError::Protocol(e))
}

fn channel_closed(e: CodecError) -> Result<Shutdown, MonitorError> {
    log::info!("[Ipc] Connection lost while sending: {}", e);
    Ok(Shutdown::Disconnected)
}
