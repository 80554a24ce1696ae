use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::monitor::{Monitor, MonitorSnapshot};
use crate::signal::PulseSource;
use crate::sink::Logger;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Drives the monitor: one tick per interval, command bytes drained
/// non-blockingly after each poll, snapshot published for observers.
/// Runs until the cancellation token fires.
pub async fn monitor_loop(
    mut monitor: Monitor,
    mut source: Box<dyn PulseSource>,
    clock: Arc<dyn Clock>,
    logger: Arc<Logger>,
    mut command_rx: mpsc::UnboundedReceiver<u8>,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut transport_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = clock.now_ms();
                monitor.poll(source.as_mut(), now_ms, &logger);

                // Drain only what is already queued; a tick never waits for
                // the transport.
                loop {
                    match command_rx.try_recv() {
                        Ok(byte) => monitor.push_command_byte(byte, source.as_mut(), &logger),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            if transport_open {
                                log_warn!("command transport closed, no further commands");
                                transport_open = false;
                            }
                            break;
                        }
                    }
                }

                let _ = snapshot_tx.send(monitor.snapshot());
            }
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop shutting down");
                break;
            }
        }
    }
}
