use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::DetectorConfig;
use crate::monitor::{Monitor, MonitorSnapshot};
use crate::settings::MonitorSettings;
use crate::signal::PulseSource;
use crate::sink::Logger;
use crate::worker::monitor_loop;

/// Lifecycle owner for the monitor loop: initializes the pulse source,
/// spawns the worker, and joins it on stop.
pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    snapshot_rx: Option<watch::Receiver<MonitorSnapshot>>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            snapshot_rx: None,
        }
    }

    /// Initialize the source and spawn the monitor loop. Source
    /// initialization failure is fatal: no loop is spawned and the system
    /// offers no further service.
    pub async fn start(
        &mut self,
        mut source: Box<dyn PulseSource>,
        clock: Arc<dyn Clock>,
        logger: Arc<Logger>,
        settings: MonitorSettings,
        command_rx: mpsc::UnboundedReceiver<u8>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitor already active");
        }

        logger.debug("Initializing system...");
        source.set_threshold(settings.detector_threshold);
        if let Err(err) = source.begin() {
            logger.error("Pulse sensor initialization failed. Halting.");
            return Err(err).context("pulse sensor initialization failed");
        }
        logger.info("Pulse sensor initialized successfully.");

        let monitor = Monitor::with_report_interval(
            clock.now_ms(),
            DetectorConfig::new(settings.detector_threshold),
            settings.report_interval_ms,
        );
        let (snapshot_tx, snapshot_rx) = watch::channel(monitor.snapshot());

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(monitor_loop(
            monitor,
            source,
            clock,
            logger.clone(),
            command_rx,
            snapshot_tx,
            Duration::from_millis(settings.tick_interval_ms),
            cancel_token.clone(),
        ));

        logger.info("Setup complete. Ready to track heart rate.");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.snapshot_rx = Some(snapshot_rx);
        Ok(())
    }

    /// Latest snapshot published by the loop, if it is running.
    pub fn snapshot(&self) -> Option<MonitorSnapshot> {
        self.snapshot_rx.as_ref().map(|rx| rx.borrow().clone())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.snapshot_rx = None;

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("monitor loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}
