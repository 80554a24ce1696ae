use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use pulsemon::{
    ChannelSink, Clock, Logger, MonitorController, SettingsStore, SimulatedPulse, StdoutSink,
    SystemClock,
};
use pulsemon::{log_error, log_info};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

const SETTINGS_FILE: &str = "pulsemon.json";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings = SettingsStore::new(PathBuf::from(SETTINGS_FILE))
        .context("failed to load settings")?
        .monitor();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    // Protocol sinks: stdout plays the serial monitor, the channel sink
    // stands in for the wireless terminal and is relayed to stderr.
    let (bt_tx, mut bt_rx) = mpsc::unbounded_channel::<String>();
    let mut logger = Logger::new(clock.clone());
    logger.add_sink(Box::new(StdoutSink));
    logger.add_sink(Box::new(ChannelSink::new(bt_tx)));
    let logger = Arc::new(logger);

    tokio::spawn(async move {
        while let Some(line) = bt_rx.recv().await {
            eprintln!("[bt] {line}");
        }
    });

    let source = SimulatedPulse::new(clock.clone(), settings.simulated_bpm);
    let contact = source.contact_handle();

    // Inbound command transport: stdin bytes feed the monitor's drain.
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<u8>();
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let mut buf = [0u8; 256];
        loop {
            match stdin.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    for byte in &buf[..n] {
                        if cmd_tx.send(*byte).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    log_error!("stdin read failed: {err}");
                    break;
                }
            }
        }
    });

    // Script the demo finger: placed after a couple of seconds, lifted every
    // half minute so session reports fire.
    tokio::spawn(async move {
        loop {
            sleep(Duration::from_secs(2)).await;
            contact.store(true, Ordering::Relaxed);
            sleep(Duration::from_secs(30)).await;
            contact.store(false, Ordering::Relaxed);
            sleep(Duration::from_secs(3)).await;
        }
    });

    let mut controller = MonitorController::new();
    controller
        .start(Box::new(source), clock, logger, settings, cmd_rx)
        .await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    log_info!("ctrl-c received, stopping monitor");
    controller.stop().await
}
