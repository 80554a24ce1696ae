//! Per-tick orchestration: contact edge detection, reading validation,
//! report triggering, and command intake.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::command::{process_command, CommandBuffer};
use crate::config::{DetectorConfig, MAX_VALID_BPM, MIN_VALID_BPM, REPORT_INTERVAL_MS};
use crate::contact::finger_on_sensor;
use crate::report::{summarize, Recommendation};
use crate::session::Session;
use crate::signal::PulseSource;
use crate::sink::Logger;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Serializable view of the monitor for status surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub finger_detected: bool,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total_heartbeats: u32,
    pub reading_count: u32,
    pub average_bpm: f32,
    pub threshold: u16,
}

/// The session state machine. All mutable state (session, detector config,
/// command buffer) lives here, owned by whichever single task drives `poll`.
pub struct Monitor {
    session: Session,
    detector: DetectorConfig,
    buffer: CommandBuffer,
    finger_detected: bool,
    report_interval_ms: u64,
}

impl Monitor {
    pub fn new(now_ms: u64, detector: DetectorConfig) -> Self {
        Self::with_report_interval(now_ms, detector, REPORT_INTERVAL_MS)
    }

    pub fn with_report_interval(
        now_ms: u64,
        detector: DetectorConfig,
        report_interval_ms: u64,
    ) -> Self {
        Self {
            session: Session::new(now_ms),
            detector,
            buffer: CommandBuffer::new(),
            finger_detected: false,
            report_interval_ms,
        }
    }

    pub fn detector(&self) -> DetectorConfig {
        self.detector
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            finger_detected: self.finger_detected,
            session_id: self.session.id,
            started_at: self.session.started_at,
            total_heartbeats: self.session.total_heartbeats(),
            reading_count: self.session.reading_count(),
            average_bpm: self.session.average_bpm(),
            threshold: self.detector.threshold(),
        }
    }

    /// One tick: poll the source, run the contact state machine, validate and
    /// record any beat, and fire time-based reports.
    pub fn poll(&mut self, source: &mut dyn PulseSource, now_ms: u64, logger: &Logger) {
        let amplitude = source.latest_sample();
        let finger_now = finger_on_sensor(amplitude);

        if finger_now != self.finger_detected {
            self.finger_detected = finger_now;
            if finger_now {
                logger.info("Finger detected! Tracking heart rate.");
                // Only the timer restarts here. Counters that were never
                // flushed carry over into the new contact window.
                self.session.restart_timer(now_ms);
                log_debug!("contact established, session {}", self.session.id);
            } else {
                logger.info("Finger removed. Generating session report.");
                self.report_and_reset(now_ms, logger);
            }
        }

        if self.finger_detected {
            let bpm = source.beats_per_minute();
            if source.saw_start_of_beat()
                && bpm >= i32::from(MIN_VALID_BPM)
                && bpm <= i32::from(MAX_VALID_BPM)
            {
                self.session.record(bpm as u16);
                logger.data(&format!("Heartbeat recorded: BPM = {bpm}"));
            }

            if self.session.elapsed_since(now_ms) >= self.report_interval_ms {
                self.report_and_reset(now_ms, logger);
            }
        }
    }

    /// Feed one inbound command byte. Complete lines dispatch immediately;
    /// the caller drains only the bytes already queued, never waiting.
    pub fn push_command_byte(
        &mut self,
        byte: u8,
        source: &mut dyn PulseSource,
        logger: &Logger,
    ) {
        if let Some(command) = self.buffer.push(byte) {
            process_command(&command, &mut self.detector, source, logger);
        }
    }

    fn report_and_reset(&mut self, now_ms: u64, logger: &Logger) {
        match summarize(&self.session) {
            Some(summary) => {
                logger.report(&summary.report_line());
                logger.info(Recommendation::for_average(summary.avg_bpm).message());
            }
            None => logger.warning("No valid readings to report."),
        }
        self.session.reset(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sink::MemorySink;
    use anyhow::Result;
    use std::sync::Arc;

    /// Pulse source whose outputs the test scripts directly per tick.
    struct ScriptedPulse {
        amplitude: i32,
        bpm: i32,
        beat: bool,
        threshold: Option<u16>,
    }

    impl ScriptedPulse {
        fn new() -> Self {
            Self {
                amplitude: 0,
                bpm: 0,
                beat: false,
                threshold: None,
            }
        }

        fn beat(&mut self, bpm: i32) {
            self.bpm = bpm;
            self.beat = true;
        }
    }

    impl PulseSource for ScriptedPulse {
        fn begin(&mut self) -> Result<()> {
            Ok(())
        }
        fn latest_sample(&mut self) -> i32 {
            self.amplitude
        }
        fn beats_per_minute(&mut self) -> i32 {
            self.bpm
        }
        fn saw_start_of_beat(&mut self) -> bool {
            std::mem::take(&mut self.beat)
        }
        fn set_threshold(&mut self, threshold: u16) {
            self.threshold = Some(threshold);
        }
    }

    fn test_logger() -> (Logger, MemorySink) {
        let capture = MemorySink::new();
        let mut logger = Logger::new(Arc::new(ManualClock::new(0)));
        logger.add_sink(Box::new(capture.clone()));
        (logger, capture)
    }

    fn messages(capture: &MemorySink) -> Vec<String> {
        // Strip the "[<ms> ms] " prefix so assertions read naturally.
        capture
            .lines()
            .iter()
            .map(|line| {
                let idx = line.find("] ").unwrap();
                line[idx + 2..].to_string()
            })
            .collect()
    }

    #[test]
    fn three_beats_then_finger_removed_reports_and_resets() {
        let (logger, capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 600;
        monitor.poll(&mut source, 0, &logger);

        for (t, bpm) in [(1, 60), (2, 70), (3, 80)] {
            source.beat(bpm);
            monitor.poll(&mut source, t, &logger);
        }

        source.amplitude = 10;
        monitor.poll(&mut source, 4, &logger);

        assert_eq!(
            messages(&capture),
            vec![
                "[INFO] Finger detected! Tracking heart rate.",
                "[DATA] Heartbeat recorded: BPM = 60",
                "[DATA] Heartbeat recorded: BPM = 70",
                "[DATA] Heartbeat recorded: BPM = 80",
                "[INFO] Finger removed. Generating session report.",
                "[REPORT] Session complete. Avg BPM: 70.00, Total Beats: 3",
                "[INFO] Heart rate is within a healthy range. Keep it up!",
            ]
        );

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.total_heartbeats, 0);
        assert_eq!(snapshot.average_bpm, 0.0);
        assert!(!snapshot.finger_detected);
    }

    #[test]
    fn periodic_flush_with_zero_readings_warns_without_recommendation() {
        let (logger, capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 600;
        monitor.poll(&mut source, 0, &logger);
        monitor.poll(&mut source, 59_999, &logger);
        monitor.poll(&mut source, 60_000, &logger);

        assert_eq!(
            messages(&capture),
            vec![
                "[INFO] Finger detected! Tracking heart rate.",
                "[WARNING] No valid readings to report.",
            ]
        );
        // Session restamped at the trigger time: the next flush is another
        // full interval away.
        monitor.poll(&mut source, 119_999, &logger);
        assert_eq!(capture.lines().len(), 2);
        monitor.poll(&mut source, 120_000, &logger);
        assert_eq!(capture.lines().len(), 3);
    }

    #[test]
    fn periodic_flush_during_contact_reports_and_keeps_tracking() {
        let (logger, capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 600;
        monitor.poll(&mut source, 0, &logger);
        source.beat(75);
        monitor.poll(&mut source, 1_000, &logger);
        monitor.poll(&mut source, 60_000, &logger);

        let msgs = messages(&capture);
        assert!(msgs.contains(&"[REPORT] Session complete. Avg BPM: 75.00, Total Beats: 1".to_string()));
        assert!(monitor.snapshot().finger_detected);
        assert_eq!(monitor.snapshot().total_heartbeats, 0);
    }

    #[test]
    fn beats_without_onset_flag_are_ignored() {
        let (logger, _capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 600;
        source.bpm = 72;
        monitor.poll(&mut source, 0, &logger);
        monitor.poll(&mut source, 1, &logger);

        assert_eq!(monitor.snapshot().total_heartbeats, 0);
    }

    #[test]
    fn implausible_bpm_is_filtered() {
        let (logger, _capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 600;
        monitor.poll(&mut source, 0, &logger);

        for bpm in [29, 201, 0, -5] {
            source.beat(bpm);
            monitor.poll(&mut source, 1, &logger);
        }
        assert_eq!(monitor.snapshot().total_heartbeats, 0);

        for bpm in [30, 200] {
            source.beat(bpm);
            monitor.poll(&mut source, 2, &logger);
        }
        assert_eq!(monitor.snapshot().total_heartbeats, 2);
    }

    #[test]
    fn no_beats_recorded_without_contact() {
        let (logger, _capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 10;
        source.beat(70);
        monitor.poll(&mut source, 0, &logger);

        assert_eq!(monitor.snapshot().total_heartbeats, 0);
    }

    #[test]
    fn unflushed_counters_survive_contact_reestablishment() {
        let (logger, _capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        source.amplitude = 600;
        monitor.poll(&mut source, 0, &logger);
        source.beat(70);
        monitor.poll(&mut source, 1, &logger);

        // Contact lost: report flushes, counters zeroed, fresh session id.
        source.amplitude = 10;
        monitor.poll(&mut source, 2, &logger);
        assert_eq!(monitor.snapshot().total_heartbeats, 0);
        let id_after_flush = monitor.snapshot().session_id;

        // Contact regained: only the timer restarts, identity and counters
        // carry over.
        source.amplitude = 600;
        monitor.poll(&mut source, 3, &logger);
        assert_eq!(monitor.snapshot().session_id, id_after_flush);
        source.beat(80);
        monitor.poll(&mut source, 4, &logger);
        assert_eq!(monitor.snapshot().total_heartbeats, 1);
    }

    #[test]
    fn command_bytes_dispatch_and_update_the_source() {
        let (logger, capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        for byte in b"SET_THRESHOLD:800\n" {
            monitor.push_command_byte(*byte, &mut source, &logger);
        }

        assert_eq!(monitor.detector().threshold(), 800);
        assert_eq!(source.threshold, Some(800));
        let msgs = messages(&capture);
        assert_eq!(msgs.last().unwrap(), "[INFO] Threshold updated.");
    }

    #[test]
    fn commands_are_processed_regardless_of_contact_state() {
        let (logger, capture) = test_logger();
        let mut source = ScriptedPulse::new();
        let mut monitor = Monitor::new(0, DetectorConfig::default());

        // No finger on the sensor, commands still flow.
        source.amplitude = 10;
        monitor.poll(&mut source, 0, &logger);
        for byte in b"HELP\n" {
            monitor.push_command_byte(*byte, &mut source, &logger);
        }

        let msgs = messages(&capture);
        assert_eq!(
            msgs.last().unwrap(),
            "[INFO] Commands: SET_THRESHOLD:<value>, HELP"
        );
    }
}
