use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Accumulated statistics for the current heart-rate session.
///
/// A session spans the window between two report-triggering events (finger
/// removal or the periodic flush). Owned exclusively by the monitor; never
/// shared across tasks.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    total_heartbeats: u32,
    bpm_sum: u32,
    // Equals total_heartbeats today; kept separate so averaging can diverge
    // from beat counting later without a data-model change.
    reading_count: u32,
    started_at_ms: u64,
}

impl Session {
    pub fn new(now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            total_heartbeats: 0,
            bpm_sum: 0,
            reading_count: 0,
            started_at_ms: now_ms,
        }
    }

    /// Accept one validated BPM reading. Validation (plausibility band and
    /// beat-onset gating) is the monitor's job; this only accumulates.
    pub fn record(&mut self, bpm: u16) {
        self.total_heartbeats += 1;
        self.bpm_sum += u32::from(bpm);
        self.reading_count += 1;
    }

    /// Arithmetic mean of recorded readings, 0.0 when none were recorded.
    pub fn average_bpm(&self) -> f32 {
        if self.reading_count > 0 {
            self.bpm_sum as f32 / self.reading_count as f32
        } else {
            0.0
        }
    }

    pub fn total_heartbeats(&self) -> u32 {
        self.total_heartbeats
    }

    pub fn reading_count(&self) -> u32 {
        self.reading_count
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    /// Zero all counters and stamp a fresh start. Safe to call repeatedly.
    pub fn reset(&mut self, now_ms: u64) {
        *self = Self::new(now_ms);
    }

    /// Restamp the session start time without touching the counters. Used on
    /// finger re-detection, where any unflushed counters deliberately carry
    /// over into the new contact window.
    pub fn restart_timer(&mut self, now_ms: u64) {
        self.started_at_ms = now_ms;
        self.started_at = Utc::now();
    }

    /// Time since the session started. Wrapping so an overflowing tick
    /// counter cannot panic.
    pub fn elapsed_since(&self, now_ms: u64) -> u64 {
        now_ms.wrapping_sub(self.started_at_ms)
    }
}
