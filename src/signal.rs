//! Signal-source boundary: the pulse sensor is a black box behind a trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Clock;

/// A PPG pulse sensor as the monitor sees it: raw amplitude samples, a
/// one-shot beat-onset flag, and a rolling BPM estimate.
pub trait PulseSource: Send {
    /// One-time initialization. An error here is fatal: the monitor refuses
    /// to start and offers no further service.
    fn begin(&mut self) -> Result<()>;

    /// Latest raw amplitude sample.
    fn latest_sample(&mut self) -> i32;

    /// Latest computed BPM estimate.
    fn beats_per_minute(&mut self) -> i32;

    /// True once per detected beat onset since the last poll.
    fn saw_start_of_beat(&mut self) -> bool;

    /// Update the beat-detection amplitude threshold.
    fn set_threshold(&mut self, threshold: u16);
}

const BEAT_PULSE_WIDTH_MS: u64 = 100;
const BEAT_PEAK_AMPLITUDE: i32 = 800;

/// Synthetic pulse source for the demo binary: a jittered baseline with
/// periodic beat pulses at a configurable rate. Contact is toggled through a
/// shared handle so a driver task can script finger on/off while the monitor
/// loop owns the source.
pub struct SimulatedPulse {
    clock: Arc<dyn Clock>,
    rng: StdRng,
    contact: Arc<AtomicBool>,
    threshold: u16,
    target_bpm: u16,
    last_beat_ms: u64,
    pending_beat: bool,
    last_bpm: i32,
}

impl SimulatedPulse {
    pub fn new(clock: Arc<dyn Clock>, target_bpm: u16) -> Self {
        Self {
            clock,
            rng: StdRng::from_entropy(),
            contact: Arc::new(AtomicBool::new(false)),
            threshold: crate::config::DEFAULT_SIGNAL_THRESHOLD,
            target_bpm,
            last_beat_ms: 0,
            pending_beat: false,
            last_bpm: 0,
        }
    }

    /// Shared contact switch: store `true` to put a finger on the sensor.
    pub fn contact_handle(&self) -> Arc<AtomicBool> {
        self.contact.clone()
    }

    fn in_contact(&self) -> bool {
        self.contact.load(Ordering::Relaxed)
    }

    fn beat_interval_ms(&self) -> u64 {
        60_000 / u64::from(self.target_bpm)
    }

    fn advance(&mut self) {
        if !self.in_contact() {
            // No finger: keep the beat clock parked so re-contact does not
            // replay a stale beat.
            self.last_beat_ms = self.clock.now_ms();
            return;
        }

        let now = self.clock.now_ms();
        let since_beat = now.wrapping_sub(self.last_beat_ms);
        if since_beat >= self.beat_interval_ms() {
            // Beats above the configured threshold register; raising the
            // threshold past the pulse peak silences detection.
            if i32::from(self.threshold) <= BEAT_PEAK_AMPLITUDE {
                self.pending_beat = true;
                self.last_bpm = (60_000 / since_beat.max(1)) as i32;
            }
            self.last_beat_ms = now;
        }
    }
}

impl PulseSource for SimulatedPulse {
    fn begin(&mut self) -> Result<()> {
        if self.target_bpm == 0 {
            bail!("simulated pulse needs a non-zero target BPM");
        }
        self.last_beat_ms = self.clock.now_ms();
        Ok(())
    }

    fn latest_sample(&mut self) -> i32 {
        self.advance();
        if !self.in_contact() {
            return self.rng.gen_range(0..=40);
        }
        let since_beat = self.clock.now_ms().wrapping_sub(self.last_beat_ms);
        if since_beat < BEAT_PULSE_WIDTH_MS {
            BEAT_PEAK_AMPLITUDE + self.rng.gen_range(-30..=50)
        } else {
            520 + self.rng.gen_range(-60..=60)
        }
    }

    fn beats_per_minute(&mut self) -> i32 {
        self.advance();
        self.last_bpm
    }

    fn saw_start_of_beat(&mut self) -> bool {
        self.advance();
        std::mem::take(&mut self.pending_beat)
    }

    fn set_threshold(&mut self, threshold: u16) {
        self.threshold = threshold;
    }
}
