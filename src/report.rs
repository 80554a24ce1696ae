use crate::config::{MAX_HEART_RATE, MIN_HEART_RATE};
use crate::session::Session;

/// Summary of a completed session, ready for formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub avg_bpm: f32,
    pub total_beats: u32,
}

impl SessionSummary {
    pub fn report_line(&self) -> String {
        format!(
            "Session complete. Avg BPM: {:.2}, Total Beats: {}",
            self.avg_bpm, self.total_beats
        )
    }
}

/// Returns `None` when the session collected no valid readings, in which case
/// the caller emits a warning instead of a report.
pub fn summarize(session: &Session) -> Option<SessionSummary> {
    if session.reading_count() == 0 {
        return None;
    }
    Some(SessionSummary {
        avg_bpm: session.average_bpm(),
        total_beats: session.total_heartbeats(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    TooHigh,
    TooLow,
    Normal,
}

impl Recommendation {
    /// Band an average BPM. The extremes are strict inequalities, so exactly
    /// 120.0 and exactly 40.0 both classify as Normal.
    pub fn for_average(avg_bpm: f32) -> Self {
        if avg_bpm > MAX_HEART_RATE {
            Recommendation::TooHigh
        } else if avg_bpm < MIN_HEART_RATE {
            Recommendation::TooLow
        } else {
            Recommendation::Normal
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::TooHigh => "Relax and breathe deeply to lower your heart rate.",
            Recommendation::TooLow => "Try light exercise to raise your heart rate.",
            Recommendation::Normal => "Heart rate is within a healthy range. Keep it up!",
        }
    }
}
