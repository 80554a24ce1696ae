use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::config::{DEFAULT_SIGNAL_THRESHOLD, MAX_THRESHOLD, MIN_THRESHOLD, REPORT_INTERVAL_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub detector_threshold: u16,
    pub report_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub simulated_bpm: u16,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            detector_threshold: DEFAULT_SIGNAL_THRESHOLD,
            report_interval_ms: REPORT_INTERVAL_MS,
            tick_interval_ms: 20,
            simulated_bpm: 72,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UserSettings {
    monitor: MonitorSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(sanitize(data)),
        })
    }

    pub fn monitor(&self) -> MonitorSettings {
        self.data.read().unwrap().monitor.clone()
    }

    pub fn update_monitor(&self, settings: MonitorSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.monitor = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// A hand-edited file must not smuggle in a threshold the runtime command
/// path would reject; out-of-range values fall back to the default.
fn sanitize(mut data: UserSettings) -> UserSettings {
    let threshold = data.monitor.detector_threshold;
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
        data.monitor.detector_threshold = DEFAULT_SIGNAL_THRESHOLD;
    }
    data
}
