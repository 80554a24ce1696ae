pub mod clock;
pub mod command;
pub mod config;
pub mod contact;
pub mod controller;
pub mod monitor;
pub mod report;
pub mod session;
pub mod settings;
pub mod signal;
pub mod sink;
pub mod utils;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DetectorConfig;
pub use controller::MonitorController;
pub use monitor::{Monitor, MonitorSnapshot};
pub use report::{Recommendation, SessionSummary};
pub use session::Session;
pub use settings::{MonitorSettings, SettingsStore};
pub use signal::{PulseSource, SimulatedPulse};
pub use sink::{ChannelSink, LogLevel, LogSink, Logger, MemorySink, StdoutSink};
