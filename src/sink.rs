//! Protocol log fan-out: every line goes to every registered sink.
//!
//! This is the user-facing report channel (serial terminal, Bluetooth
//! terminal, test capture), distinct from the crate's internal `log`
//! diagnostics.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
    Error,
    Data,
    Warning,
    Report,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Error => "ERROR",
            LogLevel::Data => "DATA",
            LogLevel::Warning => "WARNING",
            LogLevel::Report => "REPORT",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivery target for formatted protocol lines. Delivery is best-effort;
/// implementations must not block or panic on failure.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes lines to standard output (the "serial monitor").
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Forwards lines into a channel, for a transport task to relay (the
/// "Bluetooth terminal"). Dropped receivers are ignored.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl LogSink for ChannelSink {
    fn write_line(&self, line: &str) {
        let _ = self.tx.send(line.to_string());
    }
}

/// Captures lines in memory. Used by tests and diagnostics surfaces.
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// Formats `[<elapsed_ms> ms] [<LEVEL>] <message>` and fans it out to every
/// registered sink.
pub struct Logger {
    clock: Arc<dyn Clock>,
    sinks: Vec<Box<dyn LogSink>>,
}

impl Logger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        let line = format!("[{} ms] [{}] {}", self.clock.now_ms(), level, message);
        for sink in &self.sinks {
            sink.write_line(&line);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn data(&self, message: &str) {
        self.log(LogLevel::Data, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn report(&self, message: &str) {
        self.log(LogLevel::Report, message);
    }
}
