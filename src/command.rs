//! Line-oriented command intake: a fixed-size byte buffer plus the dispatch
//! that mutates detection sensitivity at runtime.

use crate::config::DetectorConfig;
use crate::signal::PulseSource;
use crate::sink::Logger;

pub const COMMAND_BUFFER_SIZE: usize = 64;
// One slot is reserved for the terminator, as on the wire protocol.
const MAX_CONTENT_BYTES: usize = COMMAND_BUFFER_SIZE - 1;

/// Fixed-capacity accumulator for inbound command bytes.
///
/// Backpressure policy: a full buffer dispatches whatever has accumulated
/// rather than blocking the transport or growing memory. The byte that
/// triggers the overflow is discarded along with the terminator requirement.
#[derive(Debug)]
pub struct CommandBuffer {
    buf: [u8; COMMAND_BUFFER_SIZE],
    len: usize,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self {
            buf: [0; COMMAND_BUFFER_SIZE],
            len: 0,
        }
    }
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns the completed command line (terminator
    /// stripped) when a newline arrives or the buffer is full.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte == b'\n' || self.len >= MAX_CONTENT_BYTES {
            let command = String::from_utf8_lossy(&self.buf[..self.len]).into_owned();
            self.len = 0;
            Some(command)
        } else {
            self.buf[self.len] = byte;
            self.len += 1;
            None
        }
    }

    pub fn pending_len(&self) -> usize {
        self.len
    }
}

/// Dispatch one complete command line. Every branch emits exactly one outcome
/// line on the protocol sinks (plus the leading debug trace).
pub fn process_command(
    command: &str,
    config: &mut DetectorConfig,
    source: &mut dyn PulseSource,
    logger: &Logger,
) {
    logger.debug("Processing command...");

    if let Some(argument) = command.strip_prefix("SET_THRESHOLD:") {
        // atoi semantics: malformed text parses as 0, which the range check
        // below rejects.
        let value = argument.trim().parse::<i32>().unwrap_or(0);
        if config.set_threshold(value) {
            source.set_threshold(config.threshold());
            logger.info("Threshold updated.");
        } else {
            logger.warning("Threshold out of range!");
        }
    } else if command == "HELP" {
        logger.info("Commands: SET_THRESHOLD:<value>, HELP");
    } else {
        logger.warning("Unknown command received.");
    }
}
