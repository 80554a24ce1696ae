//! Conditional diagnostics macros gated on a module-level `ENABLE_LOGS`
//! const. These cover internal diagnostics only; protocol output goes
//! through [`crate::sink::Logger`].
//!
//! Each module using them declares its own switch:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//! ```

/// Info-level diagnostics, emitted only when the calling module's
/// `ENABLE_LOGS` const is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Debug-level diagnostics, gated the same way.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Warn-level diagnostics, gated the same way.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level diagnostics, gated the same way.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
