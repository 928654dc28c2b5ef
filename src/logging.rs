//! Diagnostics (component design §4.7).
//!
//! The poll engine instruments itself with `tracing` spans/events
//! unconditionally — logging never changes engine behavior, it's purely an
//! observability side channel, matching the teacher crate's `tracing` usage
//! (`default-features = false`, no behavior gated on a subscriber being
//! installed).
//!
//! Embedders who don't want to install a global `tracing` subscriber can
//! instead register a [`CallbackLogger`], grounded on the teacher's
//! callback-logger pattern.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

pub type LogCallback = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// A logger that forwards messages to a user-supplied callback instead of
/// (or in addition to) `tracing`.
#[derive(Clone, Default)]
pub struct CallbackLogger {
    callback: Option<LogCallback>,
}

impl CallbackLogger {
    pub fn new(callback: LogCallback) -> Self {
        CallbackLogger {
            callback: Some(callback),
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if let Some(cb) = &self.callback {
            cb(level, message);
        }
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }

    pub fn log_frame_sent(&self, frame: &[u8]) {
        self.log(LogLevel::Debug, &format!("sent frame: {frame:02X?}"));
    }

    pub fn log_frame_received(&self, frame: &[u8]) {
        self.log(LogLevel::Debug, &format!("received frame: {frame:02X?}"));
    }
}

impl std::fmt::Debug for CallbackLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackLogger")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
