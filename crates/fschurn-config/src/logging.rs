//! Structured logging for the fschurn pipeline stages.
//!
//! Every event carries a `component` field naming the stage that emitted it.
//!
//! # Usage
//!
//! ```ignore
//! use fschurn_config::{log_walk_warn, log_worker_error};
//!
//! log_walk_warn!(path = %dir.display(), "Failed to read directory");
//! log_worker_error!(worker = idx, error = %e, "Operation failed, worker stopping");
//! ```

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const WALK: &'static str = "WALK";
    pub const SAMPLE: &'static str = "SAMPLE";
    pub const WORKER: &'static str = "WORKER";
    pub const FILL: &'static str = "FILL";
    pub const CLI: &'static str = "CLI";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map a `-v` count onto a level, starting from `Info`.
    pub fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// === WALK logging macros ===

#[macro_export]
macro_rules! log_walk_warn {
    ($($arg:tt)+) => {
        $crate::tracing::warn!(component = "WALK", $($arg)+)
    };
}

#[macro_export]
macro_rules! log_walk_debug {
    ($($arg:tt)+) => {
        $crate::tracing::debug!(component = "WALK", $($arg)+)
    };
}

// === SAMPLE logging macros ===

#[macro_export]
macro_rules! log_sample_info {
    ($($arg:tt)+) => {
        $crate::tracing::info!(component = "SAMPLE", $($arg)+)
    };
}

#[macro_export]
macro_rules! log_sample_debug {
    ($($arg:tt)+) => {
        $crate::tracing::debug!(component = "SAMPLE", $($arg)+)
    };
}

// === WORKER logging macros ===

#[macro_export]
macro_rules! log_worker_error {
    ($($arg:tt)+) => {
        $crate::tracing::error!(component = "WORKER", $($arg)+)
    };
}

#[macro_export]
macro_rules! log_worker_debug {
    ($($arg:tt)+) => {
        $crate::tracing::debug!(component = "WORKER", $($arg)+)
    };
}

// === FILL logging macros ===

#[macro_export]
macro_rules! log_fill_info {
    ($($arg:tt)+) => {
        $crate::tracing::info!(component = "FILL", $($arg)+)
    };
}

#[macro_export]
macro_rules! log_fill_error {
    ($($arg:tt)+) => {
        $crate::tracing::error!(component = "FILL", $($arg)+)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_info {
    ($($arg:tt)+) => {
        $crate::tracing::info!(component = "CLI", $($arg)+)
    };
}

/// Initialize logging with the given level filter.
/// Call this once at application startup.
///
/// `FSCHURN_LOG` takes precedence over `RUST_LOG`; both override `level`.
/// Output goes to stderr so reports on stdout stay machine-readable.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_env("FSCHURN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .init();
}
