#![deny(missing_docs)]
//! Shared logging utilities for the StealthQuote workspace.
//!
//! This crate provides the `quote_*` logging macros used across the codebase,
//! the verbosity mapping used by the command line, and a minimal test
//! initializer for the global logger.

#[doc(hidden)]
pub use log;

use log::LevelFilter;

/// Log target used by every `quote_*` macro.
pub const TARGET: &str = "stealthquote";

/// Logs a trace-level message under the workspace target.
#[macro_export]
macro_rules! quote_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the workspace target.
#[macro_export]
macro_rules! quote_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the workspace target.
#[macro_export]
macro_rules! quote_info {
    ($($arg:tt)*) => {{
        $crate::log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the workspace target.
#[macro_export]
macro_rules! quote_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the workspace target.
#[macro_export]
macro_rules! quote_error {
    ($($arg:tt)*) => {{
        $crate::log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Maps a `-v` repetition count to a level filter.
///
/// Zero keeps the default of `Info`; each extra flag lowers the threshold.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
