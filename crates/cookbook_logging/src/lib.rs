#![deny(missing_docs)]
//! Shared logging utilities for the cookbook workspace.
//!
//! This crate provides the `cookbook_*` logging macros used across the
//! codebase, a thread-local scope label that is prefixed to every message,
//! and a minimal test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Thread-local label for the step currently running (a source name or a pipeline step).
    static SCOPE: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Sets the scope label for the current thread.
///
/// The orchestrator calls this when it moves to a new source or step so that
/// log lines from shared helpers (fetcher, rate limiter) can be attributed.
pub fn set_scope(scope: &str) {
    SCOPE.with(|s| {
        let mut s = s.borrow_mut();
        s.clear();
        s.push_str(scope);
    });
}

/// Clears the scope label for the current thread.
pub fn clear_scope() {
    SCOPE.with(|s| s.borrow_mut().clear());
}

/// Retrieves the scope label for the current thread.
/// Returns an empty string if no scope has been set.
pub fn current_scope() -> String {
    SCOPE.with(|s| s.borrow().clone())
}

/// Formats the scope prefix used by the logging macros: `"[scope] "` or `""`.
#[doc(hidden)]
pub fn scope_prefix() -> String {
    SCOPE.with(|s| {
        let s = s.borrow();
        if s.is_empty() {
            String::new()
        } else {
            format!("[{}] ", s)
        }
    })
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! cookbook_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::scope_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! cookbook_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::scope_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! cookbook_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::scope_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! cookbook_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::scope_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! cookbook_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::scope_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
