//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for informational terminal output with a colored prefix
//! - `warn!` / `error!` macros for diagnostics written to stderr
//! - `debug!` macro gated on verbose mode
//!
//! # Example
//!
//! ```ignore
//! log!("mjml"; "src/a.mjml -> dist/a.html");
//! warn!("mjml"; "No MJML files found under {}", dir.display());
//! error!("mjml"; "Failed to compile {}: {}", path.display(), err);
//! ```

use owo_colors::{OwoColorize, Stream};
use std::{
    io::{Write, stderr, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set from config or `MJML_BUILD_VERBOSE`)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Message severity, selects the output stream and prefix color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($crate::logger::Level::Info, $module, &format!($($arg)*))
    }};
}

/// Log a warning to stderr
#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($crate::logger::Level::Warn, $module, &format!($($arg)*))
    }};
}

/// Log an error to stderr
#[macro_export]
macro_rules! error {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($crate::logger::Level::Error, $module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown in verbose mode)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($crate::logger::Level::Info, $module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write one line with a colored module prefix.
///
/// Info goes to stdout, warnings and errors go to stderr.
pub fn log(level: Level, module: &str, message: &str) {
    let line = format_line(level, module, message);

    match level {
        Level::Info => {
            let mut out = stdout().lock();
            writeln!(out, "{line}").ok();
            out.flush().ok();
        }
        Level::Warn | Level::Error => {
            let mut err = stderr().lock();
            writeln!(err, "{line}").ok();
            err.flush().ok();
        }
    }
}

/// Build the full output line for a message.
fn format_line(level: Level, module: &str, message: &str) -> String {
    format!("{} {message}", colorize_prefix(level, module))
}

/// Apply color to a module prefix based on severity and module name
fn colorize_prefix(level: Level, module: &str) -> String {
    let prefix = format!("[{module}]");
    match level {
        Level::Error => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_red().bold().to_string())
            .to_string(),
        Level::Warn => prefix
            .if_supports_color(Stream::Stderr, |p| p.yellow().bold().to_string())
            .to_string(),
        Level::Info => match module.to_ascii_lowercase().as_str() {
            "serve" => prefix
                .if_supports_color(Stream::Stdout, |p| p.bright_blue().bold().to_string())
                .to_string(),
            "watch" => prefix
                .if_supports_color(Stream::Stdout, |p| p.bright_green().bold().to_string())
                .to_string(),
            _ => prefix
                .if_supports_color(Stream::Stdout, |p| p.bright_cyan().bold().to_string())
                .to_string(),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
