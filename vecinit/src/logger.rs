//! Routing of diagnostics into the host application's logger.
//!
//! The crate logs through the `log` facade. [`set_logger`] installs a bridge
//! that forwards those records to a [`Logger`] supplied by the host.

use std::sync::{Arc, OnceLock};

/// Receiver for the crate's diagnostics.
///
/// Host applications implement this to route registration events into their
/// own logging. Registration done by the load-time hook happens before any
/// logger can be installed; query [`crate::status`] for its outcome.
///
/// # Examples
///
/// ```rust
/// use vecinit::logger::{Logger, LogLevel};
///
/// struct MyLogger;
///
/// impl Logger for MyLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{:?}] {}", level, message);
///     }
/// }
/// ```
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Very low priority, extremely detailed messages.
    Trace,
    /// Lower priority debugging information.
    Debug,
    /// Progress of the registration.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Failures the process can continue after.
    Error,
}

/// Forwards `log` records to the user-provided [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records are only forwarded when they come from this crate.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_debug_or_trace = level == log::Level::Debug || level == log::Level::Trace;
    let is_from_vecinit = module_path.is_some_and(|path| path.starts_with("vecinit"));
    !is_debug_or_trace || is_from_vecinit
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Sets the global logger.
///
/// Installs a `log` bridge forwarding to `logger`. Only the first call takes
/// effect; later calls print a message and keep the existing logger. If the
/// process already has another `log` implementation installed, the bridge is
/// not installed and an error is printed.
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
