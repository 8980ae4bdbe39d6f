/// Anvil logging facade
///
/// The logger is the only process-wide state in the renderer. Devices,
/// resource tables and render targets are owned by the `FrameRenderer` and
/// passed explicitly; nothing else lives in a global.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

/// Entry point for the renderer-wide logger
///
/// # Example
///
/// ```no_run
/// use anvil_renderer::anvil::{Engine, log::{Logger, LogEntry}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Engine::set_logger(FileLogger);
/// ```
pub struct Engine;

impl Engine {
    /// Replace the current logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        install(Box::new(logger));
    }

    /// Reset logger to `DefaultLogger`
    pub fn reset_logger() {
        install(Box::new(DefaultLogger::new()));
    }

    /// Log without location (used by engine_info!, engine_warn!, ...)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        emit(severity, source, message, None);
    }

    /// Log with file:line information (used by engine_error!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        emit(severity, source, message, Some((file, line)));
    }
}

fn install(logger: Box<dyn Logger>) {
    // Logging keeps working after a logger panicked
    let mut slot = logger_slot().write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = logger;
}

fn emit(severity: LogSeverity, source: &str, message: String, location: Option<(&'static str, u32)>) {
    let slot = logger_slot().read().unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.log(&LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: location.map(|(file, _)| file),
        line: location.map(|(_, line)| line),
    });
}
