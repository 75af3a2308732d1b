//! Console logger for the non-interactive commands.
//!
//! Prints `[  1.234s INFO ] BUZZER: message` lines to stderr so the output
//! reads like the firmware's serial log.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

pub struct ConsoleLogger {
    started: OnceLock<Instant>,
}

impl ConsoleLogger {
    pub const fn new() -> Self {
        Self {
            started: OnceLock::new(),
        }
    }

    fn elapsed_secs(&self) -> f32 {
        self.started.get_or_init(Instant::now).elapsed().as_secs_f32()
    }
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:>8.3}s {:<5}] {}: {}",
            self.elapsed_secs(),
            level_str(record.level()),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: ConsoleLogger = ConsoleLogger::new();

/// Install the console logger. Does nothing if a logger is already set.
pub fn init(max_level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(max_level);
        LOGGER.elapsed_secs();
    }
}
