//! Kernel Log Sink
//!
//! Routes `log` records to a byte sink (the serial port or the console
//! driver) chosen at boot. The sink sits behind a spinlock because any
//! context crossing the boundary may log.

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Output target for log lines.
pub type Sink = &'static mut (dyn Write + Send);

/// A `log` backend writing `[LEVEL] target: message` lines.
pub struct KernelLogger {
    sink: Mutex<Option<Sink>>,
    level: LevelFilter,
}

impl KernelLogger {
    /// A logger with no sink yet; records are dropped until one is attached.
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            sink: Mutex::new(None),
            level,
        }
    }

    /// Attach (or replace) the output sink.
    pub fn attach(&self, sink: Sink) {
        *self.sink.lock() = Some(sink);
    }

    fn write_record(out: &mut dyn Write, record: &Record<'_>) -> fmt::Result {
        writeln!(out, "[{}] {}: {}", record.level(), record.target(), record.args())
    }
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = self.sink.lock().as_mut() {
            let _ = Self::write_record(&mut **sink, record);
        }
    }

    fn flush(&self) {}
}

/// Install `logger` as the global `log` backend writing to `sink`.
pub fn init(logger: &'static KernelLogger, sink: Sink) -> Result<(), SetLoggerError> {
    logger.attach(sink);
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}
