//! # Kernel Log Sink
//!
//! A [`log::Log`] implementation that writes one line per record in the
//! style of the kernel ring buffer:
//!
//! ```text
//! <7>[DEBUG] dmaer::device: dmaer: open
//! <4>[WARN] dmaer::descriptor: source 0x40000ff0 +0x20 straddles a page boundary
//! ```
//!
//! The leading `<N>` is the syslog priority of the level, as `printk`
//! prefixes carry it. Any [`core::fmt::Write`] can be the sink: a UART, a
//! ring buffer, or a `String` in tests.

use core::fmt::{self, Write};
use dmaer_sync::SpinLock;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct KmsgLogger<W> {
    max_level: LevelFilter,
    sink: SpinLock<W>,
}

impl<W> KmsgLogger<W> {
    #[must_use]
    pub const fn new(sink: W, max_level: LevelFilter) -> Self {
        Self {
            max_level,
            sink: SpinLock::new(sink),
        }
    }

    /// Run `f` on the sink, e.g. to drain what was written so far.
    pub fn with_sink<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        self.sink.with_lock(f)
    }
}

impl<W: Write + Send> KmsgLogger<W> {
    /// Make this the global logger.
    ///
    /// # Errors
    /// If a logger is already installed.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }

    fn write_record(&self, record: &Record) -> fmt::Result {
        self.sink.with_lock(|w| {
            writeln!(
                w,
                "<{}>[{}] {}: {}",
                priority(record.level()),
                record.level(),
                record.target(),
                record.args()
            )
        })
    }
}

/// Syslog priority for a log level.
const fn priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug | Level::Trace => 7,
    }
}

impl<W: Write + Send> Log for KmsgLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // nowhere to report a failing sink
            let _ = self.write_record(record);
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(logger: &KmsgLogger<String>, level: Level, msg: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("dmaer::test")
                .args(format_args!("{msg}"))
                .build(),
        );
    }

    #[test]
    fn lines_carry_priority_level_and_target() {
        let logger = KmsgLogger::new(String::new(), LevelFilter::Trace);
        emit(&logger, Level::Error, "boom");
        emit(&logger, Level::Trace, "step");
        let out = logger.with_sink(core::mem::take);
        assert_eq!(out, "<3>[ERROR] dmaer::test: boom\n<7>[TRACE] dmaer::test: step\n");
    }

    #[test]
    fn records_above_max_level_are_dropped() {
        let logger = KmsgLogger::new(String::new(), LevelFilter::Warn);
        emit(&logger, Level::Info, "quiet");
        emit(&logger, Level::Warn, "loud");
        assert_eq!(logger.with_sink(|s| s.clone()), "<4>[WARN] dmaer::test: loud\n");
    }
}
