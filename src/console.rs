//! Console — line-oriented log sink on stdout
//!
//! Each line is prefixed with the running task's name, which is the name of
//! the host thread the kernel started it on:
//!
//! ```text
//! [ExampleTask1] Sent → dataID: 1 | DataValue: 0
//! [ExampleTask2] Priority Increased to 3
//! [main] ERROR queue creation failed (capacity 5, 120 bytes)
//! ```

use std::io::{self, Write};
use std::thread;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console as the global logger
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Format one line the way the console prints it
pub fn format_line(task: &str, level: Level, args: &std::fmt::Arguments<'_>) -> String {
    match level {
        Level::Info => format!("[{task}] {args}"),
        _ => format!("[{task}] {level} {args}"),
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let current = thread::current();
        let task = current.name().unwrap_or("?");
        let line = format_line(task, record.level(), record.args());
        let mut out = io::stdout().lock();
        // Nowhere left to report a failed console write
        let _ = writeln!(out, "{line}");
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
