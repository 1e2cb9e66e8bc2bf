use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use log::{Level, Log, Metadata, Record};

/// Writes each record as one line, tagged with the logger's prefix and,
/// for warnings and errors, the level.
pub struct SimpleLogger<W: Write + Send> {
    target: Mutex<W>,
    prefix: &'static str,
}

impl<W: Write + Send> SimpleLogger<W> {
    pub fn new(target: W, prefix: &'static str) -> Self {
        SimpleLogger {
            target: Mutex::new(target),
            prefix,
        }
    }
}

impl SimpleLogger<io::Stderr> {
    pub fn to_stderr(prefix: &'static str) -> Self {
        Self::new(io::stderr(), prefix)
    }
}

impl<W: Write + Send> Log for SimpleLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = match record.level() {
            level @ (Level::Error | Level::Warn) => {
                writeln!(target, "{}{}: {}", self.prefix, level, record.args())
            }
            _ => writeln!(target, "{}{}", self.prefix, record.args()),
        };
    }

    fn flush(&self) {
        let _ = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}
