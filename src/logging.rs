/*!
 * Process logger.
 *
 * Colourised, timestamped lines go to stderr at the configured level. Once a
 * run log is attached, every record at `Debug` and above is also appended to
 * that file without colour codes.
 */

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Level always captured by an attached run log
const FILE_LEVEL: LevelFilter = LevelFilter::Debug;

static LOGGER: Lazy<CustomLogger> = Lazy::new(|| CustomLogger::new(LevelFilter::Info));

// @struct: Custom logger implementation
pub struct CustomLogger {
    level: RwLock<LevelFilter>,
    file: Mutex<Option<File>>,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger {
            level: RwLock::new(level),
            file: Mutex::new(None),
        }
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }

    fn stderr_level(&self) -> LevelFilter {
        *self.level.read()
    }

    fn effective_max(&self) -> LevelFilter {
        let stderr = self.stderr_level();
        if self.file.lock().is_some() {
            stderr.max(FILE_LEVEL)
        } else {
            stderr
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.effective_max()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now();

        if record.level() <= self.stderr_level() {
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now.format("%H:%M:%S.%3f"),
                record.args()
            );
        }

        if record.level() <= FILE_LEVEL {
            if let Some(file) = self.file.lock().as_mut() {
                let _ = writeln!(
                    file,
                    "{} [{}] {}",
                    now.format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

// @initializes: Global logger
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&*LOGGER)?;
    set_level(level);
    Ok(())
}

/// Change the stderr level
pub fn set_level(level: LevelFilter) {
    *LOGGER.level.write() = level;
    log::set_max_level(LOGGER.effective_max());
}

/// Append every debug-level record to `path` from now on
pub fn attach_run_log<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open run log: {}", path.display()))?;

    *LOGGER.file.lock() = Some(file);
    log::set_max_level(LOGGER.effective_max());
    Ok(())
}
