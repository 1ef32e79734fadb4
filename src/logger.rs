//! Line-oriented logger shared by all tools.
//!
//! Every record is a single `<tool>: <message>` line. Informational records
//! always reach stderr and are mirrored into the logfile when one is set.
//! Debug records only appear when verbose, and then prefer the logfile over
//! stderr so build output stays readable.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::env::{self, EnvLookup};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub logfile: Option<PathBuf>,
    pub verbose: bool,
}

impl LogSettings {
    /// Reads `<prefix>_LOGFILE` and `<prefix>_VERBOSE`. A logfile implies verbose.
    pub fn from_env(env: &impl EnvLookup, prefix: &str) -> Self {
        let logfile = env::var_path(env, &format!("{prefix}_LOGFILE"));
        let verbose = env::var_is_set(env, &format!("{prefix}_VERBOSE")) || logfile.is_some();
        Self { logfile, verbose }
    }
}

pub struct ToolLogger {
    name: &'static str,
    verbose: bool,
    logfile: Option<Mutex<File>>,
}

impl ToolLogger {
    pub fn new(name: &'static str, settings: &LogSettings) -> Self {
        let logfile = settings.logfile.as_deref().and_then(|path| match open_append(path) {
            Ok(file) => Some(Mutex::new(file)),
            Err(err) => {
                eprintln!("{name}: failed to open logfile {}: {err}", path.display());
                None
            }
        });
        Self {
            name,
            verbose: settings.verbose,
            logfile,
        }
    }

    /// Installs the logger as the global `log` backend.
    pub fn init(name: &'static str, settings: &LogSettings) {
        let logger = Self::new(name, settings);
        let level = logger.level_filter();
        if log::set_boxed_logger(Box::new(logger)).is_ok() {
            log::set_max_level(level);
        }
    }

    fn level_filter(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    fn write_logfile(&self, line: &str) -> bool {
        let Some(file) = &self.logfile else {
            return false;
        };
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{line}");
        }
        true
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Log for ToolLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_filter()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("{}: {}", self.name, record.args());
        if record.level() <= Level::Info {
            eprintln!("{line}");
            self.write_logfile(&line);
        } else if !self.write_logfile(&line) {
            eprintln!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.logfile
            && let Ok(mut file) = file.lock()
        {
            let _ = file.flush();
        }
    }
}
