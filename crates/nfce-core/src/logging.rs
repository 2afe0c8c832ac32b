//! Logging utilities with indicatif integration and a daily log file

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use indicatif::MultiProgress;
use log::LevelFilter;

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// Path of today's log file inside `dir` (`YYYY-MM-DD.log`)
pub fn daily_log_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.log", chrono::Local::now().format("%Y-%m-%d")))
}

/// Open (append) a log file, creating its directory.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Logger that prints through indicatif MultiProgress (TTY) or plain stderr,
/// and mirrors records into an optional log file.
///
/// The file has its own level so a quiet console still leaves a full
/// info-level trail on disk.
pub struct PipelineLogger {
    inner: env_logger::Logger,
    multi: Option<MultiProgress>,
    file: Option<Mutex<File>>,
    file_level: LevelFilter,
}

impl PipelineLogger {
    pub fn new(
        inner: env_logger::Logger,
        multi: Option<MultiProgress>,
        file: Option<File>,
        file_level: LevelFilter,
    ) -> Self {
        Self {
            inner,
            multi,
            file: file.map(Mutex::new),
            file_level,
        }
    }

    /// Most verbose level either output accepts
    fn max_level(&self) -> LevelFilter {
        if self.file.is_some() {
            self.inner.filter().max(self.file_level)
        } else {
            self.inner.filter()
        }
    }

    fn file_enabled(&self, level: log::Level) -> bool {
        self.file.is_some() && level <= self.file_level
    }

    fn console_line(&self, record: &log::Record) -> String {
        // Colors only when bars are active, which implies a TTY
        let (pre, label, post) = level_style(record.level(), self.multi.is_some());
        format!("[{pre}{label}{post}] {}", record.args())
    }

    fn file_line(record: &log::Record) -> String {
        let (_, label, _) = level_style(record.level(), false);
        format!(
            "{} - {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            label.trim_end(),
            record.args()
        )
    }
}

impl log::Log for PipelineLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || self.file_enabled(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            let line = self.console_line(record);
            match &self.multi {
                Some(multi) => multi.suspend(|| eprintln!("{line}")),
                None => eprintln!("{line}"),
            }
        }

        if !self.file_enabled(record.level()) {
            return;
        }
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{}", Self::file_line(record));
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// Initialize logging.
///
/// * `multi`: route console output around indicatif bars (TTY mode)
/// * `log_file`: also append records to this file, at info level (debug
///   with `debug`) regardless of `quiet`
///
/// `RUST_LOG` overrides the console level derived from `quiet` / `debug`.
pub fn init_logging(
    quiet: bool,
    debug: bool,
    multi: Option<&MultiProgress>,
    log_file: Option<&Path>,
) {
    let default_level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let inner = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .build();
    let file_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let file = log_file.and_then(|path| match open_log_file(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("[WARN ] cannot open log file {}: {e}", path.display());
            None
        }
    });

    let logger = PipelineLogger::new(inner, multi.cloned(), file, file_level);
    let max_level = logger.max_level();
    log::set_boxed_logger(Box::new(logger)).expect("failed to init logger");
    log::set_max_level(max_level);
}
