//! Process logger.
//!
//! One log file per process start, named after the start time
//! (`logs/10_18_2026_14_03_22.log`), with lines of the form:
//!
//! ```text
//! [ 2026-10-18 14:03:22,481 ] 57 student_score::io::ingest - INFO - Raw data saved
//! ```
//!
//! The logger is built once in `main` from [`LogConfig`] and installed as the
//! global `tracing` subscriber; components log through the `tracing` macros.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{AppError, ErrorKind};

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for the per-process log file; `None` disables the file sink.
    pub dir: Option<PathBuf>,
    /// Default level directive (`info`, `debug`, ...). `RUST_LOG` wins if set.
    pub level: String,
    /// Mirror events to stderr as well.
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: Some(PathBuf::from("logs")),
            level: "info".to_string(),
            console: false,
        }
    }
}

/// Handle to the installed logger.
#[derive(Debug, Clone)]
pub struct Logger {
    file_path: Option<PathBuf>,
}

impl Logger {
    /// Build the sinks described by `config` and install them globally.
    ///
    /// Must be called at most once per process.
    pub fn init(config: &LogConfig) -> Result<Self, AppError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .map_err(|e| {
                AppError::wrap(ErrorKind::Config, format!("Invalid log level '{}'", config.level), e)
            })?;

        let (file_layer, file_path) = match &config.dir {
            Some(dir) => {
                let (file, path) = open_log_file(dir, Local::now())?;
                let layer = tracing_subscriber::fmt::layer()
                    .event_format(LogLineFormat)
                    .with_writer(Mutex::new(file));
                (Some(layer), Some(path))
            }
            None => (None, None),
        };

        let console_layer = config.console.then(|| {
            tracing_subscriber::fmt::layer()
                .event_format(LogLineFormat)
                .with_writer(std::io::stderr)
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()
            .map_err(|e| AppError::wrap(ErrorKind::Config, "Logger already initialised", e))?;

        if let Some(path) = &file_path {
            tracing::info!("Logging to {}", path.display());
        }

        Ok(Self { file_path })
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

/// File name for a log started at `now`.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}.log", now.format("%m_%d_%Y_%H_%M_%S"))
}

fn open_log_file(dir: &Path, now: DateTime<Local>) -> Result<(File, PathBuf), AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::wrap(
            ErrorKind::Config,
            format!("Failed to create log dir '{}'", dir.display()),
            e,
        )
    })?;

    let path = dir.join(log_file_name(now));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            AppError::wrap(
                ErrorKind::Config,
                format!("Failed to open log file '{}'", path.display()),
                e,
            )
        })?;

    Ok((file, path))
}

/// `[ time ] line target - LEVEL - message`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "[ {} ] {} {} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            meta.line().unwrap_or(0),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
