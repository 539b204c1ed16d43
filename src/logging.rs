//! Structured logging setup.
//!
//! Records go to two places:
//! - the log file, one JSON object per line with `timestamp`, `level`,
//!   `target` (the category: `llm`, `tool`, `interaction`, `system`) and
//!   `fields` (the message plus free-form data)
//! - stderr, warnings and errors only, so the interactive session stays readable
//!
//! `RUST_LOG` overrides the file filter. A log file that cannot be opened
//! disables the file sink; it never stops the agent.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Default file filter: everything from our own categories down to debug.
const DEFAULT_FILE_FILTER: &str =
    "warn,termpilot=debug,llm=debug,tool=debug,interaction=debug,system=debug";

/// Where log records ended up after initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSink {
    /// Log file in use, if it could be opened
    pub file: Option<PathBuf>,
}

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// JSON-lines layer writing to `file`.
pub fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
}

/// Install the global subscriber.
pub fn init_logging(log_file: &Path) -> Result<LogSink, TryInitError> {
    let (file_layer, file) = match open_log_file(log_file) {
        Ok(handle) => {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILE_FILTER));
            (
                Some(json_file_layer(handle).with_filter(filter)),
                Some(log_file.to_path_buf()),
            )
        }
        Err(e) => {
            eprintln!(
                "warning: could not open log file {}: {} (file logging disabled)",
                log_file.display(),
                e
            );
            (None, None)
        }
    };

    let console_layer = fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!(
        target: "system",
        log_file = %log_file.display(),
        file_sink = file.is_some(),
        "Logger initialized"
    );

    Ok(LogSink { file })
}
