//! Logging Infrastructure
//!
//! Structured logging setup. `RUST_LOG` wins over the configured level when
//! set; a log directory switches output to a daily rolling file.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// Calling this more than once is harmless: later installs are ignored.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "pos-core");
            let _ = builder.with_ansi(false).with_writer(file_appender).try_init();
            return;
        }
        eprintln!("log directory {} does not exist, logging to stdout", dir);
    }

    let _ = builder.try_init();
}
