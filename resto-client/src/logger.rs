//! Logging Infrastructure
//!
//! Console logging by default, daily rolling files when a log directory is given.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with optional file output.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_logger(log_level: &str, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},reqwest=warn,hyper=warn")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        if Path::new(dir).is_dir() {
            let file_appender = tracing_appender::rolling::daily(dir, "floor-monitor");
            subscriber.with_ansi(false).with_writer(file_appender).init();
            return;
        }
        eprintln!("Log directory {dir} does not exist, logging to stdout");
    }

    subscriber.init();
}
