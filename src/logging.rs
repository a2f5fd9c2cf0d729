use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "sales_etl.log";

/// Initializes the logging system with both console and file output.
pub fn init_logging() {
    let _ = fs::create_dir_all(LOG_DIR);

    // Daily rotated JSON file next to the human readable console output
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sales_etl=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    // The guard flushes the file writer on drop; logging lives for the whole process
    std::mem::forget(guard);
}
