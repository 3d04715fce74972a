// src/utils/logging.rs
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up the logging framework using tracing_subscriber.
/// Reads log level filters from the `RUST_LOG` environment variable.
/// Defaults to "info" if `RUST_LOG` is not set.
///
/// When `log_dir` is given, every event is also appended to
/// `<log_dir>/<YYYYMMDD>.extract.log`.
pub fn setup_logging(log_dir: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")); // Default to INFO level

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let date = chrono::Local::now().format("%Y%m%d");
            let log_path = dir.join(format!("{}.extract.log", date));
            let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    tracing::debug!("Logging setup complete.");
    Ok(())
}
