use log::{error, info, warn};
use std::fmt::Display;
use std::path::Path;

// For file-based logging with rotation
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LogLevel;
use crate::error::{Error, Result};
use crate::types::MediaCategory;

/// Initialize the logger with timestamp, log level, and module path.
/// Logs go to a rotating file so the host app's console stays clean.
pub fn init_logger(log_dir: &Path, level: LogLevel) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let log_file_path = log_dir.join("media-cleaner.log");
    let archived_logs_pattern = log_dir.join("media-cleaner.{}.log");

    // Rotate at 10MB and keep 5 archived files
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern.to_string_lossy(), 5)
        .map_err(|e| Error::Configuration(format!("Failed to create log roller: {}", e)))?;
    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(&log_file_path, Box::new(compound_policy))
        .map_err(|e| Error::Configuration(format!("Failed to create log appender: {}", e)))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(
            Root::builder()
                .appender("file")
                .build(level.to_level_filter()),
        )
        .map_err(|e| Error::Configuration(format!("Failed to build log config: {}", e)))?;

    log4rs::init_config(config)
        .map_err(|e| Error::Configuration(format!("Failed to initialize log4rs: {}", e)))?;

    info!("Media cleaner logging started");
    info!("Logging to file: {}", log_file_path.display());
    Ok(())
}

/// Log a fingerprint that could not be computed
pub fn log_fingerprint_error(key: &str, error: &dyn Display) {
    warn!(
        "Fingerprint computation failed - Item: {}, Error: {}",
        key, error
    );
}

/// Log a cache operation that failed
pub fn log_cache_error(category: MediaCategory, operation: &str, error: &dyn Display) {
    error!(
        "Cache operation failed - Operation: {}, Category: {}, Error: {}",
        operation, category, error
    );
}

/// Log a change made to the media library
pub fn log_library_change(operation: &str, keys: &[String], details: Option<&str>) {
    let details_str = details.unwrap_or("");
    info!(
        "LIBRARY CHANGE - Operation: {}, Items: {}{}",
        operation,
        keys.len(),
        if details_str.is_empty() {
            "".to_string()
        } else {
            format!(", Details: {}", details_str)
        }
    );
}
