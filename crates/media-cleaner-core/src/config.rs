use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::deduplication::ClusterStrategy;
use crate::error::{Error, Result};

/// Upper bound used when the worker count is left on auto
const AUTO_WORKER_CAP: usize = 4;

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for a media cleanup session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum fingerprint distance at which two photos count as duplicates
    pub similarity_threshold: f32,

    /// Number of buckets clustered at the same time (0 = auto)
    pub max_concurrent_buckets: usize,

    /// Minimum byte size for the large-videos category
    pub large_video_min_bytes: u64,

    /// Lower-case filename fragments that mark a screen recording
    pub screen_recording_markers: Vec<String>,

    /// Number of sampled frames every video must carry
    pub frame_sample_count: usize,

    /// Offset from UTC used to compute calendar-day buckets
    pub utc_offset_seconds: i32,

    /// How duplicate groups grow around their seed
    pub cluster_strategy: ClusterStrategy,

    /// Directory holding the per-category cache files (None = platform data dir)
    pub cache_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.2,
            max_concurrent_buckets: 3,
            large_video_min_bytes: 100 * 1024 * 1024,
            screen_recording_markers: vec![
                "rpreplay_final".to_string(),
                "screenrecording".to_string(),
            ],
            frame_sample_count: 3,
            utc_offset_seconds: 0,
            cluster_strategy: ClusterStrategy::SeedAnchored,
            cache_dir: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite() || self.similarity_threshold < 0.0 {
            return Err(Error::Configuration(
                "Similarity threshold must be a non-negative number".to_string(),
            ));
        }

        if self.max_concurrent_buckets > 64 {
            return Err(Error::Configuration(
                "At most 64 buckets can be clustered concurrently".to_string(),
            ));
        }

        if self.frame_sample_count == 0 {
            return Err(Error::Configuration(
                "Videos must carry at least one sampled frame".to_string(),
            ));
        }

        if self.utc_offset_seconds.abs() >= 24 * 60 * 60 {
            return Err(Error::Configuration(
                "UTC offset must be less than 24 hours".to_string(),
            ));
        }

        if self.screen_recording_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::Configuration(
                "Screen recording markers cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of worker threads used by the bucket scheduler
    pub fn worker_count(&self) -> usize {
        match self.max_concurrent_buckets {
            0 => num_cpus::get().clamp(1, AUTO_WORKER_CAP),
            n => n,
        }
    }

    /// Directory where cache blobs live
    pub fn resolved_cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("media-cleaner"),
        }
    }
}
