//! Tracing setup: stderr for humans, an optional rolling JSON file for later

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "MERGE_BELL_LOG";
const LOG_DIR_ENV: &str = "MERGE_BELL_LOG_DIR";
const LOG_FILE_PREFIX: &str = "merge-bell.log";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level when `MERGE_BELL_LOG` is unset
    pub level: LevelFilter,
    /// Directory for the JSON log file, none disables it
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LevelFilter::INFO, log_dir: None }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            log_dir: std::env::var_os(LOG_DIR_ENV).map(PathBuf::from),
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_env_var(LOG_ENV)
            .with_default_directive(self.level.into())
            .from_env_lossy()
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// as long as logging is wanted.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>, String> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(config.env_filter());

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("cannot create log directory {}: {e}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(config.env_filter());
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_logs_info_to_stderr_only() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LevelFilter::INFO);
        assert!(config.log_dir.is_none());
    }
}
