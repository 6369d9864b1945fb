use std::{path::PathBuf, time::Duration};

use compact_str::CompactString;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    actuator::{Celebration, TracingServo},
    app::MergeBell,
    client::{ClientConfig, EventPoller, GithubApi},
    config::{MergeBellConfig, load_config, save_config},
    logging::{LoggingConfig, init_logging},
    result::{AppError, Result},
};

/// Command line settings that override or extend the stored config
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: PathBuf,
    pub token: Option<CompactString>,
    pub save_token: bool,
    pub log_dir: Option<PathBuf>,
    pub debug: bool,
}

pub struct AppComponents {
    pub bell: MergeBell<GithubApi, TracingServo>,
    pub config: MergeBellConfig,
    pub _log_guard: Option<WorkerGuard>,
}

pub fn initialize_app(options: StartupOptions) -> Result<AppComponents> {
    let config = load_config(&options.config_path)?;
    let log_guard = initialize_logging(&options, &config)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "merge-bell starting up");

    let config = apply_token_override(config, &options)?;
    if !config.has_token() {
        return Err(AppError::MissingGithubToken { path: options.config_path });
    }
    config.validate()?;

    let bell = create_bell(&config)?;

    Ok(AppComponents { bell, config, _log_guard: log_guard })
}

fn initialize_logging(
    options: &StartupOptions,
    config: &MergeBellConfig,
) -> Result<Option<WorkerGuard>> {
    let logging_config = logging_config(options, config);
    init_logging(logging_config).map_err(AppError::LoggingError)
}

fn logging_config(options: &StartupOptions, config: &MergeBellConfig) -> LoggingConfig {
    let mut logging_config = LoggingConfig::from_env();

    if let Some(log_dir) = &options.log_dir {
        logging_config.log_dir = Some(log_dir.clone());
    }

    if let Some(log_level) = &config.log_level {
        if let Ok(level) = log_level.parse::<LevelFilter>() {
            logging_config.level = level;
        }

        // "Off" silences the file, stderr still follows MERGE_BELL_LOG
        if log_level.eq_ignore_ascii_case("off") {
            logging_config.log_dir = None;
            logging_config.level = LevelFilter::INFO;
        }
    }

    if options.debug {
        logging_config.level = LevelFilter::DEBUG;
    }

    logging_config
}

/// A token given on the command line wins over the stored one, and is
/// written back when `save_token` is set.
fn apply_token_override(
    mut config: MergeBellConfig,
    options: &StartupOptions,
) -> Result<MergeBellConfig> {
    let Some(token) = options.token.as_ref().filter(|t| !t.trim().is_empty()) else {
        return Ok(config);
    };

    let changed = config.github_token != *token;
    config.github_token = token.clone();

    if options.save_token && changed {
        save_config(&options.config_path, &config)?;
        tracing::info!(path = %options.config_path.display(), "Saved GitHub token to config");
    }

    Ok(config)
}

fn create_bell(config: &MergeBellConfig) -> Result<MergeBell<GithubApi, TracingServo>> {
    let client_config = ClientConfig::from(config);
    let interval = client_config.polling.interval;
    let max_pages = client_config.polling.max_pages;

    let api = GithubApi::new(client_config)?;
    let poller = EventPoller::new(api, max_pages);
    let celebration = Celebration::new(TracingServo::default(), config.servo.clone());

    Ok(MergeBell::new(poller, celebration, interval.max(Duration::from_secs(1))))
}
