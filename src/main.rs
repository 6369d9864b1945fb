use std::path::PathBuf;

use clap::Parser;
use compact_str::CompactString;

use crate::{app_init::StartupOptions, config::default_config_path};

mod actuator;
mod app;
mod app_init;
mod client;
mod config;
mod domain;
mod id;
mod logging;
mod result;
mod stream;
#[cfg(test)]
mod test_utils;

/// Watches your GitHub activity and celebrates every merged pull request
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file, defaults to merge-bell.toml in the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GitHub personal access token, overrides the stored one
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<CompactString>,

    /// Write the token given with --token back to the config file
    #[arg(long, requires = "token")]
    save_token: bool,

    /// Run a single poll cycle and print the login, newest event and rate
    /// limit. That cycle only sets the baseline, so it never reports a merge.
    #[arg(long)]
    once: bool,

    /// Also write JSON logs to this directory
    #[arg(long, env = "MERGE_BELL_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config.unwrap_or_else(default_config_path),
        token: cli.token,
        save_token: cli.save_token,
        log_dir: cli.log_dir,
        debug: cli.debug,
    };

    let components = app_init::initialize_app(options)?;
    let mut bell = components.bell;
    tracing::debug!(config = ?components.config.servo, max_pages = components.config.max_pages, "Configuration loaded");

    if cli.once {
        bell.tick().await;
        println!("{}", bell.status_report());
        return Ok(());
    }

    bell.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}
