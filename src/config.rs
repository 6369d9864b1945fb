use std::path::{Path, PathBuf};

use compact_str::CompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    client::config::DEFAULT_API_URL,
    result::{AppError, Result},
};

/// Settings persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeBellConfig {
    pub github_url: CompactString,
    pub github_token: CompactString,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_pages: u32,
    pub log_level: Option<CompactString>,
    pub servo: ServoConfig,
}

/// Range and pacing of the celebration sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub min_angle: u16,
    pub max_angle: u16,
    /// Pause between two positions
    pub step_delay_ms: u64,
    /// Positions per leg of the sweep
    pub steps: u32,
}

impl Default for MergeBellConfig {
    fn default() -> Self {
        Self {
            github_url: DEFAULT_API_URL.into(),
            github_token: CompactString::default(),
            poll_interval_secs: 60,
            request_timeout_secs: 30,
            max_pages: 4,
            log_level: None,
            servo: ServoConfig::default(),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_angle: 0,
            max_angle: 180,
            step_delay_ms: 20,
            steps: 90,
        }
    }
}

impl MergeBellConfig {
    /// Checks what the client config does not: the actuator settings
    pub fn validate(&self) -> Result<()> {
        if self.servo.min_angle >= self.servo.max_angle {
            return Err(AppError::config_validation_error(
                "servo.min_angle",
                "min_angle must be below max_angle",
            ));
        }

        if self.servo.max_angle > 180 {
            return Err(AppError::config_validation_error(
                "servo.max_angle",
                "max_angle cannot exceed 180 degrees",
            ));
        }

        if self.servo.steps == 0 {
            return Err(AppError::config_validation_error(
                "servo.steps",
                "steps must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn has_token(&self) -> bool {
        !self.github_token.trim().is_empty()
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("merge-bell.toml")
    } else {
        PathBuf::from("merge-bell.toml")
    }
}

/// Loads the config, writing defaults first if the file does not exist
pub fn load_config(config_file: &Path) -> Result<MergeBellConfig> {
    confy::load_path(config_file).map_err(|e| AppError::config_load_error(config_file.to_path_buf(), e))
}

pub fn save_config(config_file: &Path, config: &MergeBellConfig) -> Result<()> {
    confy::store_path(config_file, config)
        .map_err(|e| AppError::config_save_error(config_file.to_path_buf(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(MergeBellConfig::default().validate().is_ok());
        assert!(!MergeBellConfig::default().has_token());
    }

    #[test]
    fn rejects_inverted_servo_range() {
        let config = MergeBellConfig {
            servo: ServoConfig { min_angle: 90, max_angle: 90, ..Default::default() },
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(AppError::ConfigValidationError { field, .. }) if field == "servo.min_angle"
        ));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("merge-bell.toml");

        let config = load_config(&path).expect("load should create the file");

        assert_eq!(config, MergeBellConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn saved_token_is_loaded_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("merge-bell.toml");
        let config = MergeBellConfig { github_token: "ghp_saved".into(), ..Default::default() };

        save_config(&path, &config).expect("save should succeed");

        assert_eq!(load_config(&path).expect("load should succeed").github_token, "ghp_saved");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("merge-bell.toml");
        std::fs::write(&path, "github_token = \"ghp_partial\"\n[servo]\nmax_angle = 120\n")
            .expect("write config");

        let config = load_config(&path).expect("load should succeed");

        assert_eq!(config.github_token, "ghp_partial");
        assert_eq!(config.servo.max_angle, 120);
        assert_eq!(config.servo.min_angle, 0);
        assert_eq!(config.poll_interval_secs, 60);
    }
}
