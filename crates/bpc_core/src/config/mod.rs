use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "BPC_CONFIG_PATH";

#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd";
#[cfg(windows)]
const DEFAULT_SHELL_FLAG: &str = "/c";
#[cfg(not(windows))]
const DEFAULT_SHELL: &str = "bash";
#[cfg(not(windows))]
const DEFAULT_SHELL_FLAG: &str = "-c";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub shell_flag: Option<String>,
}

impl Config {
    /// Program used for shell indirection, falling back to the platform default.
    pub fn shell(&self) -> &str {
        non_blank(self.shell.as_deref()).unwrap_or(DEFAULT_SHELL)
    }

    pub fn shell_flag(&self) -> &str {
        non_blank(self.shell_flag.as_deref()).unwrap_or(DEFAULT_SHELL_FLAG)
    }

    pub fn shell_command(&self, command: &str) -> ShellCommand {
        ShellCommand {
            shell: self.shell().to_string(),
            flag: self.shell_flag().to_string(),
            command: command.to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// A command line wrapped for `<shell> <flag> <command>` execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub shell: String,
    pub flag: String,
    pub command: String,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub shell: Option<String>,
    pub shell_flag: Option<String>,
}

pub fn config_path(home: &Path) -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    home.join(CONFIG_FILE_NAME)
}

/// A missing file yields defaults; an unreadable one yields defaults plus the error.
pub fn load_config_with_fallback(home: &Path) -> ConfigLoad {
    load_config_with_fallback_from_path(&config_path(home))
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "falling back to default config");
            ConfigLoad {
                config: Config::default(),
                error: Some(err),
            }
        }
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::invalid_data(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(shell) = non_blank(overrides.shell.as_deref()) {
        merged.shell = Some(shell.to_string());
    }
    if let Some(flag) = non_blank(overrides.shell_flag.as_deref()) {
        merged.shell_flag = Some(flag.to_string());
    }
    merged
}
