use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::cli::{Cli, Command};
use crate::platform;
use crate::store::retention::RetentionPolicy;

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub retention: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid retention '{value}': {source}")]
    Retention {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("could not determine data directory, pass --data-dir")]
    NoDataDir,
}

#[derive(Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub retention: Option<RetentionPolicy>,
    pub verbose: bool,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Config {
    /// Merge the config file with command line flags, flags win.
    ///
    /// An explicit `--config` must exist; the default location may be absent.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => match platform::config_file() {
                Some(path) if path.exists() => FileConfig::load(&path)?,
                _ => FileConfig::default(),
            },
        };

        // only pruning reads the retention window
        let retention = match &cli.command {
            Command::Prune(args) => args.older_than.clone(),
            _ => {
                file.retention = None;
                None
            }
        };

        Config::resolve(file, cli.data_dir.clone(), retention, cli.verbose)
    }

    /// Combine file values with overrides into a usable config.
    pub fn resolve(
        file: FileConfig,
        data_dir: Option<PathBuf>,
        retention: Option<String>,
        verbose: bool,
    ) -> Result<Self, ConfigError> {
        let data_dir = data_dir
            .or(file.data_dir)
            .or_else(platform::data_dir)
            .ok_or(ConfigError::NoDataDir)?;

        let retention = retention
            .or(file.retention)
            .map(|value| {
                RetentionPolicy::parse(&value).map_err(|source| ConfigError::Retention { value, source })
            })
            .transpose()?;

        Ok(Config {
            data_dir,
            retention,
            verbose,
        })
    }
}
