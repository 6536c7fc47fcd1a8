//! Reading and atomically writing the config file.

use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The file is not valid TOML for [`Config`].
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    Serialize(toml::ser::Error),

    /// Creating the directory, writing the temp file, or replacing the
    /// config file failed.
    Write { path: PathBuf, source: io::Error },

    /// The platform reports no config directory for this user.
    NoConfigDir,
}

impl ConfigError {
    /// File the failure relates to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
            ConfigError::Serialize(_) | ConfigError::NoConfigDir => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {source}", path_display(path))
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {source}", path_display(path))
            }
            ConfigError::Serialize(source) => write!(f, "Failed to encode config: {source}"),
            ConfigError::Write { path, source } => {
                write!(f, "Failed to write config at {}: {source}", path_display(path))
            }
            ConfigError::NoConfigDir => write!(f, "No config directory available"),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } | ConfigError::Write { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Serialize(source) => Some(source),
            ConfigError::NoConfigDir => None,
        }
    }
}

impl Config {
    /// Load from the platform config path, or defaults when no file exists.
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::config_path()?)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        let contents = match fs::read_to_string(config_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: config_path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Write through a temp file in the target directory, then rename over
    /// the old file so readers never see a partial config.
    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let write_err = |source: io::Error| ConfigError::Write {
            path: config_path.to_path_buf(),
            source,
        };

        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        let mut staged = match parent {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(write_err)?;
                NamedTempFile::new_in(dir)
            }
            None => NamedTempFile::new_in("."),
        }
        .map_err(write_err)?;

        staged.write_all(contents.as_bytes()).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged
            .persist(config_path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("org", "gemchat", "gemchat")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }
}
