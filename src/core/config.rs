use crate::error::{GetgoError, Result};
use crate::utils::fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://go.dev/dl";
pub const DEFAULT_RELEASES_URL: &str = "https://go.dev/dl/?mode=json";

pub const ENV_DOWNLOAD_BASE_URL: &str = "GETGO_DOWNLOAD_BASE_URL";
pub const ENV_RELEASES_URL: &str = "GETGO_RELEASES_URL";

/// Optional settings read from `config.toml`. Every key may be omitted.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub install_root: Option<PathBuf>,
    pub gopath: Option<PathBuf>,
    pub download_base_url: Option<String>,
    pub releases_url: Option<String>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub install_root: PathBuf,
    pub gopath: PathBuf,
    pub download_base_url: String,
    pub releases_url: String,
}

impl Config {
    /// Defaults, then the user's config file, then environment variables.
    pub fn load() -> Result<Self> {
        let file = match get_config_path() {
            Some(path) if path.exists() => {
                log::debug!("loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                ConfigFile::parse(&content).map_err(|e| {
                    GetgoError::config_error(format!("{}: {e}", path.display()))
                })?
            }
            _ => ConfigFile::default(),
        };

        Self::layered(file, |key| std::env::var(key).ok())
    }

    pub fn layered<F>(file: ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let install_root = fs::expand_path(
            file.install_root
                .as_deref()
                .unwrap_or_else(|| Path::new(".")),
        )?;

        let gopath = match file.gopath {
            Some(path) => fs::expand_path(&path)?,
            None => default_gopath()?,
        };

        let download_base_url = env(ENV_DOWNLOAD_BASE_URL)
            .or(file.download_base_url)
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_BASE_URL.to_string());
        let releases_url = env(ENV_RELEASES_URL)
            .or(file.releases_url)
            .unwrap_or_else(|| DEFAULT_RELEASES_URL.to_string());

        Ok(Config {
            install_root,
            gopath,
            download_base_url,
            releases_url,
        })
    }

    pub fn with_install_root(mut self, install_root: Option<&Path>) -> Result<Self> {
        if let Some(path) = install_root {
            self.install_root = fs::expand_path(path)?;
        }
        Ok(self)
    }

    pub fn with_gopath(mut self, gopath: Option<&Path>) -> Result<Self> {
        if let Some(path) = gopath {
            self.gopath = fs::expand_path(path)?;
        }
        Ok(self)
    }
}

fn default_gopath() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("go"))
        .ok_or(GetgoError::HomeDirectoryNotFound)
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("getgo").join("config.toml"))
}
