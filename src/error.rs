use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GetgoError>;

#[derive(Error, Debug)]
pub enum GetgoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No archive found at {url}")]
    NotFound { url: String },

    #[error("Go version {version} not found for {platform}")]
    VersionNotFound {
        version: String,
        platform: String,
        download_page: String,
    },

    #[error("Download failed for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Extraction failed at {path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to extract entry outside the destination: {entry}")]
    UnsafeArchiveEntry { entry: String },

    #[error("Archive has no top-level go directory (looked for {path})")]
    MissingPayload { path: PathBuf },

    #[error("Invalid version format: '{version}'")]
    InvalidVersion { version: String },

    #[error("Unable to determine the latest Go version: {message}")]
    LatestVersionUnavailable { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Home directory not found")]
    HomeDirectoryNotFound,

    #[error("Shell configuration error: {message}")]
    ShellError { message: String },
}

impl GetgoError {
    pub fn transport<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        GetgoError::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn extraction<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        GetgoError::Extraction {
            path: path.into(),
            source,
        }
    }

    pub fn config_error<S: Into<String>>(message: S) -> Self {
        GetgoError::ConfigError {
            message: message.into(),
        }
    }

    pub fn shell_error<S: Into<String>>(message: S) -> Self {
        GetgoError::ShellError {
            message: message.into(),
        }
    }

    /// True when the requested archive does not exist upstream, as opposed
    /// to any other network failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GetgoError::NotFound { .. } | GetgoError::VersionNotFound { .. }
        )
    }

    /// Follow-up advice printed under the error message, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            GetgoError::VersionNotFound { download_page, .. } => Some(format!(
                "Please check that the version exists at {download_page}"
            )),
            _ => None,
        }
    }
}
