use crate::error::{GetgoError, Result};

/// Version normalization utilities
pub mod normalize {
    /// True for the aliases that request the newest stable release.
    pub fn is_latest(version: &str) -> bool {
        version == "latest" || version == "-"
    }

    /// Strip the `go` prefix used by release tags.
    /// Examples: "go1.22.0" -> "1.22.0", "1.22.0" -> "1.22.0"
    pub fn to_plain_version(version: &str) -> String {
        version.strip_prefix("go").unwrap_or(version).to_string()
    }

    /// Name of the versioned install directory.
    /// Examples: "1.22.0" -> "go1.22.0", "go1.22.0" -> "go1.22.0"
    pub fn to_dir_name(version: &str) -> String {
        format!("go{}", to_plain_version(version))
    }
}

/// Reject version strings that could not name a release or would escape the
/// install root once turned into a directory name.
pub fn validate_version(version: &str) -> Result<()> {
    let valid = !version.is_empty()
        && version
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
        && !version.contains("..")
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(GetgoError::InvalidVersion {
            version: version.to_string(),
        })
    }
}
