use crate::core::download::USER_AGENT;
use crate::core::version::normalize;
use crate::error::{GetgoError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GoRelease {
    pub version: String,
    pub stable: bool,
}

pub struct ReleaseClient {
    client: Client,
    url: String,
}

impl ReleaseClient {
    pub fn new<S: Into<String>>(client: Client, url: S) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn get_releases(&self) -> Result<Vec<GoRelease>> {
        log::debug!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .map_err(|e| GetgoError::transport(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GetgoError::transport(
                &self.url,
                format!("bad status: {status}"),
            ));
        }

        let body = response
            .text()
            .map_err(|e| GetgoError::transport(&self.url, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Newest stable version without the `go` prefix, e.g. `1.23.1`.
    pub fn latest_version(&self) -> Result<String> {
        pick_latest(&self.get_releases()?)
    }
}

/// First stable entry, falling back to the first entry of the listing.
pub fn pick_latest(releases: &[GoRelease]) -> Result<String> {
    let release = releases
        .iter()
        .find(|r| r.stable)
        .or_else(|| releases.first())
        .ok_or_else(|| GetgoError::LatestVersionUnavailable {
            message: "the release listing is empty".to_string(),
        })?;

    Ok(normalize::to_plain_version(&release.version))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(version: &str, stable: bool) -> GoRelease {
        GoRelease {
            version: version.to_string(),
            stable,
        }
    }

    #[test]
    fn test_pick_latest_prefers_stable() {
        let releases = vec![
            release("go1.24rc1", false),
            release("go1.23.4", true),
            release("go1.22.10", true),
        ];
        assert_eq!(pick_latest(&releases).unwrap(), "1.23.4");
    }

    #[test]
    fn test_pick_latest_falls_back_to_first() {
        let releases = vec![release("go1.24rc2", false), release("go1.24rc1", false)];
        assert_eq!(pick_latest(&releases).unwrap(), "1.24rc2");
    }

    #[test]
    fn test_pick_latest_empty() {
        assert!(matches!(
            pick_latest(&[]),
            Err(GetgoError::LatestVersionUnavailable { .. })
        ));
    }

    #[test]
    fn test_latest_version_from_endpoint() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/dl/")
            .match_header("user-agent", USER_AGENT)
            .match_query(mockito::Matcher::UrlEncoded("mode".into(), "json".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"version": "go1.23.2", "stable": true, "files": []},
                    {"version": "go1.22.8", "stable": true, "files": []}
                ]"#,
            )
            .create();

        let client = ReleaseClient::new(Client::new(), format!("{}/dl/?mode=json", server.url()));
        assert_eq!(client.latest_version().unwrap(), "1.23.2");
    }

    #[test]
    fn test_bad_payload_is_json_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/releases")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let client = ReleaseClient::new(Client::new(), format!("{}/releases", server.url()));
        assert!(matches!(client.latest_version(), Err(GetgoError::Json(_))));
    }

    #[test]
    fn test_error_status_is_transport_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/releases").with_status(500).create();

        let client = ReleaseClient::new(Client::new(), format!("{}/releases", server.url()));
        assert!(matches!(
            client.latest_version(),
            Err(GetgoError::Transport { .. })
        ));
    }
}
