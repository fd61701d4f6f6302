use crate::core::progress::ProgressReader;
use crate::error::{GetgoError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub(crate) const USER_AGENT: &str = concat!("getgo/", env!("CARGO_PKG_VERSION"));

pub struct Downloader {
    client: Client,
    quiet: bool,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            quiet: false,
        }
    }

    /// Suppress the progress bar.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Download `url` into `destination`, drawing progress on stdout.
    ///
    /// Issues a HEAD request for the expected size, then a GET whose body is
    /// streamed to disk. A 404 from either request is reported as
    /// [`GetgoError::NotFound`].
    pub fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        if self.quiet {
            self.fetch_with_progress(url, destination, std::io::sink())
        } else {
            self.fetch_with_progress(url, destination, std::io::stdout())
        }
    }

    /// Like [`fetch`](Self::fetch), drawing the progress bar into `progress`.
    /// Nothing is written to `progress` unless the GET succeeds.
    pub fn fetch_with_progress<W: Write>(&self, url: &str, destination: &Path, progress: W) -> Result<()> {
        log::debug!("HEAD {url}");
        let head = self
            .client
            .head(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .map_err(|e| GetgoError::transport(url, e))?;
        let total_bytes = check_status(url, head)?
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);

        if total_bytes == 0 {
            log::warn!("{url} did not report a content length; progress will not be shown");
        }

        log::debug!("GET {url} ({total_bytes} bytes expected)");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .map_err(|e| GetgoError::transport(url, e))?;
        let response = check_status(url, response)?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(destination)?);

        let mut reader = ProgressReader::new(response, total_bytes, progress);

        let copied = std::io::copy(&mut reader, &mut out)?;
        out.flush()?;

        reader.finish();
        let (_, mut progress) = reader.into_inner();
        let _ = writeln!(progress);
        let _ = progress.flush();

        log::debug!("wrote {copied} bytes to {}", destination.display());
        Ok(())
    }
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(GetgoError::NotFound {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(GetgoError::transport(url, format!("bad status: {status}")));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::render_progress_bar;

    #[test]
    fn test_fetch_writes_body_to_destination() {
        let body: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

        let mut server = mockito::Server::new();
        let head = server
            .mock("HEAD", "/go1.22.0.linux-amd64.tar.gz")
            .with_status(200)
            .expect(1)
            .create();
        let get = server
            .mock("GET", "/go1.22.0.linux-amd64.tar.gz")
            .with_status(200)
            .with_body(&body)
            .expect(1)
            .create();

        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("nested").join("archive.tar.gz");
        let url = format!("{}/go1.22.0.linux-amd64.tar.gz", server.url());

        Downloader::new()
            .quiet(true)
            .fetch(&url, &destination)
            .unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), body);
        head.assert();
        get.assert();
    }

    #[test]
    fn test_fetch_ends_with_full_bar_and_newline() {
        let body = vec![7u8; 4096];

        let mut server = mockito::Server::new();
        let _head = server
            .mock("HEAD", "/go1.22.0.linux-amd64.tar.gz")
            .with_status(200)
            .with_header("content-length", &body.len().to_string())
            .create();
        let _get = server
            .mock("GET", "/go1.22.0.linux-amd64.tar.gz")
            .with_status(200)
            .with_body(&body)
            .create();

        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("archive.tar.gz");
        let url = format!("{}/go1.22.0.linux-amd64.tar.gz", server.url());
        let mut output = Vec::new();

        Downloader::new()
            .fetch_with_progress(&url, &destination, &mut output)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let expected_tail = format!("{}\n", render_progress_bar(100));
        assert!(output.ends_with(&expected_tail), "{output:?}");
        assert_eq!(output.matches('\n').count(), 1);
        assert_eq!(std::fs::read(&destination).unwrap(), body);
    }

    #[test]
    fn test_failed_get_draws_nothing() {
        let mut server = mockito::Server::new();
        let _head = server
            .mock("HEAD", "/gone")
            .with_status(200)
            .with_header("content-length", "1024")
            .create();
        let _get = server.mock("GET", "/gone").with_status(404).create();

        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();

        let err = Downloader::new()
            .fetch_with_progress(&format!("{}/gone", server.url()), &temp.path().join("a"), &mut output)
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(output.is_empty(), "{:?}", String::from_utf8_lossy(&output));
    }

    #[test]
    fn test_fetch_sends_user_agent() {
        let mut server = mockito::Server::new();
        let head = server
            .mock("HEAD", "/ua")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .create();
        let get = server
            .mock("GET", "/ua")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body("ok")
            .create();

        let temp = tempfile::tempdir().unwrap();
        Downloader::new()
            .quiet(true)
            .fetch(&format!("{}/ua", server.url()), &temp.path().join("a"))
            .unwrap();

        head.assert();
        get.assert();
    }

    #[test]
    fn test_fetch_truncates_existing_file() {
        let mut server = mockito::Server::new();
        let _head = server.mock("HEAD", "/small").with_status(200).create();
        let _get = server
            .mock("GET", "/small")
            .with_status(200)
            .with_body("new")
            .create();

        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("archive");
        std::fs::write(&destination, "much older and longer content").unwrap();

        Downloader::new()
            .quiet(true)
            .fetch(&format!("{}/small", server.url()), &destination)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn test_not_found_on_preflight() {
        let mut server = mockito::Server::new();
        let _head = server
            .mock("HEAD", "/go0.0.0.linux-amd64.tar.gz")
            .with_status(404)
            .create();
        let get = server
            .mock("GET", "/go0.0.0.linux-amd64.tar.gz")
            .expect(0)
            .create();

        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("archive.tar.gz");
        let url = format!("{}/go0.0.0.linux-amd64.tar.gz", server.url());

        let err = Downloader::new().quiet(true).fetch(&url, &destination).unwrap_err();

        assert!(err.is_not_found(), "unexpected error: {err}");
        assert!(!destination.exists());
        get.assert();
    }

    #[test]
    fn test_not_found_on_get() {
        let mut server = mockito::Server::new();
        let _head = server.mock("HEAD", "/gone").with_status(200).create();
        let _get = server.mock("GET", "/gone").with_status(404).create();

        let temp = tempfile::tempdir().unwrap();
        let err = Downloader::new()
            .quiet(true)
            .fetch(&format!("{}/gone", server.url()), &temp.path().join("a"))
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_server_error_is_transport_error() {
        let mut server = mockito::Server::new();
        let _head = server.mock("HEAD", "/broken").with_status(503).create();

        let temp = tempfile::tempdir().unwrap();
        let err = Downloader::new()
            .quiet(true)
            .fetch(&format!("{}/broken", server.url()), &temp.path().join("a"))
            .unwrap_err();

        match err {
            GetgoError::Transport { url, message } => {
                assert!(url.ends_with("/broken"));
                assert!(message.contains("503"), "{message}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let temp = tempfile::tempdir().unwrap();
        // Port 9 on localhost (discard) is closed on test machines.
        let err = Downloader::new()
            .quiet(true)
            .fetch("http://127.0.0.1:9/archive.zip", &temp.path().join("a"))
            .unwrap_err();

        assert!(matches!(err, GetgoError::Transport { .. }));
        assert!(!err.is_not_found());
    }
}
