use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; daybreak/0.1; news digest collector)";
const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
const IMAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const IMAGE_GET_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum FetchError {
    /// The origin rejected the request; retrying is pointless.
    #[error("terminal fetch failure ({status}) for {url}")]
    Terminal { url: String, status: u16 },

    #[error("transient fetch failure for {url}: {cause}")]
    Transient { url: String, cause: String },
}

/// Downloads pages. Seam for tests and alternative transports.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Whether a candidate image URL is actually retrievable. The default
    /// accepts everything; the HTTP implementation probes the origin.
    async fn probe_image(&self, _url: &str) -> bool {
        true
    }
}

/// reqwest-backed fetcher with the shared collector HTTP configuration:
/// custom user-agent, bounded timeout, binary bodies tolerated (the text is
/// replaced lossily; image/audio/video URLs are filtered before download).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PAGE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transient {
                url: url.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(FetchError::Terminal {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Transient {
                url: url.to_string(),
                cause: format!("status {status}"),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Transient {
            url: url.to_string(),
            cause: e.to_string(),
        })?;

        debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }

    /// HEAD the image with a 5 s cap; origins that refuse HEAD get one
    /// bounded GET with a 3 s cap instead.
    async fn probe_image(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(IMAGE_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response)
                if response.status() == reqwest::StatusCode::METHOD_NOT_ALLOWED
                    || response.status() == reqwest::StatusCode::NOT_IMPLEMENTED =>
            {
                self.client
                    .get(url)
                    .timeout(IMAGE_GET_TIMEOUT)
                    .send()
                    .await
                    .map(|r| r.status().is_success())
                    .unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// Content types never worth downloading for body parsing.
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".mp3", ".mp4", ".m4a", ".mov", ".avi",
    ".pdf", ".zip",
];

/// True when the URL plainly points at media rather than an article page.
pub fn is_media_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
