//! Timeout-bounded HTTP GET on top of reqwest.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("uscis-forms/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Response from a GET request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }

    /// GET `url`, returning any status; only transport problems are errors
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = resp.bytes().await.map_err(|e| self.map_error(e))?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Where a sync run gets the listing markup from
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Human-readable label for logs
    fn label(&self) -> &str;

    async fn fetch_listing(&self) -> Result<String, FetchError>;
}

/// The live forms index over HTTP; anything but 200 is a failure
#[derive(Debug, Clone)]
pub struct HttpListingSource {
    client: HttpClient,
    url: String,
}

impl HttpListingSource {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    fn label(&self) -> &str {
        &self.url
    }

    async fn fetch_listing(&self) -> Result<String, FetchError> {
        let resp = self.client.get(&self.url).await?;
        if !resp.is_ok() {
            return Err(FetchError::Status(resp.status));
        }
        Ok(resp.text())
    }
}
