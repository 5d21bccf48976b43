use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use grabber_logging::grab_debug;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// `None` leaves reqwest's defaults in place.
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
    /// Body size caps; `None` reads bodies of any size.
    pub max_page_bytes: Option<u64>,
    pub max_image_bytes: Option<u64>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            request_timeout: None,
            redirect_limit: 10,
            max_page_bytes: None,
            max_image_bytes: None,
            user_agent: concat!("image-grabber/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP access used by the pipeline.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// GETs the HTML page. Non-success statuses are errors.
    async fn fetch_page(&self, url: &Url) -> Result<FetchOutput, FetchError>;

    /// GETs an image body. Non-success statuses are errors.
    async fn fetch_image(&self, url: &Url) -> Result<FetchOutput, FetchError>;

    /// GETs `url` only to read its `Content-Type`, whatever the status.
    async fn probe_content_type(&self, url: &Url) -> Result<Option<String>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, redirect_counter: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        let mut builder = reqwest::Client::builder()
            .user_agent(self.settings.user_agent.clone())
            .redirect(policy);
        if let Some(timeout) = self.settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    async fn get(&self, url: &Url, max_bytes: Option<u64>) -> Result<FetchOutput, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(redirect_counter.clone())?;

        grab_debug!("GET {}", url);
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("{status} for {url}"),
            ));
        }

        if let (Some(max_bytes), Some(content_len)) = (max_bytes, response.content_length()) {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = header_content_type(&response);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if let Some(max_bytes) = max_bytes.filter(|max| next_len > *max) {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        self.get(url, self.settings.max_page_bytes).await
    }

    async fn fetch_image(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        self.get(url, self.settings.max_image_bytes).await
    }

    async fn probe_content_type(&self, url: &Url) -> Result<Option<String>, FetchError> {
        let client = self.build_client(Arc::new(AtomicUsize::new(0)))?;
        grab_debug!("GET {} (content-type probe)", url);
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        // The body is dropped unread; only the headers matter here.
        Ok(header_content_type(&response))
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn header_content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
