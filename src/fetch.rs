// src/fetch.rs
// =============================================================================
// This module is the HTTP side of site-mirror.
//
// Both phases need "GET this URL and give me the bytes", but tests must be
// able to run the crawler without a network. So the rest of the crate talks
// to a small trait (Fetcher), and ReqwestFetcher is the real implementation.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all fetches)
// - Connect timeout + request timeout so a hung server cannot stall a branch
// - Non-2xx statuses become errors, like a browser "failed to load"
//
// Rust concepts:
// - Traits: an interface several types can implement
// - async-trait: async methods on a trait we call through &dyn Fetcher
// - Send + Sync: the fetcher is shared between concurrent futures
// =============================================================================

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::config::MirrorConfig;
use crate::error::FetchError;

// A downloaded payload
//
// We keep the Content-Type around because the materializer only parses and
// rewrites HTML; everything else is written to disk untouched.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Fetched {
    /// True when the server labelled the payload as HTML
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => {
                let mime = ct.split(';').next().unwrap_or(ct).trim();
                mime.eq_ignore_ascii_case("text/html")
                    || mime.eq_ignore_ascii_case("application/xhtml+xml")
            }
            None => false,
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError>;
}

// The real fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    // Builds the client once; reqwest clients are cheap to clone and share
    // their connection pool.
    pub fn new(config: &MirrorConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: format!("could not build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(Fetched {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
