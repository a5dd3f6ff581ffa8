// src/testing.rs
// In-memory fetcher shared by the unit tests of several modules.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

use crate::error::FetchError;
use crate::fetch::{Fetched, Fetcher};

/// Serves canned bodies by exact URL; anything else is a network error.
#[derive(Default)]
pub struct StaticSite {
    pages: HashMap<String, (String, &'static str)>,
    hits: Mutex<HashMap<String, usize>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(mut self, url: &str, body: &str) -> Self {
        self.pages
            .insert(url.to_string(), (body.to_string(), "text/html; charset=utf-8"));
        self
    }

    pub fn asset(mut self, url: &str, body: &str, content_type: &'static str) -> Self {
        self.pages
            .insert(url.to_string(), (body.to_string(), content_type));
        self
    }

    /// How many times a URL was requested
    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for StaticSite {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        // Let other branches run so ordering is not accidentally sequential
        tokio::task::yield_now().await;

        match self.pages.get(url.as_str()) {
            Some((body, content_type)) => Ok(Fetched {
                bytes: body.as_bytes().to_vec(),
                content_type: Some(content_type.to_string()),
            }),
            None => Err(FetchError::Network {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}
