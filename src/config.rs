// src/config.rs
// =============================================================================
// Explicit run configuration.
//
// Every knob the crawler and the materializer need lives in one struct that is
// built once (from the CLI, or by hand in tests) and handed to each component
// when it is constructed. Nothing reads global state.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::MirrorError;

/// Extensions the crawler never follows. Matching is case-sensitive.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "gif", "png", "svg"];

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Deepest link distance from the start URL that is still crawled
    pub max_depth: usize,
    /// How many hops of sub-resources the materializer follows from a page
    pub max_recursive_depth: usize,
    /// Upper bound on fetches in flight at once, per phase
    pub concurrency: usize,
    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Path suffixes (without the dot) excluded from the crawl
    pub image_extensions: Vec<String>,
    /// Only follow links that share the start URL's origin
    pub same_origin: bool,
    /// Parent of every mirror, `./output` by default
    pub output_root: PathBuf,
    /// Sub-directory under `output_root`; falls back to the start URL's host
    pub namespace: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_recursive_depth: 3,
            concurrency: 16,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            same_origin: true,
            output_root: PathBuf::from("output"),
            namespace: None,
        }
    }
}

impl MirrorConfig {
    /// True when the URL path ends in one of the excluded image extensions
    pub fn is_image(&self, url: &Url) -> bool {
        let path = url.path();
        self.image_extensions.iter().any(|ext| {
            path.len() > ext.len()
                && path.ends_with(ext.as_str())
                && path.as_bytes()[path.len() - ext.len() - 1] == b'.'
        })
    }

    /// `<output_root>/<namespace>`, where the namespace defaults to the host
    pub fn output_dir(&self, start: &Url) -> Result<PathBuf, MirrorError> {
        let namespace = match &self.namespace {
            Some(name) if !name.is_empty() => name.clone(),
            _ => start
                .host_str()
                .map(str::to_string)
                .ok_or_else(|| MirrorError::InvalidStartUrl {
                    url: start.to_string(),
                    reason: "url has no host to name the output directory after".to_string(),
                })?,
        };
        Ok(Path::new(&self.output_root).join(namespace))
    }
}

/// Parses the start URL given on the command line.
///
/// An empty string is accepted by the CLI but can never name a site, so it
/// is reported here as a setup error.
pub fn parse_start_url(raw: &str) -> Result<Url, MirrorError> {
    let mut url = Url::parse(raw).map_err(|e| MirrorError::InvalidStartUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    url.set_fragment(None);
    Ok(url)
}
