// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below IS the CLI. Each field becomes
// an argument, doc comments become the --help text.
//
//   site-mirror https://example.com
//   site-mirror https://example.com snapshot --max-depth 2 --json
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use site_mirror::config::{MirrorConfig, DEFAULT_IMAGE_EXTENSIONS};

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    version = "0.1.0",
    about = "Crawl a website and save a browsable local mirror of it",
    long_about = "site-mirror discovers every page of a site reachable from the start URL \
                  (same origin, a few links deep) and writes the pages plus their \
                  stylesheets, scripts and images under output/<namespace>/."
)]
pub struct Cli {
    /// URL to start crawling from (e.g., https://example.com)
    ///
    /// Positional and required; an empty string is accepted here but
    /// rejected as an invalid start URL before anything is fetched.
    pub start_url: String,

    /// Name of the directory under the output root (default: the URL's host)
    pub namespace: Option<String>,

    /// Directory that holds all mirrors
    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    /// How many links away from the start URL the crawl goes
    #[arg(long, default_value_t = 3)]
    pub max_depth: usize,

    /// How many hops of sub-resources are followed from each mirrored page
    #[arg(long, default_value_t = 3)]
    pub max_recursive_depth: usize,

    /// Maximum number of requests in flight at once
    #[arg(long, default_value_t = 16)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Also follow links to other origins during the crawl
    #[arg(long)]
    pub allow_cross_origin: bool,

    /// Print a JSON summary of the mirror after the run
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    // Everything the library needs, as one explicit value
    pub fn to_config(&self) -> MirrorConfig {
        MirrorConfig {
            max_depth: self.max_depth,
            max_recursive_depth: self.max_recursive_depth,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.timeout_secs),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            same_origin: !self.allow_cross_origin,
            output_root: self.output_root.clone(),
            namespace: self.namespace.clone(),
            ..MirrorConfig::default()
        }
    }
}
