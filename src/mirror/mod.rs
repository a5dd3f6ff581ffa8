// src/mirror/mod.rs
// =============================================================================
// This module turns a finished crawl into files on disk.
//
// - plan: URL -> relative file path, deterministic and collision-free
// - materialize: fetch everything, rewrite links, write the tree
// - rewrite: relative links between mirrored files
//
// mirror_site() runs the whole pipeline: crawl, then plan, then materialize.
// =============================================================================

mod materialize;
mod plan;
mod rewrite;

pub use materialize::{reset_output_dir, Materializer, MirrorSummary};
pub use plan::{plan, MirrorEntry, PathAllocator};
pub use rewrite::{relative_link, rewrite_references};

use tracing::info;

use crate::config::{parse_start_url, MirrorConfig};
use crate::crawl::Crawler;
use crate::error::MirrorError;
use crate::fetch::Fetcher;
use crate::report::Reporter;

// Crawls the site behind `start_url` and mirrors it under the configured
// output directory.
//
// Only setup problems come back as Err; broken pages and assets are reported
// through `reporter` and counted in the summary.
pub async fn mirror_site(
    start_url: &str,
    config: &MirrorConfig,
    fetcher: &dyn Fetcher,
    reporter: &dyn Reporter,
) -> Result<MirrorSummary, MirrorError> {
    let start = parse_start_url(start_url)?;
    let output_dir = config.output_dir(&start)?;

    // Phase 1: the crawl must be completely finished before mirroring starts
    let visited = Crawler::new(config, fetcher, reporter).crawl(&start).await;
    let entries = plan(&visited);
    info!(pages = entries.len(), dir = %output_dir.display(), "mirror planned");

    // Phase 2
    Materializer::new(config, fetcher, reporter, &start)
        .materialize(&entries, &output_dir)
        .await
}
