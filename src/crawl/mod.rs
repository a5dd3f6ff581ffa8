// src/crawl/mod.rs
// =============================================================================
// This module handles the link-discovery crawl.
//
// Features:
// - Concurrent crawling from a start URL with a bounded number of fetches
// - Same-origin restriction (doesn't wander onto external sites)
// - Depth limit (3 hops by default)
// - Image links are never followed
//
// The result is the VisitedSet: every in-scope URL that was reached.
// The mirror phase only starts once this set is final.
// =============================================================================

mod queue;
mod visited;

pub use queue::{CrawlTask, Crawler};
pub use visited::VisitedSet;
