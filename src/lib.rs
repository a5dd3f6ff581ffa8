// src/lib.rs
// =============================================================================
// site-mirror: crawl one website and write a browsable local copy of it.
//
// The pipeline, leaves first:
//   extract  -> raw references out of HTML
//   crawl    -> depth-bounded, same-origin discovery of pages (VisitedSet)
//   mirror   -> plan file paths, then fetch and write everything
//   report   -> lifecycle events for the operator
//
// main.rs is only the CLI around mirror::mirror_site().
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod mirror;
pub mod report;

#[cfg(test)]
mod testing;

pub use config::MirrorConfig;
pub use error::{FetchError, MirrorError};
pub use mirror::{mirror_site, MirrorEntry, MirrorSummary};
