// src/extract/mod.rs
// =============================================================================
// This module pulls references out of fetched HTML.
//
// - extract_links: every <a href> (what the crawler follows)
// - extract_resources: stylesheets, scripts, images, media (what the
//   materializer downloads next to a page)
// - resolve_reference: turns a raw attribute value into an absolute URL
//
// Extraction never fails: broken markup just yields fewer references.
// =============================================================================

mod html;

pub use html::{extract_links, extract_resources, resolve_reference};
