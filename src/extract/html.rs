// src/extract/html.rs
// =============================================================================
// This module extracts raw references from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (html5ever under the hood, very forgiving)
// - Supports CSS selectors for finding elements
//
// The extractors return RAW attribute values (possibly relative, possibly
// garbage). Resolving them against the page URL is a separate step, because
// the crawler and the materializer filter the results differently.
//
// Rust concepts:
// - Iterators: select() yields matching elements in document order
// - Option: resolve_reference returns None for anything we can't use
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Elements whose attribute points at a sub-resource of the page
const RESOURCE_SELECTORS: &[(&str, &str)] = &[
    ("link[href]", "href"),
    ("script[src]", "src"),
    ("img[src]", "src"),
    ("source[src]", "src"),
    ("video[src]", "src"),
    ("audio[src]", "src"),
    ("iframe[src]", "src"),
];

// Extracts the href of every anchor, in document order
//
// Example:
//   html = "<a href='/docs'>Docs</a><a>no href</a><a href='#top'>Top</a>"
//   result = ["/docs", "#top"]
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    select_attr(&document, "a[href]", "href")
}

// Extracts references to the assets a page needs to render
//
// Each selector is run over the whole document in turn, so the result is
// grouped by element kind rather than strictly in document order. srcset
// attributes contribute every candidate URL (the part before the width or
// density descriptor).
pub fn extract_resources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut refs = Vec::new();
    for (css, attr) in RESOURCE_SELECTORS {
        refs.extend(select_attr(&document, css, attr));
    }

    for srcset in select_attr(&document, "[srcset]", "srcset") {
        refs.extend(
            srcset
                .split(',')
                .filter_map(|candidate| candidate.split_whitespace().next())
                .map(str::to_string),
        );
    }

    refs
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Vec<String> {
    // Our selectors are constants; a parse failure just means "no matches"
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

// Resolves a possibly-relative reference to an absolute http(s) URL
//
// The fragment is dropped: "/about#team" and "/about" are the same page.
//
// Examples:
//   base = "https://example.com/page/"
//   href = "/docs"          -> Some("https://example.com/docs")
//   href = "../other#x"     -> Some("https://example.com/other")
//   href = "mailto:a@b.c"   -> None (not HTTP)
//   href = "http://[::1"    -> None (unparseable)
pub fn resolve_reference(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
