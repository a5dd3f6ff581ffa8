// src/mirror/plan.rs
// =============================================================================
// This module decides WHERE each URL lands on disk.
//
// Rules for a URL path like /docs/guide/readme:
// - directories come from every segment but the last     -> docs/guide/
// - the last segment is the filename candidate           -> readme
// - no extension on the candidate? append .html          -> readme.html
// - empty last segment (/ or /docs/)                     -> index.html
// - a query string is folded into the name               -> page_v=2.html
// - two URLs wanting the same path: the later one (in
//   sorted URL order) gets -1, -2, ... before the ext    -> readme-1.html
//
// Paths are relative, '/'-separated strings. The materializer joins them onto
// the output directory and also uses them to rewrite links between pages.
//
// Rust concepts:
// - HashMap/HashSet: remember which URL got which path, and which are taken
// - Ord on Url: sorting makes the plan deterministic
// =============================================================================

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::crawl::VisitedSet;

const DEFAULT_EXTENSION: &str = "html";
const INDEX_STEM: &str = "index";
const MAX_STEM_LEN: usize = 100;
const MAX_EXT_LEN: usize = 16;

// One URL -> file mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorEntry {
    pub url: Url,
    /// Relative to the output directory, '/'-separated
    pub path: String,
}

// Builds the mirror plan for a finished crawl
//
// Same VisitedSet in, same entries out, in the same order.
pub fn plan(visited: &VisitedSet) -> Vec<MirrorEntry> {
    let mut allocator = PathAllocator::new();
    visited
        .sorted()
        .into_iter()
        .map(|url| {
            let path = allocator.allocate(&url);
            MirrorEntry { url, path }
        })
        .collect()
}

// Hands out unique relative paths
//
// Allocation is sticky: asking again for a URL returns the path it already
// got. The planner uses one for the crawl results, and the materializer keeps
// using a copy seeded with the plan while it discovers sub-resources.
#[derive(Debug, Default, Clone)]
pub struct PathAllocator {
    by_url: HashMap<Url, String>,
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl PathAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that already knows every planned path
    pub fn from_plan(entries: &[MirrorEntry]) -> Self {
        let mut allocator = Self::new();
        for entry in entries {
            allocator.reserve(&entry.url, &entry.path);
        }
        allocator
    }

    pub fn get(&self, url: &Url) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    pub fn allocate(&mut self, url: &Url) -> String {
        if let Some(path) = self.by_url.get(url) {
            return path.clone();
        }

        let target = TargetName::from_url(url);
        let dir = self.free_dir(&target.dirs);

        let mut attempt = 0usize;
        let path = loop {
            let stem = if attempt == 0 {
                target.stem.clone()
            } else {
                format!("{}-{}", target.stem, attempt)
            };
            let candidate = join_path(&dir, &format!("{}.{}", stem, target.ext));
            if !self.files.contains(&candidate) && !self.dirs.contains(&candidate) {
                break candidate;
            }
            attempt += 1;
        };

        self.reserve(url, &path);
        path
    }

    fn reserve(&mut self, url: &Url, path: &str) {
        let mut prefix = String::new();
        let mut parts = path.split('/').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                break;
            }
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            self.dirs.insert(prefix.clone());
        }
        self.files.insert(path.to_string());
        self.by_url.insert(url.clone(), path.to_string());
    }

    // Directory segments that do not clash with an already-allocated file
    //
    // /a.b is a file; /a.b/c then needs a directory named a.b, so the
    // directory becomes a.b_dir instead.
    fn free_dir(&self, dirs: &[String]) -> String {
        let mut prefix = String::new();
        for segment in dirs {
            let mut name = segment.clone();
            while self.files.contains(&join_path(&prefix, &name)) {
                name.push_str("_dir");
            }
            prefix = join_path(&prefix, &name);
        }
        prefix
    }
}

// The pieces of a target path before collision handling
#[derive(Debug, PartialEq, Eq)]
struct TargetName {
    dirs: Vec<String>,
    stem: String,
    ext: String,
}

impl TargetName {
    fn from_url(url: &Url) -> Self {
        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();
        let last = segments.pop().unwrap_or("");

        let dirs = segments
            .into_iter()
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .map(|s| truncate(sanitize(s)))
            .collect();

        let (mut stem, mut ext) = split_extension(last);

        // An overlong suffix is not a real extension; keep it in the stem
        if ext.len() > MAX_EXT_LEN {
            stem = format!("{}.{}", stem, ext);
            ext = DEFAULT_EXTENSION.to_string();
        }

        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            stem = format!("{}_{}", stem, query);
        }

        Self {
            dirs,
            stem: truncate(sanitize(&stem)),
            ext: sanitize(&ext),
        }
    }
}

// "readme" -> ("readme", "html"), "app.js" -> ("app", "js"), "" -> ("index", "html")
fn split_extension(segment: &str) -> (String, String) {
    let trimmed = segment.trim_end_matches('.');
    match trimmed.rfind('.') {
        Some(dot) => (trimmed[..dot].to_string(), trimmed[dot + 1..].to_string()),
        None if trimmed.is_empty() => (INDEX_STEM.to_string(), DEFAULT_EXTENSION.to_string()),
        None => (trimmed.to_string(), DEFAULT_EXTENSION.to_string()),
    }
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

// '%' is included so percent-escapes survive as plain text on disk and in
// rewritten links alike.
fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%' | '\0'..='\u{1F}'
    )
}

fn truncate(mut name: String) -> String {
    if name.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn path_of(s: &str) -> String {
        PathAllocator::new().allocate(&url(s))
    }

    #[test]
    fn test_extensionless_gets_html() {
        assert_eq!(path_of("https://example.test/docs/readme"), "docs/readme.html");
    }

    #[test]
    fn test_existing_extension_is_kept() {
        assert_eq!(path_of("https://example.test/about.html"), "about.html");
        assert_eq!(path_of("https://example.test/files/report.pdf"), "files/report.pdf");
    }

    #[test]
    fn test_root_and_trailing_slash_use_index() {
        assert_eq!(path_of("https://example.test/"), "index.html");
        assert_eq!(path_of("https://example.test"), "index.html");
        assert_eq!(path_of("https://example.test/docs/"), "docs/index.html");
    }

    #[test]
    fn test_query_is_folded_into_name() {
        assert_eq!(path_of("https://example.test/list?page=2"), "list_page=2.html");
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        assert_eq!(path_of("https://example.test/a%20b"), "a_20b.html");
        assert_eq!(path_of("https://example.test/x:y"), "x_y.html");
    }

    #[test]
    fn test_dotfile_keeps_its_suffix() {
        assert_eq!(path_of("https://example.test/.well-known"), ".well-known");
    }

    #[test]
    fn test_long_directory_segment_is_truncated() {
        let long = "a".repeat(300);
        let path = path_of(&format!("https://example.test/{}/x", long));
        assert_eq!(path, format!("{}/x.html", "a".repeat(100)));
    }

    #[test]
    fn test_long_extension_is_folded_into_stem() {
        let long = "a".repeat(300);
        let path = path_of(&format!("https://example.test/f.{}", long));

        let stem = path.strip_suffix(".html").unwrap();
        assert!(stem.starts_with("f.aaa"));
        assert_eq!(stem.len(), 100);
        for component in path.split('/') {
            assert!(component.len() <= 255, "{} is too long", component);
        }
    }

    #[test]
    fn test_percent_encoded_names_stay_short() {
        let long = "é".repeat(200);
        let path = path_of(&format!("https://example.test/{}/{}", long, long));
        for component in path.split('/') {
            assert!(component.len() <= 255, "{} is too long", component);
        }
    }

    #[test]
    fn test_collisions_get_numbered() {
        let visited: VisitedSet = [
            "https://example.test/docs",
            "https://example.test/docs.html",
        ]
        .into_iter()
        .map(url)
        .collect();

        let entries = plan(&visited);
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(paths, vec!["docs.html", "docs-1.html"]);
    }

    #[test]
    fn test_file_and_directory_do_not_clash() {
        let mut allocator = PathAllocator::new();
        assert_eq!(allocator.allocate(&url("https://example.test/v1.2")), "v1.2");
        assert_eq!(
            allocator.allocate(&url("https://example.test/v1.2/notes")),
            "v1.2_dir/notes.html"
        );
    }

    #[test]
    fn test_allocation_is_sticky() {
        let mut allocator = PathAllocator::new();
        let first = allocator.allocate(&url("https://example.test/a"));
        let second = allocator.allocate(&url("https://example.test/a"));
        assert_eq!(first, second);
        assert_eq!(allocator.get(&url("https://example.test/a")), Some("a.html"));
    }

    #[test]
    fn test_plan_is_deterministic_and_unique() {
        let raw = [
            "https://example.test/",
            "https://example.test/about",
            "https://example.test/about/",
            "https://example.test/about.html",
            "https://example.test/blog/post?id=1",
            "https://example.test/blog/post?id=2",
        ];
        let forward: VisitedSet = raw.iter().map(|s| url(s)).collect();
        let backward: VisitedSet = raw.iter().rev().map(|s| url(s)).collect();

        let a = plan(&forward);
        let b = plan(&backward);
        assert_eq!(a, b);

        let unique: HashSet<&str> = a.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(unique.len(), a.len());
    }

    #[test]
    fn test_seeded_allocator_avoids_planned_paths() {
        let entries = vec![MirrorEntry {
            url: url("https://example.test/style"),
            path: "style.html".to_string(),
        }];
        let mut allocator = PathAllocator::from_plan(&entries);
        assert_eq!(
            allocator.allocate(&url("https://example.test/style.html")),
            "style-1.html"
        );
    }
}
