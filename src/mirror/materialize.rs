// src/mirror/materialize.rs
// =============================================================================
// This module downloads the plan and writes the mirror to disk.
//
// How it works:
// 1. Wipe the output directory and create it again (no stale files survive)
// 2. Queue every planned URL at recursion depth 0
// 3. For each job: report it, fetch it, and if it is an HTML page:
//    - find its assets and anchors
//    - queue the in-scope ones we have not seen yet at depth + 1
//    - rewrite references to local relative paths
// 4. Write the bytes, creating parent directories as needed
// 5. A failed fetch or write is reported and counted, never fatal
// 6. Links that were localized to a target which then failed are put back
//    to the remote URL, so the mirror has no dangling local links
//
// Only step 1 can fail the whole run.
//
// Rust concepts:
// - Mutex<PathAllocator>: several in-flight jobs allocate paths; the lock is
//   only held in synchronous code, never across an .await
// - tokio::fs: async filesystem calls that don't block the runtime
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use url::Url;

use super::plan::{MirrorEntry, PathAllocator};
use super::rewrite::{relative_link, rewrite_references};
use crate::config::MirrorConfig;
use crate::crawl::VisitedSet;
use crate::error::MirrorError;
use crate::extract::{extract_links, extract_resources, resolve_reference};
use crate::fetch::{Fetched, Fetcher};
use crate::report::Reporter;

// What a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct MirrorSummary {
    pub output_dir: PathBuf,
    /// Every resource written, planned pages and sub-resources alike
    pub saved: Vec<MirrorEntry>,
    pub failed: usize,
}

#[derive(Debug)]
struct Job {
    url: Url,
    path: String,
    depth: usize,
}

// (target URL, local link written into the page)
type LocalLink = (Url, String);

enum Outcome {
    Saved {
        entry: MirrorEntry,
        links: Vec<LocalLink>,
        children: Vec<Job>,
    },
    Failed {
        url: Url,
        children: Vec<Job>,
    },
}

pub struct Materializer<'a> {
    config: &'a MirrorConfig,
    fetcher: &'a dyn Fetcher,
    reporter: &'a dyn Reporter,
    /// Discovered references must contain this string to be mirrored
    scope: String,
}

impl<'a> Materializer<'a> {
    pub fn new(
        config: &'a MirrorConfig,
        fetcher: &'a dyn Fetcher,
        reporter: &'a dyn Reporter,
        start: &Url,
    ) -> Self {
        Self {
            config,
            fetcher,
            reporter,
            scope: start.as_str().to_string(),
        }
    }

    pub async fn materialize(
        &self,
        plan: &[MirrorEntry],
        output_dir: &Path,
    ) -> Result<MirrorSummary, MirrorError> {
        reset_output_dir(output_dir).await?;
        self.reporter.started();

        let allocator = Mutex::new(PathAllocator::from_plan(plan));
        let claimed: VisitedSet = plan.iter().map(|entry| entry.url.clone()).collect();
        let slots = self.config.concurrency.max(1);

        let mut queue: VecDeque<Job> = plan
            .iter()
            .map(|entry| Job {
                url: entry.url.clone(),
                path: entry.path.clone(),
                depth: 0,
            })
            .collect();

        let mut in_flight = FuturesUnordered::new();
        let mut saved = Vec::new();
        let mut pages = Vec::new();
        let mut failed = HashSet::new();

        loop {
            while in_flight.len() < slots {
                let Some(job) = queue.pop_front() else {
                    break;
                };
                in_flight.push(self.process(job, output_dir, &allocator, &claimed));
            }

            match in_flight.next().await {
                Some(Outcome::Saved {
                    entry,
                    links,
                    children,
                }) => {
                    if !links.is_empty() {
                        pages.push((entry.path.clone(), links));
                    }
                    saved.push(entry);
                    queue.extend(children);
                }
                Some(Outcome::Failed { url, children }) => {
                    failed.insert(url);
                    queue.extend(children);
                }
                None => break,
            }
        }

        if !failed.is_empty() {
            self.restore_remote_links(output_dir, &pages, &failed).await;
        }
        let failed = failed.len();

        saved.sort_by(|a, b| a.path.cmp(&b.path));
        self.reporter.finished();
        debug!(saved = saved.len(), failed, "mirror finished");

        Ok(MirrorSummary {
            output_dir: output_dir.to_path_buf(),
            saved,
            failed,
        })
    }

    async fn process(
        &self,
        job: Job,
        output_dir: &Path,
        allocator: &Mutex<PathAllocator>,
        claimed: &VisitedSet,
    ) -> Outcome {
        self.reporter.reference_discovered(job.url.as_str());

        let fetched = match self.fetcher.fetch(&job.url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.reporter.error(&e.to_string());
                return Outcome::Failed {
                    url: job.url,
                    children: Vec::new(),
                };
            }
        };

        let (bytes, links, children) = if is_page(&fetched, &job.path) {
            let html = String::from_utf8_lossy(&fetched.bytes);
            let (rewritten, links, children) = self.localize(&html, &job, allocator, claimed);
            (rewritten.into_bytes(), links, children)
        } else {
            (fetched.bytes, Vec::new(), Vec::new())
        };

        let target = local_path(output_dir, &job.path);
        if let Err(e) = write_file(&target, &bytes).await {
            warn!(path = %target.display(), error = %e, "write failed");
            self.reporter
                .error(&format!("could not save {}: {}", job.url, e));
            return Outcome::Failed {
                url: job.url,
                children,
            };
        }

        self.reporter.resource_saved(job.url.as_str());
        Outcome::Saved {
            entry: MirrorEntry {
                url: job.url,
                path: job.path,
            },
            links,
            children,
        }
    }

    // Queues the page's in-scope references and points them at local files
    fn localize(
        &self,
        html: &str,
        job: &Job,
        allocator: &Mutex<PathAllocator>,
        claimed: &VisitedSet,
    ) -> (String, Vec<LocalLink>, Vec<Job>) {
        let can_recurse = job.depth < self.config.max_recursive_depth;
        let mut allocator = allocator.lock().unwrap_or_else(PoisonError::into_inner);

        let mut children = Vec::new();
        let mut links = Vec::new();
        let mut replacements = HashMap::new();

        let references = extract_resources(html)
            .into_iter()
            .chain(extract_links(html));

        for raw in references {
            let Some(url) = resolve_reference(&job.url, &raw) else {
                continue;
            };

            let target = match allocator.get(&url) {
                Some(path) => path.to_string(),
                None if can_recurse && url.as_str().contains(&self.scope) => {
                    allocator.allocate(&url)
                }
                None => continue,
            };

            let local = relative_link(&job.path, &target);
            if can_recurse && claimed.claim(&url) {
                children.push(Job {
                    url: url.clone(),
                    path: target,
                    depth: job.depth + 1,
                });
            }

            links.push((url, local.clone()));
            replacements.insert(raw, local);
        }

        (rewrite_references(html, &replacements), links, children)
    }

    // Points links to targets that could not be saved back at the live site
    async fn restore_remote_links(
        &self,
        output_dir: &Path,
        pages: &[(String, Vec<LocalLink>)],
        failed: &HashSet<Url>,
    ) {
        for (path, links) in pages {
            let replacements: HashMap<String, String> = links
                .iter()
                .filter(|(url, _)| failed.contains(url))
                .map(|(url, local)| (local.clone(), url.to_string()))
                .collect();
            if replacements.is_empty() {
                continue;
            }

            let target = local_path(output_dir, path);
            let result = match tokio::fs::read_to_string(&target).await {
                Ok(html) => tokio::fs::write(&target, rewrite_references(&html, &replacements)).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(path = %target.display(), error = %e, "could not restore remote links");
                self.reporter
                    .error(&format!("could not update {}: {}", path, e));
            }
        }
    }
}

// HTML is parsed and rewritten, everything else is copied byte for byte.
// Without a Content-Type header, the planned .html name decides.
fn is_page(fetched: &Fetched, path: &str) -> bool {
    fetched.is_html() || (fetched.content_type.is_none() && path.ends_with(".html"))
}

// Deletes a previous mirror entirely, then recreates the empty directory
pub async fn reset_output_dir(dir: &Path) -> Result<(), MirrorError> {
    let exists = tokio::fs::try_exists(dir)
        .await
        .map_err(|source| MirrorError::Reset {
            path: dir.to_path_buf(),
            source,
        })?;

    if exists {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(|source| MirrorError::Reset {
                path: dir.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| MirrorError::Create {
            path: dir.to_path_buf(),
            source,
        })
}

fn local_path(output_dir: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(output_dir.to_path_buf(), |path, part| path.join(part))
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MirrorEvent, RecordingReporter, SilentReporter};
    use crate::testing::StaticSite;
    use pretty_assertions::assert_eq;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn entry(u: &str, path: &str) -> MirrorEntry {
        MirrorEntry {
            url: url(u),
            path: path.to_string(),
        }
    }

    fn read(dir: &Path, relative: &str) -> String {
        std::fs::read_to_string(local_path(dir, relative)).unwrap()
    }

    #[tokio::test]
    async fn test_writes_pages_and_assets() {
        let site = StaticSite::new()
            .html(
                "https://example.test/",
                r#"<link href="/css/site.css" rel="stylesheet"><a href="/docs/readme">Docs</a>"#,
            )
            .html("https://example.test/docs/readme", r#"<a href="/">Home</a>"#)
            .asset("https://example.test/css/site.css", "body{}", "text/css");
        let plan = vec![
            entry("https://example.test/", "index.html"),
            entry("https://example.test/docs/readme", "docs/readme.html"),
        ];
        let config = MirrorConfig::default();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("example.test");
        let start = url("https://example.test/");

        let summary = Materializer::new(&config, &site, &SilentReporter, &start)
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert_eq!(summary.failed, 0);
        assert_eq!(summary.saved.len(), 3);
        assert_eq!(read(&dir, "css/site.css"), "body{}");
        assert_eq!(
            read(&dir, "index.html"),
            r#"<link href="css/site.css" rel="stylesheet"><a href="docs/readme.html">Docs</a>"#
        );
        assert_eq!(read(&dir, "docs/readme.html"), r#"<a href="../">Home</a>"#);
        // Planned pages are fetched once even though they link to each other
        assert_eq!(site.hits("https://example.test/docs/readme"), 1);
    }

    #[tokio::test]
    async fn test_stale_files_are_removed() {
        let site = StaticSite::new().html("https://example.test/", "<p>fresh</p>");
        let plan = vec![entry("https://example.test/", "index.html")];
        let config = MirrorConfig::default();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("example.test");
        std::fs::create_dir_all(dir.join("old")).unwrap();
        std::fs::write(dir.join("old/stale.html"), "stale").unwrap();
        std::fs::write(dir.join("index.html"), "stale").unwrap();

        Materializer::new(&config, &site, &SilentReporter, &url("https://example.test/"))
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert!(!dir.join("old").exists());
        assert_eq!(read(&dir, "index.html"), "<p>fresh</p>");
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_fatal() {
        let site = StaticSite::new().html(
            "https://example.test/",
            r#"<img src="/missing.png"><a href="/gone">x</a>"#,
        );
        let plan = vec![
            entry("https://example.test/", "index.html"),
            entry("https://example.test/gone", "gone.html"),
        ];
        let config = MirrorConfig::default();
        let recorder = RecordingReporter::new();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("m");

        let summary = Materializer::new(&config, &site, &recorder, &url("https://example.test/"))
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert_eq!(summary.saved.len(), 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(
            read(&dir, "index.html"),
            r#"<img src="https://example.test/missing.png"><a href="https://example.test/gone">x</a>"#
        );

        let events = recorder.events();
        assert_eq!(events.first(), Some(&MirrorEvent::Started));
        assert_eq!(events.last(), Some(&MirrorEvent::Finished));
        let errors = events
            .iter()
            .filter(|e| matches!(e, MirrorEvent::Error(_)))
            .count();
        assert_eq!(errors, 2);
    }

    #[tokio::test]
    async fn test_links_to_failed_targets_stay_remote() {
        let site = StaticSite::new()
            .html(
                "https://example.test/",
                r#"<a href="/gone">gone</a><a href="/about">about</a>"#,
            )
            .html(
                "https://example.test/about",
                r#"<a href="/">home</a><a href="/gone">gone</a>"#,
            );
        let plan = vec![
            entry("https://example.test/", "index.html"),
            entry("https://example.test/about", "about.html"),
            entry("https://example.test/gone", "gone.html"),
        ];
        let config = MirrorConfig::default();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("m");

        let summary = Materializer::new(&config, &site, &SilentReporter, &url("https://example.test/"))
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert!(!dir.join("gone.html").exists());
        assert_eq!(
            read(&dir, "index.html"),
            r#"<a href="https://example.test/gone">gone</a><a href="about.html">about</a>"#
        );
        assert_eq!(
            read(&dir, "about.html"),
            r#"<a href="./">home</a><a href="https://example.test/gone">gone</a>"#
        );
    }

    #[tokio::test]
    async fn test_reference_reported_before_save() {
        let site = StaticSite::new().html("https://example.test/", "<p>x</p>");
        let plan = vec![entry("https://example.test/", "index.html")];
        let config = MirrorConfig::default();
        let recorder = RecordingReporter::new();
        let out = tempfile::tempdir().unwrap();

        Materializer::new(&config, &site, &recorder, &url("https://example.test/"))
            .materialize(&plan, &out.path().join("m"))
            .await
            .unwrap();

        assert_eq!(
            recorder.events(),
            vec![
                MirrorEvent::Started,
                MirrorEvent::ReferenceDiscovered("https://example.test/".to_string()),
                MirrorEvent::ResourceSaved("https://example.test/".to_string()),
                MirrorEvent::Finished,
            ]
        );
    }

    #[tokio::test]
    async fn test_out_of_scope_references_stay_remote() {
        let site = StaticSite::new()
            .html(
                "https://example.test/",
                r#"<script src="https://cdn.test/lib.js"></script>"#,
            )
            .asset("https://cdn.test/lib.js", "lib()", "application/javascript");
        let plan = vec![entry("https://example.test/", "index.html")];
        let config = MirrorConfig::default();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("m");

        Materializer::new(&config, &site, &SilentReporter, &url("https://example.test/"))
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert_eq!(site.hits("https://cdn.test/lib.js"), 0);
        assert_eq!(
            read(&dir, "index.html"),
            r#"<script src="https://cdn.test/lib.js"></script>"#
        );
    }

    #[tokio::test]
    async fn test_scope_is_the_normalized_start_url() {
        let site = StaticSite::new()
            .html(
                "https://example.test/docs/",
                r#"<link href="/docs/a.css"><link href="/b.css">"#,
            )
            .asset("https://example.test/docs/a.css", "a{}", "text/css")
            .asset("https://example.test/b.css", "b{}", "text/css");
        let plan = vec![entry("https://example.test/docs/", "docs/index.html")];
        let config = MirrorConfig::default();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("m");
        // Matched as https://example.test/docs/
        let start = url("HTTPS://Example.TEST/docs/");

        Materializer::new(&config, &site, &SilentReporter, &start)
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert_eq!(site.hits("https://example.test/docs/a.css"), 1);
        assert_eq!(site.hits("https://example.test/b.css"), 0);
        assert_eq!(
            read(&dir, "docs/index.html"),
            r#"<link href="a.css"><link href="/b.css">"#
        );
    }

    #[tokio::test]
    async fn test_recursion_depth_is_bounded() {
        // Each page links one level further than the previous one
        let mut site = StaticSite::new();
        for i in 0..6 {
            site = site.html(
                &format!("https://example.test/p{}", i),
                &format!(r#"<a href="/p{}">next</a>"#, i + 1),
            );
        }
        let plan = vec![entry("https://example.test/p0", "p0.html")];
        let config = MirrorConfig {
            max_recursive_depth: 2,
            ..MirrorConfig::default()
        };
        let out = tempfile::tempdir().unwrap();

        let summary = Materializer::new(&config, &site, &SilentReporter, &url("https://example.test/"))
            .materialize(&plan, &out.path().join("m"))
            .await
            .unwrap();

        let paths: Vec<&str> = summary.saved.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["p0.html", "p1.html", "p2.html"]);
        assert_eq!(site.hits("https://example.test/p3"), 0);
    }

    #[tokio::test]
    async fn test_binary_assets_are_copied_verbatim() {
        let site = StaticSite::new()
            .html("https://example.test/", r#"<img src="/a.gif">"#)
            .asset("https://example.test/a.gif", "GIF89a=\"x\"", "image/gif");
        let plan = vec![entry("https://example.test/", "index.html")];
        let config = MirrorConfig::default();
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("m");

        Materializer::new(&config, &site, &SilentReporter, &url("https://example.test/"))
            .materialize(&plan, &dir)
            .await
            .unwrap();

        assert_eq!(read(&dir, "a.gif"), "GIF89a=\"x\"");
    }
}
