// src/crawl/queue.rs
// =============================================================================
// This module implements the link-discovery crawl.
//
// How it works:
// 1. Start with (start_url, depth 0) in a queue
// 2. Pop a task; skip it if it is too deep or someone already claimed it
// 3. Claim the URL BEFORE fetching, so no other branch fetches it too
// 4. Fetch the page and extract every <a href>
// 5. Queue same-origin, non-image, not-yet-visited links at depth + 1
// 6. Stop when the queue is empty and nothing is in flight
//
// Up to `concurrency` fetches run at once. A page that fails to load simply
// contributes no links; one dead link never stops the crawl.
//
// Rust concepts:
// - VecDeque: the frontier of tasks that are waiting for a free slot
// - FuturesUnordered: the in-flight fetches, polled together on one task
// - Url::origin(): scheme + host + port, the unit of "same site"
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, trace};
use url::Url;

use super::visited::VisitedSet;
use crate::config::MirrorConfig;
use crate::extract::{extract_links, resolve_reference};
use crate::fetch::Fetcher;
use crate::report::Reporter;

// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: usize, // link distance from the start URL, 0 at the root
}

pub struct Crawler<'a> {
    config: &'a MirrorConfig,
    fetcher: &'a dyn Fetcher,
    reporter: &'a dyn Reporter,
}

impl<'a> Crawler<'a> {
    pub fn new(
        config: &'a MirrorConfig,
        fetcher: &'a dyn Fetcher,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            fetcher,
            reporter,
        }
    }

    // Crawls from `start` and returns every URL that was claimed
    //
    // The returned set is final: all branches have resolved by the time this
    // function returns.
    pub async fn crawl(&self, start: &Url) -> VisitedSet {
        self.reporter.crawl_started();

        let visited = VisitedSet::new();
        let slots = self.config.concurrency.max(1);

        let mut queue = VecDeque::new();
        queue.push_back(CrawlTask {
            url: start.clone(),
            depth: 0,
        });

        let mut in_flight = FuturesUnordered::new();

        loop {
            // Fill free slots from the frontier
            while in_flight.len() < slots {
                let Some(task) = queue.pop_front() else {
                    break;
                };
                if task.depth > self.config.max_depth || !visited.claim(&task.url) {
                    trace!(url = %task.url, depth = task.depth, "discarding task");
                    continue;
                }
                in_flight.push(self.expand(task, &visited));
            }

            // Wait for one fetch to finish; None means nothing is left at all
            match in_flight.next().await {
                Some(children) => queue.extend(children),
                None => break,
            }
        }

        // The pending futures borrow `visited`; release them before returning it
        drop(in_flight);
        debug!(pages = visited.len(), "crawl finished");
        visited
    }

    // Fetches one page and returns the tasks for the links worth following
    async fn expand(&self, task: CrawlTask, visited: &VisitedSet) -> Vec<CrawlTask> {
        let page = match self.fetcher.fetch(&task.url).await {
            Ok(page) => page,
            Err(e) => {
                debug!(url = %task.url, error = %e, "crawl fetch failed");
                return Vec::new();
            }
        };

        let html = String::from_utf8_lossy(&page.bytes);
        let mut children = Vec::new();

        for href in extract_links(&html) {
            let Some(link) = resolve_reference(&task.url, &href) else {
                continue;
            };
            if self.config.same_origin && link.origin() != task.url.origin() {
                continue;
            }
            if self.config.is_image(&link) || visited.contains(&link) {
                continue;
            }
            children.push(CrawlTask {
                url: link,
                depth: task.depth + 1,
            });
        }

        self.reporter.page_crawled(task.url.as_str());
        children
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why claim before fetching?
//    - Two pages can link to the same URL while both are in flight
//    - Whoever claims first fetches it; the other task is dropped on pop
//    - visited.contains() in expand() is only a shortcut to keep the queue small
//
// 2. Why can the depth check live on pop only?
//    - Children are queued at depth + 1 unconditionally
//    - A task deeper than max_depth is discarded before it is claimed, so the
//      too-deep URL never shows up in the result
//
// 3. Why FuturesUnordered instead of tokio::spawn?
//    - The futures borrow the crawler and the visited set
//    - They all make progress on the current task while waiting on the network
//    - The loop never has more than `concurrency` of them at once
// -----------------------------------------------------------------------------
