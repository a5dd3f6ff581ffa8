// src/report/mod.rs
// =============================================================================
// Lifecycle notifications.
//
// The crawler and the materializer call a Reporter at fixed points of a run.
// A reporter only observes: it returns nothing and cannot stop the run.
//
// - ConsoleReporter: timestamped, colored lines for the operator
// - RecordingReporter: keeps every event in memory (tests, --json runs)
// =============================================================================

mod terminal;

pub use terminal::ConsoleReporter;

use serde::Serialize;
use std::sync::Mutex;

/// One method per lifecycle event. All methods default to doing nothing so an
/// implementation only overrides what it cares about.
pub trait Reporter: Send + Sync {
    /// The crawl phase is about to begin
    fn crawl_started(&self) {}
    /// A page was fetched and its links were queued
    fn page_crawled(&self, _url: &str) {}
    /// The mirror phase is about to begin
    fn started(&self) {}
    /// A resource is about to be fetched for the mirror
    fn reference_discovered(&self, _url: &str) {}
    /// A resource was written to the output directory
    fn resource_saved(&self, _url: &str) {}
    /// A single resource failed; the run keeps going
    fn error(&self, _message: &str) {}
    /// The mirror phase is done
    fn finished(&self) {}
}

/// A reporter that ignores everything.
pub struct SilentReporter;

impl Reporter for SilentReporter {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum MirrorEvent {
    CrawlStarted,
    PageCrawled(String),
    Started,
    ReferenceDiscovered(String),
    ResourceSaved(String),
    Error(String),
    Finished,
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<MirrorEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far, in arrival order
    pub fn events(&self) -> Vec<MirrorEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: MirrorEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Reporter for RecordingReporter {
    fn crawl_started(&self) {
        self.push(MirrorEvent::CrawlStarted);
    }

    fn page_crawled(&self, url: &str) {
        self.push(MirrorEvent::PageCrawled(url.to_string()));
    }

    fn started(&self) {
        self.push(MirrorEvent::Started);
    }

    fn reference_discovered(&self, url: &str) {
        self.push(MirrorEvent::ReferenceDiscovered(url.to_string()));
    }

    fn resource_saved(&self, url: &str) {
        self.push(MirrorEvent::ResourceSaved(url.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(MirrorEvent::Error(message.to_string()));
    }

    fn finished(&self) {
        self.push(MirrorEvent::Finished);
    }
}

/// Forwards every event to two reporters, e.g. the console and a recorder.
pub struct Tee<'a> {
    first: &'a dyn Reporter,
    second: &'a dyn Reporter,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn Reporter, second: &'a dyn Reporter) -> Self {
        Self { first, second }
    }
}

impl Reporter for Tee<'_> {
    fn crawl_started(&self) {
        self.first.crawl_started();
        self.second.crawl_started();
    }

    fn page_crawled(&self, url: &str) {
        self.first.page_crawled(url);
        self.second.page_crawled(url);
    }

    fn started(&self) {
        self.first.started();
        self.second.started();
    }

    fn reference_discovered(&self, url: &str) {
        self.first.reference_discovered(url);
        self.second.reference_discovered(url);
    }

    fn resource_saved(&self, url: &str) {
        self.first.resource_saved(url);
        self.second.resource_saved(url);
    }

    fn error(&self, message: &str) {
        self.first.error(message);
        self.second.error(message);
    }

    fn finished(&self) {
        self.first.finished();
        self.second.finished();
    }
}
