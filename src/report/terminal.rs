// src/report/terminal.rs
// =============================================================================
// The operator-facing reporter: one colored, timestamped line per event.
//
//   [14:02:11] Starting Website Crawling...        (bold)
//     - Saved URL: https://example.com/about       (yellow)
//   [14:02:13] Starting Website Cloning...         (bold)
//     - Get Reference: https://example.com/a.css   (cyan)
//   [14:02:13] Save Resource: https://example.com/ (green)
//   [14:02:14] Error: HTTP 404 for ...             (red, stderr)
//   [14:02:15] Finished Website Cloning...         (bold)
//
// The `console` crate drops the colors on its own when stdout is not a tty.
// =============================================================================

use ::console::style;
use chrono::Local;

use super::Reporter;

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

impl Reporter for ConsoleReporter {
    fn crawl_started(&self) {
        let line = format!("[{}] Starting Website Crawling...", timestamp());
        println!("{}", style(line).bold());
    }

    fn page_crawled(&self, url: &str) {
        println!("{}", style(format!("  - Saved URL: {}", url)).yellow());
    }

    fn started(&self) {
        let line = format!("[{}] Starting Website Cloning...", timestamp());
        println!("{}", style(line).bold());
    }

    fn reference_discovered(&self, url: &str) {
        println!("{}", style(format!("  - Get Reference: {}", url)).cyan());
    }

    fn resource_saved(&self, url: &str) {
        let line = format!("[{}] Save Resource: {}", timestamp(), url);
        println!("{}", style(line).green());
    }

    fn error(&self, message: &str) {
        let line = format!("[{}] Error: {}", timestamp(), message);
        eprintln!("{}", style(line).red());
    }

    fn finished(&self) {
        let line = format!("[{}] Finished Website Cloning...", timestamp());
        println!("{}", style(line).bold());
    }
}
