// src/main.rs
// =============================================================================
// This is the entry point of the site-mirror CLI.
//
// What happens here:
// 1. Set up tracing (diagnostics on stderr, controlled by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Crawl + mirror the site, reporting progress on the console
// 4. Optionally print a JSON summary
// 5. Exit with a proper code (0 = mirror completed, 2 = setup error)
//
// A run that hit broken pages or assets still exits 0: those are reported
// line by line and the mirror is best-effort.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use site_mirror::fetch::ReqwestFetcher;
use site_mirror::report::{ConsoleReporter, MirrorEvent, RecordingReporter, Tee};
use site_mirror::{mirror_site, MirrorSummary};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!(
                "{}",
                console::style(format!("Runtime Error: {:#}", e)).red()
            );
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.to_config();

    let fetcher = ReqwestFetcher::new(&config).context("could not set up the HTTP client")?;
    let console = ConsoleReporter::new();
    let recorder = RecordingReporter::new();
    let reporter = Tee::new(&console, &recorder);

    let summary = mirror_site(&cli.start_url, &config, &fetcher, &reporter)
        .await
        .with_context(|| format!("mirroring {} failed", cli.start_url))?;

    if cli.json {
        print_json(&summary, &recorder.events())?;
    } else {
        print_summary(&summary);
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: &'a MirrorSummary,
    errors: Vec<&'a str>,
}

fn print_json(summary: &MirrorSummary, events: &[MirrorEvent]) -> Result<()> {
    let errors = events
        .iter()
        .filter_map(|event| match event {
            MirrorEvent::Error(message) => Some(message.as_str()),
            _ => None,
        })
        .collect();

    let report = JsonReport { summary, errors };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_summary(summary: &MirrorSummary) {
    println!();
    println!("📊 Summary:");
    println!("   📁 Output: {}", summary.output_dir.display());
    println!("   ✅ Saved: {}", summary.saved.len());
    println!("   ❌ Failed: {}", summary.failed);
}
