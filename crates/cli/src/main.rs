// ABOUTME: CLI binary for the sitescan extraction engine.
// ABOUTME: Runs the news and/or analysis pipelines over a site config and prints JSON.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sitescan_engine::{
    load_builtin_config, BatchRunner, NewsItem, PageSeoRecord, SiteConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fetch configured sites and extract news listings or page analysis as JSON.
#[derive(Parser, Debug)]
#[command(name = "sitescan")]
#[command(about = "Extract news items and page analysis from configured sites", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Site config file (JSON). The built-in config is used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only process these configured URLs (repeatable).
    #[arg(long = "url", global = true)]
    urls: Vec<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Number of URLs processed at the same time.
    #[arg(long, global = true, default_value_t = sitescan_engine::options::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks", global = true)]
    allow_private_networks: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output", global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Extract news items from every configured news site.
    News,
    /// Analyze every configured analysis page.
    Analyze,
    /// Run both pipelines and print one combined object.
    All,
}

#[derive(Serialize)]
struct Combined {
    news: Vec<NewsItem>,
    seo: Vec<PageSeoRecord>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<SiteConfig> {
    let mut config = match &args.config {
        Some(path) => SiteConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => load_builtin_config(),
    };

    let unknown: Vec<&String> = args
        .urls
        .iter()
        .filter(|u| {
            !config.news.iter().any(|s| &s.url == *u)
                && !config.analysis.iter().any(|s| &s.url == *u)
        })
        .collect();
    if !unknown.is_empty() {
        bail!("--url not present in config: {:?}", unknown);
    }

    config.retain_urls(&args.urls);
    Ok(config)
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }

    let config = load_config(&args)?;
    let runner = BatchRunner::builder()
        .timeout(Duration::from_secs(args.timeout))
        .allow_private_networks(args.allow_private_networks)
        .concurrency(args.concurrency)
        .build()?;

    info!(
        news_sites = config.news.len(),
        analysis_sites = config.analysis.len(),
        command = ?args.command,
        "running"
    );

    let output = match args.command {
        Command::News => to_json(&runner.run_news(config.news_inputs()).await, args.compact)?,
        Command::Analyze => to_json(
            &runner.run_analysis(config.analysis_inputs()).await,
            args.compact,
        )?,
        Command::All => {
            let combined = Combined {
                news: runner.run_news(config.news_inputs()).await,
                seo: runner.run_analysis(config.analysis_inputs()).await,
            };
            to_json(&combined, args.compact)?
        }
    };

    match &args.output {
        Some(path) => fs::write(path, format!("{}\n", output))
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", output),
    }

    Ok(())
}
