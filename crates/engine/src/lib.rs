// ABOUTME: Main library entry point for the sitescan content-extraction engine.
// ABOUTME: Re-exports the public API: BatchRunner, RunnerBuilder, SiteConfig, result records and error types.

//! Sitescan - fetches configured web pages and extracts structured data from them.
//!
//! Two pipelines share one fetch-and-parse core:
//! - the news pipeline reads post listings with per-site CSS selectors and
//!   yields `{title, url}` items with absolute URLs;
//! - the analysis pipeline reads a page's title, meta tags and keyword usage
//!   and yields one record per page.
//!
//! Every URL is isolated: a failure becomes placeholder output plus a
//! diagnostic, never a failed batch.
//!
//! # Example
//!
//! ```no_run
//! use sitescan_engine::{load_builtin_config, BatchRunner, ScrapeError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ScrapeError> {
//!     let config = load_builtin_config();
//!     let runner = BatchRunner::builder().concurrency(2).build()?;
//!     let news = runner.run_news(config.news_inputs()).await;
//!     let seo = runner.run_analysis(config.analysis_inputs()).await;
//!     println!("{} news items, {} page records", news.len(), seo.len());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod extractors;
pub mod loader;
pub mod options;
pub mod rank;
pub mod resource;
pub mod result;
pub mod urls;

pub use crate::batch::BatchRunner;
pub use crate::config::{AnalysisSite, ConfigError, NewsSite, SelectorConfig, SiteConfig};
pub use crate::diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink, UrlStage};
pub use crate::document::{Node, NotFound, ParsedDocument};
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extractors::news::extract_news;
pub use crate::extractors::seo::analyze_page;
pub use crate::loader::load_builtin_config;
pub use crate::options::{Options, RunnerBuilder};
pub use crate::rank::{RandomRank, RankSimulator};
pub use crate::resource::{Fetcher, HttpFetcher};
pub use crate::result::{KeywordCount, KeywordPosition, MetaTag, NewsItem, PageSeoRecord};
pub use crate::urls::resolve_url;
