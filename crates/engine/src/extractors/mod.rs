// ABOUTME: Extraction strategies that turn one parsed page into pipeline output.
// ABOUTME: Includes the news listing extractor and the page analyzer.

//! Extraction module.
//!
//! Submodules:
//! - `news`: Post listing extraction driven by configurable selectors.
//! - `seo`: Title, meta tag and keyword analysis of a single page.

pub mod news;
pub mod seo;
