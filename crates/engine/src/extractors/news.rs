// ABOUTME: News extractor that turns post nodes on a listing page into NewsItems.
// ABOUTME: Applies selector defaults, skips incomplete post nodes and resolves hrefs to absolute URLs.

//! News extraction.
//!
//! Two granularities of "nothing found" are kept apart:
//! - the post selector matching no node at all yields the single
//!   [`NewsItem::placeholder`] for the page;
//! - a post node whose title or path sub-selector misses is skipped on its
//!   own ([`NodeOutcome::Skipped`]) and the remaining nodes still produce items.
//!
//! When every matched node is skipped the page contributes no items; no
//! placeholder is synthesized in that case.

use crate::config::SelectorConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, UrlStage};
use crate::document::compiled::SiteSelectors;
use crate::document::{Node, NotFound, ParsedDocument};
use crate::error::{ErrorCode, ScrapeError};
use crate::result::NewsItem;
use crate::urls::resolve_url;

/// Result of reading one post node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    Item(NewsItem),
    Skipped(NotFound),
}

/// Reads the title and link of a single post node.
///
/// Both sub-selectors are matched inside the post node only.
pub fn extract_node(base_url: &str, node: Node<'_>, selectors: &SiteSelectors) -> NodeOutcome {
    let title = match selectors
        .title
        .as_ref()
        .map_err(NotFound::clone)
        .and_then(|sel| node.first_with(sel))
    {
        Ok(el) => el.text(),
        Err(miss) => return NodeOutcome::Skipped(miss),
    };
    let href = match selectors
        .path
        .as_ref()
        .map_err(NotFound::clone)
        .and_then(|sel| node.first_with(sel))
        .and_then(|el| el.attr("href"))
    {
        Ok(href) => href,
        Err(miss) => return NodeOutcome::Skipped(miss),
    };
    NodeOutcome::Item(NewsItem::new(title, resolve_url(base_url, &href)))
}

/// Extracts every post on a page in document order.
///
/// Returns the placeholder item when the post selector matches nothing, and
/// a `Parse` error when the post selector itself is invalid. Skipped nodes
/// are reported to `sink`.
pub fn extract_news(
    base_url: &str,
    doc: &ParsedDocument,
    config: &SelectorConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<NewsItem>, ScrapeError> {
    let selectors = SiteSelectors::compile(config);
    let posts = match &selectors.post {
        Ok(post) => doc.select_with(post),
        Err(miss) => {
            return Err(ScrapeError::parse(
                base_url,
                "ExtractNews",
                Some(anyhow::Error::new(miss.clone())),
            ))
        }
    };

    if posts.is_empty() {
        return Ok(vec![NewsItem::placeholder()]);
    }

    let mut items = Vec::with_capacity(posts.len());
    for (index, node) in posts.into_iter().enumerate() {
        match extract_node(base_url, node, &selectors) {
            NodeOutcome::Item(item) => items.push(item),
            NodeOutcome::Skipped(miss) => sink.record(Diagnostic::new(
                base_url,
                UrlStage::Extract,
                ErrorCode::Extract,
                format!("skipped post #{}: {}", index, miss),
            )),
        }
    }
    Ok(items)
}
