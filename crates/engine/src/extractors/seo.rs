// ABOUTME: Page analyzer producing title, meta tags and keyword usage counts from one parsed page.
// ABOUTME: Each helper defaults independently so a missing element never fails the whole record.

//! Page analysis.
//!
//! All helpers read the same [`ParsedDocument`]; nothing here re-fetches
//! the page or mutates the document.

use crate::diagnostics::{Diagnostic, DiagnosticSink, UrlStage};
use crate::document::ParsedDocument;
use crate::error::ErrorCode;
use crate::rank::RankSimulator;
use crate::result::{
    KeywordCount, KeywordPosition, MetaTag, PageSeoRecord, NO_META_CONTENT, NO_META_NAME,
    NO_TITLE,
};

/// Text of the first `<title>` element, or `None` when the page has none.
pub fn find_title(doc: &ParsedDocument) -> Option<String> {
    doc.first("title").ok().map(|node| node.text())
}

/// Text of the first `<title>` element, or [`NO_TITLE`].
pub fn page_title(doc: &ParsedDocument) -> String {
    find_title(doc).unwrap_or_else(|| NO_TITLE.to_string())
}

/// Name/content pairs of every `<meta>` element in document order.
///
/// Tags with neither a non-empty `name` nor a non-empty `content` are left
/// out. An absent attribute is replaced by its placeholder; a present but
/// empty one is kept as-is.
pub fn meta_tags(doc: &ParsedDocument) -> Vec<MetaTag> {
    let Ok(nodes) = doc.select("meta") else {
        return Vec::new();
    };

    nodes
        .into_iter()
        .filter_map(|node| {
            let name = node.attr_opt("name");
            let content = node.attr_opt("content");
            let has_name = name.is_some_and(|v| !v.is_empty());
            let has_content = content.is_some_and(|v| !v.is_empty());
            if !has_name && !has_content {
                return None;
            }
            Some(MetaTag {
                name: name.unwrap_or(NO_META_NAME).to_string(),
                content: content.unwrap_or(NO_META_CONTENT).to_string(),
            })
        })
        .collect()
}

/// Counts non-overlapping occurrences of `needle` in `haystack`, scanning left to right.
///
/// Both sides are expected to be lowercased already. An empty or
/// whitespace-only needle counts as zero.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.trim().is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Case-insensitive usage count of each keyword in the page's visible text.
///
/// One entry per keyword, in input order; duplicate keywords are kept.
pub fn keyword_analysis(doc: &ParsedDocument, keywords: &[String]) -> Vec<KeywordCount> {
    let text = doc.visible_text().to_lowercase();
    keywords
        .iter()
        .map(|keyword| KeywordCount {
            keyword: keyword.clone(),
            usage_count: count_occurrences(&text, &keyword.to_lowercase()),
        })
        .collect()
}

/// Simulated positions for each keyword, in input order.
pub fn search_engine_positions(
    keywords: &[String],
    rank: &dyn RankSimulator,
) -> Vec<KeywordPosition> {
    keywords
        .iter()
        .map(|keyword| KeywordPosition {
            keyword: keyword.clone(),
            position: rank.position_for(keyword),
        })
        .collect()
}

/// Builds the full analysis record for one fetched page.
///
/// A missing `<title>` is reported to `sink` and replaced by [`NO_TITLE`].
pub fn analyze_page(
    url: &str,
    doc: &ParsedDocument,
    keywords: &[String],
    rank: &dyn RankSimulator,
    sink: &dyn DiagnosticSink,
) -> PageSeoRecord {
    let title = find_title(doc).unwrap_or_else(|| {
        sink.record(Diagnostic::new(
            url,
            UrlStage::Extract,
            ErrorCode::Extract,
            "no <title> element",
        ));
        NO_TITLE.to_string()
    });

    PageSeoRecord {
        url: url.to_string(),
        title,
        meta_tags: meta_tags(doc),
        keyword_analysis: keyword_analysis(doc, keywords),
        search_engine_positions: search_engine_positions(keywords, rank),
    }
}
