// ABOUTME: Output records produced by the news and page-analysis pipelines.
// ABOUTME: NewsItem, MetaTag, KeywordCount, KeywordPosition and PageSeoRecord plus their placeholders.

use serde::{Deserialize, Serialize};

/// Title of the placeholder item emitted for a URL with no news.
pub const NO_NEWS_TITLE: &str = "No news found";
/// URL of the placeholder item emitted for a URL with no news.
pub const NO_NEWS_URL: &str = "#";
/// Title used when a page has no `<title>` element.
pub const NO_TITLE: &str = "No title found";
/// Title of an analysis record whose page could not be fetched.
pub const ERROR_FETCHING_TITLE: &str = "Error fetching data";
/// Title of an analysis record that failed for any other reason.
pub const UNEXPECTED_ERROR_TITLE: &str = "Unexpected error";
/// Stand-in for a meta tag without a `name` attribute.
pub const NO_META_NAME: &str = "No name";
/// Stand-in for a meta tag without a `content` attribute.
pub const NO_META_CONTENT: &str = "No content";

/// A single post extracted from a news listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
}

impl NewsItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// The item standing in for a URL that failed or matched no posts.
    pub fn placeholder() -> Self {
        Self::new(NO_NEWS_TITLE, NO_NEWS_URL)
    }

    pub fn is_placeholder(&self) -> bool {
        self.title == NO_NEWS_TITLE && self.url == NO_NEWS_URL
    }
}

/// A `<meta>` tag's name/content pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// Occurrences of one keyword in a page's visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub usage_count: usize,
}

/// Simulated search-engine position of one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPosition {
    pub keyword: String,
    pub position: u32,
}

/// Page-analysis result for one configured URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageSeoRecord {
    pub url: String,
    pub title: String,
    pub meta_tags: Vec<MetaTag>,
    pub keyword_analysis: Vec<KeywordCount>,
    pub search_engine_positions: Vec<KeywordPosition>,
}

impl PageSeoRecord {
    /// A record carrying only the URL and an error title.
    pub fn failed(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Returns true if this record stands in for a failed URL.
    pub fn is_failed(&self) -> bool {
        (self.title == ERROR_FETCHING_TITLE || self.title == UNEXPECTED_ERROR_TITLE)
            && self.meta_tags.is_empty()
            && self.keyword_analysis.is_empty()
            && self.search_engine_positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholder_shape() {
        let item = NewsItem::placeholder();
        assert_eq!(item, NewsItem::new("No news found", "#"));
        assert!(item.is_placeholder());
        assert!(!NewsItem::new("No news found", "https://a.test/").is_placeholder());
    }

    #[test]
    fn failed_record_has_empty_arrays() {
        let record = PageSeoRecord::failed("https://a.test/", ERROR_FETCHING_TITLE);
        assert_eq!(record.url, "https://a.test/");
        assert_eq!(record.title, "Error fetching data");
        assert!(record.meta_tags.is_empty());
        assert!(record.keyword_analysis.is_empty());
        assert!(record.search_engine_positions.is_empty());
        assert!(record.is_failed());
    }

    #[test]
    fn record_serializes_with_snake_case_fields() {
        let record = PageSeoRecord {
            url: "https://a.test/".into(),
            title: "A".into(),
            meta_tags: vec![MetaTag {
                name: "description".into(),
                content: "d".into(),
            }],
            keyword_analysis: vec![KeywordCount {
                keyword: "rust".into(),
                usage_count: 2,
            }],
            search_engine_positions: vec![KeywordPosition {
                keyword: "rust".into(),
                position: 3,
            }],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["keyword_analysis"][0]["usage_count"], 2);
        assert_eq!(json["search_engine_positions"][0]["position"], 3);
        assert_eq!(json["meta_tags"][0]["name"], "description");
    }
}
