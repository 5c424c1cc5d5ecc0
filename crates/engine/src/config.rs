// ABOUTME: Per-site configuration: selector overrides for news sites and keyword lists for analysis.
// ABOUTME: SiteConfig is deserialized from JSON; list order is the batch processing order.

//! Site configuration.
//!
//! A [`SiteConfig`] lists the news sites (with optional selector overrides)
//! and the analysis sites (with their keywords). Both lists are arrays so the
//! declaration order in the file is exactly the order of the batch output.
//!
//! ```json
//! {
//!   "news": [
//!     { "url": "https://symfony.com/blog/" },
//!     { "url": "https://blog.angular.dev/", "postSelector": ".post", "pathSelector": "a" }
//!   ],
//!   "analysis": [
//!     { "url": "https://symfony.com/blog/", "keywords": ["Symfony", "PHP"] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Post selector used when a site does not override it.
pub const DEFAULT_POST_SELECTOR: &str = ".blog-post";
/// Title selector used when a site does not override it.
pub const DEFAULT_TITLE_SELECTOR: &str = "h2 a";
/// Path (href) selector used when a site does not override it.
pub const DEFAULT_PATH_SELECTOR: &str = "h2 a";

/// Errors raised while loading a site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured URL is not an absolute http(s) URL.
    #[error("invalid site URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Optional selector overrides for one news site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    /// Selects one node per post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_selector: Option<String>,
    /// Selects the title element inside a post node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_selector: Option<String>,
    /// Selects the element carrying the post link's `href` inside a post node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_selector: Option<String>,
}

impl SelectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_selector(mut self, css: impl Into<String>) -> Self {
        self.post_selector = Some(css.into());
        self
    }

    pub fn title_selector(mut self, css: impl Into<String>) -> Self {
        self.title_selector = Some(css.into());
        self
    }

    pub fn path_selector(mut self, css: impl Into<String>) -> Self {
        self.path_selector = Some(css.into());
        self
    }

    /// Effective post selector.
    pub fn post(&self) -> &str {
        self.post_selector.as_deref().unwrap_or(DEFAULT_POST_SELECTOR)
    }

    /// Effective title selector.
    pub fn title(&self) -> &str {
        self.title_selector
            .as_deref()
            .unwrap_or(DEFAULT_TITLE_SELECTOR)
    }

    /// Effective path selector.
    pub fn path(&self) -> &str {
        self.path_selector.as_deref().unwrap_or(DEFAULT_PATH_SELECTOR)
    }
}

/// A news listing page and how to read posts off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSite {
    pub url: String,
    #[serde(flatten)]
    pub selectors: SelectorConfig,
}

/// A page to analyze and the keywords to count on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSite {
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Complete configuration for a run of both pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub news: Vec<NewsSite>,
    #[serde(default)]
    pub analysis: Vec<AnalysisSite>,
}

impl SiteConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks that every configured URL is absolute with an http(s) scheme and a host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = self
            .news
            .iter()
            .map(|s| s.url.as_str())
            .chain(self.analysis.iter().map(|s| s.url.as_str()));
        for url in urls {
            validate_site_url(url)?;
        }
        Ok(())
    }

    /// Keeps only the sites whose URL appears in `urls`. An empty filter keeps everything.
    pub fn retain_urls(&mut self, urls: &[String]) {
        if urls.is_empty() {
            return;
        }
        self.news.retain(|s| urls.contains(&s.url));
        self.analysis.retain(|s| urls.contains(&s.url));
    }

    /// News sites as ordered `(url, selectors)` pairs for the batch runner.
    pub fn news_inputs(&self) -> Vec<(String, SelectorConfig)> {
        self.news
            .iter()
            .map(|s| (s.url.clone(), s.selectors.clone()))
            .collect()
    }

    /// Analysis sites as ordered `(url, keywords)` pairs for the batch runner.
    pub fn analysis_inputs(&self) -> Vec<(String, Vec<String>)> {
        self.analysis
            .iter()
            .map(|s| (s.url.clone(), s.keywords.clone()))
            .collect()
    }
}

fn validate_site_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };
    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "news": [
            { "url": "https://b.test/" },
            {
                "url": "https://a.test/blog/",
                "postSelector": ".js-trackPostPresentation",
                "titleSelector": "a h3 div",
                "pathSelector": "a"
            }
        ],
        "analysis": [
            { "url": "https://b.test/", "keywords": ["Symfony", "PHP", "Symfony"] },
            { "url": "https://a.test/blog/" }
        ]
    }"#;

    #[test]
    fn defaults_apply_when_selectors_absent() {
        let cfg = SelectorConfig::default();
        assert_eq!(cfg.post(), ".blog-post");
        assert_eq!(cfg.title(), "h2 a");
        assert_eq!(cfg.path(), "h2 a");
    }

    #[test]
    fn overrides_win_over_defaults() {
        let cfg = SelectorConfig::new()
            .post_selector("article")
            .title_selector("h1")
            .path_selector("a.more");
        assert_eq!(cfg.post(), "article");
        assert_eq!(cfg.title(), "h1");
        assert_eq!(cfg.path(), "a.more");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = SelectorConfig::new().post_selector("article");
        assert_eq!(cfg.post(), "article");
        assert_eq!(cfg.title(), "h2 a");
    }

    #[test]
    fn parses_sample_preserving_order() {
        let config = SiteConfig::from_json(SAMPLE).expect("parse");
        let news: Vec<_> = config.news_inputs().into_iter().map(|(u, _)| u).collect();
        assert_eq!(news, vec!["https://b.test/", "https://a.test/blog/"]);

        let (_, angular) = &config.news_inputs()[1];
        assert_eq!(angular.post(), ".js-trackPostPresentation");
        assert_eq!(angular.title(), "a h3 div");
        assert_eq!(angular.path(), "a");

        let analysis = config.analysis_inputs();
        assert_eq!(analysis[0].1, vec!["Symfony", "PHP", "Symfony"]);
        assert!(analysis[1].1.is_empty());
    }

    #[test]
    fn selector_keys_are_camel_case() {
        let cfg = SelectorConfig::new().post_selector(".x");
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(json, r#"{"postSelector":".x"}"#);
    }

    #[test]
    fn rejects_relative_url() {
        let err = SiteConfig::from_json(r#"{"news":[{"url":"/blog"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }), "got {err:?}");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = SiteConfig::from_json(r#"{"analysis":[{"url":"ftp://a.test/"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SiteConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = SiteConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn retain_urls_filters_both_lists() {
        let mut config = SiteConfig::from_json(SAMPLE).unwrap();
        config.retain_urls(&["https://a.test/blog/".to_string()]);
        assert_eq!(config.news.len(), 1);
        assert_eq!(config.analysis.len(), 1);
        assert_eq!(config.news[0].url, "https://a.test/blog/");

        let mut untouched = SiteConfig::from_json(SAMPLE).unwrap();
        untouched.retain_urls(&[]);
        assert_eq!(untouched.news.len(), 2);
    }
}
