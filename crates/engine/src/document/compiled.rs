// ABOUTME: Compiled CSS selectors for one news site, parsed once per page and reused for every post node.
// ABOUTME: An invalid selector is kept as a NotFound outcome so each lookup reports it the same way.

//! Compiled selectors.
//!
//! A listing page applies the same title and path selectors to every post
//! node it contains. [`SiteSelectors::compile`] parses the three effective
//! selectors of a [`SelectorConfig`] up front; the extractor then hands the
//! compiled forms to [`ParsedDocument::select_with`](super::ParsedDocument::select_with)
//! and [`Node::first_with`](super::Node::first_with).

use scraper::Selector;

use crate::config::SelectorConfig;
use crate::document::NotFound;

/// A parsed CSS selector together with the text it came from.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    /// Parses `css`, reporting an unparseable selector as [`NotFound::InvalidSelector`].
    pub fn parse(css: &str) -> Result<Self, NotFound> {
        let selector =
            Selector::parse(css).map_err(|_| NotFound::InvalidSelector(css.to_string()))?;
        Ok(Self {
            source: css.to_string(),
            selector,
        })
    }

    /// The selector text as configured.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// The post, title and path selectors of one news site.
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub post: Result<CompiledSelector, NotFound>,
    pub title: Result<CompiledSelector, NotFound>,
    pub path: Result<CompiledSelector, NotFound>,
}

impl SiteSelectors {
    /// Compiles the effective selectors of `config`, defaults included.
    pub fn compile(config: &SelectorConfig) -> Self {
        Self {
            post: CompiledSelector::parse(config.post()),
            title: CompiledSelector::parse(config.title()),
            path: CompiledSelector::parse(config.path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_keeps_source_text() {
        let compiled = CompiledSelector::parse("a h3 div").unwrap();
        assert_eq!(compiled.source(), "a h3 div");
    }

    #[test]
    fn invalid_selector_is_not_found() {
        assert_eq!(
            CompiledSelector::parse("[[[invalid").unwrap_err(),
            NotFound::InvalidSelector("[[[invalid".to_string())
        );
        assert!(CompiledSelector::parse("").is_err());
    }

    #[test]
    fn defaults_compile_for_empty_config() {
        let selectors = SiteSelectors::compile(&SelectorConfig::default());
        assert_eq!(selectors.post.unwrap().source(), ".blog-post");
        assert_eq!(selectors.title.unwrap().source(), "h2 a");
        assert_eq!(selectors.path.unwrap().source(), "h2 a");
    }

    #[test]
    fn one_invalid_selector_leaves_the_others_usable() {
        let config = SelectorConfig::new()
            .post_selector(".js-trackPostPresentation")
            .title_selector(":::");
        let selectors = SiteSelectors::compile(&config);
        assert!(selectors.post.is_ok());
        assert!(selectors.title.is_err());
        assert!(selectors.path.is_ok());
    }
}
