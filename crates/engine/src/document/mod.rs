// ABOUTME: Queryable HTML document wrapper used by both extraction pipelines.
// ABOUTME: Wraps scraper's DOM behind select/text/attr helpers with explicit not-found outcomes.

//! Parsed document queries.
//!
//! A [`ParsedDocument`] is built once per fetched page and shared by every
//! extractor that reads it. Queries never mutate the document, so repeated
//! extraction over the same document yields identical output.
//!
//! Selector misses are ordinary outcomes, not errors: [`ParsedDocument::select`]
//! returns an empty vector when nothing matches, and the single-node lookups
//! return [`NotFound`] so callers can decide between skipping and defaulting.
//!
//! Lookups under a [`Node`] are confined to that node's subtree: every
//! element a selector's combinators walk through must be the node itself or
//! one of its descendants.

pub mod compiled;

use ego_tree::{NodeMut, NodeRef};
use scraper::{ElementRef, Html};

use crate::document::compiled::CompiledSelector;

/// Elements whose text is never rendered to the reader.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Why a single-node lookup produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("no node matches `{0}`")]
    NoMatch(String),
    #[error("attribute `{0}` is missing")]
    MissingAttr(String),
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Appends a copy of `src` and everything below it under `parent`.
fn append_copy(src: NodeRef<'_, scraper::Node>, parent: &mut NodeMut<'_, scraper::Node>) {
    let mut copy = parent.append(src.value().clone());
    for child in src.children() {
        append_copy(child, &mut copy);
    }
}

/// A page parsed into a queryable DOM.
pub struct ParsedDocument {
    html: Html,
}

impl ParsedDocument {
    /// Parses page content. HTML parsing is error-tolerant and never fails.
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    /// Selects every node matching `css` in document order.
    ///
    /// An empty vector means nothing matched; `Err` is reserved for selectors
    /// that do not parse.
    pub fn select(&self, css: &str) -> Result<Vec<Node<'_>>, NotFound> {
        Ok(self.select_with(&CompiledSelector::parse(css)?))
    }

    /// Selects every node matching an already compiled selector.
    pub fn select_with(&self, selector: &CompiledSelector) -> Vec<Node<'_>> {
        self.html.select(selector.selector()).map(Node::from).collect()
    }

    /// Returns the first node matching `css`.
    pub fn first(&self, css: &str) -> Result<Node<'_>, NotFound> {
        let selector = CompiledSelector::parse(css)?;
        self.html
            .select(selector.selector())
            .next()
            .map(Node::from)
            .ok_or_else(|| NotFound::NoMatch(css.to_string()))
    }

    /// Returns the document's rendered text, whitespace-normalized.
    ///
    /// Text inside `script`, `style`, `noscript` and `template` is left out.
    /// Adjacent text nodes are concatenated without a separator, so inline
    /// markup inside a word does not split it.
    pub fn visible_text(&self) -> String {
        let mut text = String::new();
        for node in self.html.root_element().descendants() {
            let Some(fragment) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
            });
            if !hidden {
                text.push_str(fragment);
            }
        }
        normalize_whitespace(&text)
    }
}

/// A single element inside a [`ParsedDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    el: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Node<'a> {
    fn from(el: ElementRef<'a>) -> Self {
        Self { el }
    }
}

impl<'a> Node<'a> {
    /// Tag name of the element, lowercase.
    pub fn name(&self) -> &str {
        self.el.value().name()
    }

    /// Whitespace-normalized text of the element and its descendants.
    pub fn text(&self) -> String {
        normalize_whitespace(&self.el.text().collect::<String>())
    }

    /// Raw value of attribute `name`.
    pub fn attr(&self, name: &str) -> Result<String, NotFound> {
        self.el
            .value()
            .attr(name)
            .map(str::to_string)
            .ok_or_else(|| NotFound::MissingAttr(name.to_string()))
    }

    /// Raw value of attribute `name`, or `None` when it is absent.
    pub fn attr_opt(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    /// Returns the first node matching `css`, searching the element itself
    /// and then its descendants in document order.
    pub fn first(&self, css: &str) -> Result<Node<'a>, NotFound> {
        self.first_with(&CompiledSelector::parse(css)?)
    }

    /// Like [`Node::first`] with an already compiled selector.
    ///
    /// Ancestors outside this node never take part in matching: `section a`
    /// only matches when the `section` is this node or lies inside it.
    pub fn first_with(&self, selector: &CompiledSelector) -> Result<Node<'a>, NotFound> {
        let miss = || NotFound::NoMatch(selector.source().to_string());
        let matcher = selector.selector();

        // subtree matches are a subset of whole-document matches
        let any_match = matcher.matches(&self.el) || self.el.select(matcher).next().is_some();
        if !any_match {
            return Err(miss());
        }

        let detached = self.detached();
        let position = detached
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .position(|el| matcher.matches(&el))
            .ok_or_else(miss)?;

        self.el
            .descendent_elements()
            .nth(position)
            .map(Node::from)
            .ok_or_else(miss)
    }

    /// A standalone copy of this element's subtree, with no ancestors.
    fn detached(&self) -> Html {
        let mut html = Html::new_fragment();
        append_copy(*self.el, &mut html.tree.root_mut());
        html
    }
}
