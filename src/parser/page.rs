use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::error::ParseError;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static FOOTNOTE: LazyLock<Selector> = LazyLock::new(|| sel("sup"));

/// Parse a static selector. Panics on invalid CSS, so only use with literals.
pub fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// A parsed wiki page. Entities are decoded once, by the HTML parser.
pub struct Page {
    html: Html,
}

impl Page {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn try_parse(markup: &str) -> Result<Self, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }
        Ok(Self::parse(markup))
    }

    /// Searches go through the document element so detached subtrees stay invisible.
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.root_element().select(selector).next()
    }

    pub fn select_all<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.root_element().select(selector)
    }

    /// Detach every node matching `selector` from the tree. Returns how many were removed.
    pub fn remove_all(&mut self, selector: &Selector) -> usize {
        let ids: Vec<_> = self.select_all(selector).map(|el| el.id()).collect();
        let mut removed = 0;
        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
        removed
    }
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

pub fn first<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    el.select(selector).next()
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

pub fn next_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Visible text of `el`, whitespace-collapsed and trimmed.
pub fn text(el: ElementRef<'_>) -> String {
    normalize(&el.text().collect::<String>())
}

/// Like [`text`], but skips footnote superscripts.
pub fn text_without_footnotes(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &FOOTNOTE, &mut raw);
    normalize(&raw)
}

fn collect_text(el: ElementRef<'_>, skip: &Selector, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !skip.matches(&child_el) {
                        collect_text(child_el, skip, out);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn normalize(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}
