use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::page::{self, sel, Page};

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| sel("h1, h2, h3, h4, h5, h6"));
static ANCHORED: LazyLock<Selector> = LazyLock::new(|| sel("[id]"));
static LIST: LazyLock<Selector> = LazyLock::new(|| sel("ul, ol"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| sel("li"));

/// Accepted anchor ids per logical section, highest priority first.
pub const SYNOPSIS: &[&str] = &["Synopsis", "Plot"];
pub const TRIVIA: &[&str] = &["Trivia"];
pub const BEHIND_THE_SCENES: &[&str] = &["Behind_the_Scenes"];

/// A located section heading.
#[derive(Debug, Clone, Copy)]
pub struct Heading<'a> {
    /// The element whose following siblings form the section body.
    container: ElementRef<'a>,
    level: u8,
}

impl<'a> Heading<'a> {
    /// Find the heading for the first anchor in `anchors` that exists on the page.
    pub fn find(page: &'a Page, anchors: &[&str]) -> Option<Self> {
        anchors.iter().find_map(|anchor| {
            page.select_all(&HEADINGS)
                .find(|h| has_anchor(*h, anchor))
                .and_then(Self::from_heading)
        })
    }

    fn from_heading(h: ElementRef<'a>) -> Option<Self> {
        let level = heading_level(h)?;
        // Newer MediaWiki wraps headings in <div class="mw-heading">.
        let container = page::parent_element(h)
            .filter(|p| p.value().classes().any(|c| c == "mw-heading"))
            .unwrap_or(h);
        Some(Self { container, level })
    }

    /// Sibling elements after the heading, up to the next heading of the same or higher level.
    pub fn body(&self) -> Vec<ElementRef<'a>> {
        std::iter::successors(page::next_element(self.container), |el| page::next_element(*el))
            .take_while(|el| !ends_section(*el, self.level))
            .collect()
    }
}

fn has_anchor(h: ElementRef<'_>, anchor: &str) -> bool {
    page::attr(h, "id") == Some(anchor)
        || h.select(&ANCHORED).any(|el| page::attr(el, "id") == Some(anchor))
}

fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn ends_section(el: ElementRef<'_>, level: u8) -> bool {
    let own = heading_level(el).or_else(|| {
        el.value()
            .classes()
            .any(|c| c == "mw-heading")
            .then(|| el.select(&HEADINGS).next().and_then(heading_level))
            .flatten()
    });
    own.is_some_and(|l| l <= level)
}

/// Text of the section, one line per sibling element. Empty when the heading is absent.
pub fn section_text(page: &Page, anchors: &[&str]) -> String {
    let Some(heading) = Heading::find(page, anchors) else {
        return String::new();
    };
    heading
        .body()
        .into_iter()
        .map(page::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Items of the first list inside the section. Empty when the heading or list is absent.
pub fn section_list(page: &Page, anchors: &[&str]) -> Vec<String> {
    let Some(heading) = Heading::find(page, anchors) else {
        return Vec::new();
    };
    heading
        .body()
        .into_iter()
        .find_map(|el| {
            if LIST.matches(&el) {
                Some(el)
            } else {
                el.select(&LIST).next()
            }
        })
        .map(|list| {
            list.select(&ITEM)
                .map(page::text)
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
