use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::page::{self, sel, Page};

static PANEL: LazyLock<Selector> = LazyLock::new(|| sel(".portable-infobox"));
static ASIDE: LazyLock<Selector> = LazyLock::new(|| sel("aside"));
static SOURCED: LazyLock<Selector> = LazyLock::new(|| sel("[data-source]"));
static VALUE: LazyLock<Selector> = LazyLock::new(|| sel(".pi-data-value"));
static DIV: LazyLock<Selector> = LazyLock::new(|| sel("div"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| sel("li"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a"));
static IMAGE_LINK: LazyLock<Selector> = LazyLock::new(|| sel(".pi-image a, figure a"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| sel(".pi-image img, figure img"));

/// The key/value side panel of a wiki article.
#[derive(Clone, Copy)]
pub struct Infobox<'a> {
    root: ElementRef<'a>,
}

impl<'a> Infobox<'a> {
    pub fn find(page: &'a Page) -> Option<Self> {
        page.select_first(&PANEL)
            .or_else(|| page.select_first(&ASIDE))
            .map(|root| Self { root })
    }

    /// First row tagged with `key`.
    pub fn row(&self, key: &str) -> Option<Row<'a>> {
        self.root
            .select(&SOURCED)
            .find(|el| page::attr(*el, "data-source") == Some(key))
            .map(Row)
    }

    pub fn images(&self) -> Vec<String> {
        let linked: Vec<String> = self
            .root
            .select(&IMAGE_LINK)
            .filter_map(|a| page::attr(a, "href"))
            .filter(|href| href.starts_with("http"))
            .map(str::to_string)
            .collect();
        if !linked.is_empty() {
            return linked;
        }
        self.root
            .select(&IMAGE)
            .filter_map(|img| page::attr(img, "data-src").or_else(|| page::attr(img, "src")))
            .filter(|src| !src.starts_with("data:"))
            .map(str::to_string)
            .collect()
    }
}

/// A single `data-source` row.
#[derive(Clone, Copy)]
pub struct Row<'a>(ElementRef<'a>);

impl<'a> Row<'a> {
    /// The value area: `.pi-data-value`, else the first nested `div`.
    pub fn value(&self) -> Option<ElementRef<'a>> {
        page::first(self.0, &VALUE).or_else(|| page::first(self.0, &DIV))
    }

    pub fn text(&self) -> String {
        self.value()
            .map(page::text_without_footnotes)
            .unwrap_or_default()
    }

    pub fn items(&self) -> Vec<String> {
        self.value()
            .map(|v| non_empty(v.select(&ITEM).map(page::text_without_footnotes)))
            .unwrap_or_default()
    }

    /// Link text of each list item, falling back to the item's own text.
    pub fn item_links(&self) -> Vec<String> {
        self.value()
            .map(|v| {
                non_empty(v.select(&ITEM).map(|li| {
                    li.select(&LINK)
                        .find(|a| !inside_footnote(*a))
                        .map(page::text)
                        .unwrap_or_else(|| page::text_without_footnotes(li))
                }))
            })
            .unwrap_or_default()
    }

    pub fn links(&self) -> Vec<String> {
        self.value()
            .map(|v| non_empty(v.select(&LINK).filter(|a| !inside_footnote(*a)).map(page::text)))
            .unwrap_or_default()
    }

    /// List items when the value is a list, otherwise the scalar text as a single entry.
    pub fn items_or_text(&self) -> Vec<String> {
        let items = self.items();
        if !items.is_empty() {
            return items;
        }
        non_empty(std::iter::once(self.text()))
    }

    /// Names in the row: list item links, else bare links, else the scalar text.
    pub fn item_links_or_text(&self) -> Vec<String> {
        let names = self.item_links();
        if !names.is_empty() {
            return names;
        }
        let links = self.links();
        if !links.is_empty() {
            return links;
        }
        non_empty(std::iter::once(self.text()))
    }

    pub fn split(&self, separator: &str) -> Vec<String> {
        non_empty(self.text().split(separator).map(|s| s.trim().to_string()))
    }
}

fn inside_footnote(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "sup")
}

fn non_empty(values: impl Iterator<Item = String>) -> Vec<String> {
    values.filter(|v| !v.is_empty()).collect()
}

/// Scalar text of row `key`, or empty when the panel or row is missing.
pub fn scalar(page: &Page, key: &str) -> String {
    Infobox::find(page)
        .and_then(|ib| ib.row(key))
        .map(|row| row.text())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL_HTML: &str = r##"
        <aside class="portable-infobox">
          <div class="pi-item pi-data" data-source="jutsu rank">
            <h3 class="pi-data-label">Rank</h3>
            <div class="pi-data-value">B-rank</div>
          </div>
          <div class="pi-item pi-data" data-source="jutsu rank">
            <h3 class="pi-data-label">Rank</h3>
            <div class="pi-data-value">S-rank</div>
          </div>
          <div class="pi-item pi-data" data-source="users">
            <h3 class="pi-data-label">Users</h3>
            <div class="pi-data-value"><div><ul>
              <li><a href="/wiki/Naruto_Uzumaki">Naruto Uzumaki</a></li>
              <li><a href="/wiki/Jiraiya">Jiraiya</a><sup><a href="#cite">[1]</a></sup></li>
              <li>Unnamed ninja</li>
            </ul></div></div>
          </div>
          <div class="pi-item pi-data" data-source="age">
            <div class="pi-data-value">12<sup>[2]</sup></div>
          </div>
        </aside>"##;

    #[test]
    fn scalar_row() {
        let page = Page::parse(PANEL_HTML);
        assert_eq!(scalar(&page, "jutsu rank"), "B-rank");
    }

    #[test]
    fn duplicate_keys_take_first_row() {
        let page = Page::parse(PANEL_HTML);
        let ib = Infobox::find(&page).unwrap();
        assert_eq!(ib.row("jutsu rank").unwrap().text(), "B-rank");
        let tagged = ib.root.select(&SOURCED);
        assert_eq!(tagged.filter(|el| page::attr(*el, "data-source") == Some("jutsu rank")).count(), 2);
    }

    #[test]
    fn missing_row_or_panel_defaults() {
        let page = Page::parse(PANEL_HTML);
        assert_eq!(scalar(&page, "hand signs"), "");
        let bare = Page::parse("<p>No panel here</p>");
        assert!(Infobox::find(&bare).is_none());
        assert_eq!(scalar(&bare, "jutsu rank"), "");
    }

    #[test]
    fn item_links_skip_footnotes() {
        let page = Page::parse(PANEL_HTML);
        let users = Infobox::find(&page).unwrap().row("users").unwrap();
        assert_eq!(users.item_links(), vec!["Naruto Uzumaki", "Jiraiya", "Unnamed ninja"]);
        assert_eq!(users.links(), vec!["Naruto Uzumaki", "Jiraiya"]);
        assert_eq!(users.items(), vec!["Naruto Uzumaki", "Jiraiya", "Unnamed ninja"]);
    }

    #[test]
    fn scalar_falls_back_to_single_item() {
        let page = Page::parse(PANEL_HTML);
        let age = Infobox::find(&page).unwrap().row("age").unwrap();
        assert_eq!(age.items_or_text(), vec!["12"]);
    }

    #[test]
    fn images_prefer_full_size_links() {
        let page = Page::parse(
            r#"<aside class="portable-infobox"><figure class="pi-item pi-image" data-source="image">
               <a href="https://static.example/naruto.png" class="image"><img src="data:image/gif;base64,x" data-src="https://static.example/naruto-thumb.png"></a>
               </figure></aside>"#,
        );
        let ib = Infobox::find(&page).unwrap();
        assert_eq!(ib.images(), vec!["https://static.example/naruto.png"]);
    }
}
