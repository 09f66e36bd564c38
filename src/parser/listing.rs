use std::sync::LazyLock;

use scraper::Selector;

use super::page::{self, sel, Page};

static TABLE_ROWS: LazyLock<Selector> = LazyLock::new(|| sel("table.coloured.bordered tr"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a"));
static COLUMN_ITEMS: LazyLock<Selector> = LazyLock::new(|| sel(".smw-columnlist-container li"));

/// How a category page lays out its entity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Anchors inside the rows of coloured/bordered tables.
    TableLinks,
    /// Items of a semantic-browse column list.
    ColumnList,
}

/// Names on a listing page in document order. Repeats are kept.
pub fn extract_names(markup: &str, strategy: Strategy) -> Vec<String> {
    let page = Page::parse(markup);
    match strategy {
        Strategy::TableLinks => table_links(&page),
        Strategy::ColumnList => column_list(&page),
    }
}

pub fn table_links(page: &Page) -> Vec<String> {
    page.select_all(&TABLE_ROWS)
        .flat_map(|row| row.select(&LINK).map(page::text).collect::<Vec<_>>())
        .filter(|name| !name.is_empty())
        .collect()
}

pub fn column_list(page: &Page) -> Vec<String> {
    page.select_all(&COLUMN_ITEMS)
        .map(page::text)
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_tables_in_document_order() {
        let html = r#"
            <table class="table coloured bordered innerbordered">
              <tr><th>#</th><th>Title</th></tr>
              <tr><td>1</td><td><a href="/wiki/Homecoming">Homecoming</a></td></tr>
              <tr><td>2</td><td><a href="/wiki/The_Akatsuki_Makes_Its_Move">The Akatsuki Makes Its Move</a></td></tr>
            </table>
            <table class="wikitable"><tr><td><a href="/wiki/Ignored">Ignored</a></td></tr></table>
            <table class="table coloured bordered innerbordered">
              <tr><td>3</td><td><a href="/wiki/The_Results_of_Training"> The Results of Training </a><a href="/wiki/File:x.png"><img src="x.png"></a></td></tr>
            </table>"#;
        assert_eq!(
            extract_names(html, Strategy::TableLinks),
            vec![
                "Homecoming",
                "The Akatsuki Makes Its Move",
                "The Results of Training"
            ]
        );
    }

    #[test]
    fn column_list_keeps_repeats() {
        let html = r#"
            <div class="smw-columnlist-container">
              <div class="smw-column"><ul><li><a>Rasengan</a></li><li>Chidori</li></ul></div>
              <div class="smw-column"><ul><li>Rasengan</li></ul></div>
            </div>"#;
        assert_eq!(
            extract_names(html, Strategy::ColumnList),
            vec!["Rasengan", "Chidori", "Rasengan"]
        );
    }

    #[test]
    fn empty_category_yields_nothing() {
        let placeholder = "<html><body><p>There are no results.</p></body></html>";
        assert!(extract_names(placeholder, Strategy::ColumnList).is_empty());
        assert!(extract_names(placeholder, Strategy::TableLinks).is_empty());
        assert!(extract_names("", Strategy::TableLinks).is_empty());
    }
}
