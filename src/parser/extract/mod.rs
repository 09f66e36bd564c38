pub mod character;
pub mod clan;
pub mod episode;
pub mod jutsu;

use std::sync::LazyLock;

use scraper::Selector;

use super::page::{self, sel, Page};
use crate::error::ParseError;
use crate::records::{Kind, Record};

/// Nodes stripped before the free-text summary is read.
static CLUTTER: LazyLock<Selector> = LazyLock::new(|| {
    sel("ul, ol, img, figure, table, aside, .portable-infobox, .toc, #toc")
});
static CONTENT: LazyLock<Selector> = LazyLock::new(|| sel(".mw-parser-output"));

/// Assemble a record of `kind` for `name` from raw page markup.
pub fn assemble(kind: Kind, name: &str, markup: &str) -> Result<Record, ParseError> {
    Ok(match kind {
        Kind::Character => Record::Character(character::assemble(name, markup)?),
        Kind::Jutsu => Record::Jutsu(jutsu::assemble(name, markup)?),
        Kind::Clan => Record::Clan(clan::assemble(name, markup)?),
        Kind::Episode => Record::Episode(episode::assemble(name, markup)?),
    })
}

/// Second phase of assembly. Consumes the page: structured fields must already be read.
pub fn extract_summary(page: Page) -> String {
    summary(&sanitize(page))
}

pub fn sanitize(mut page: Page) -> Page {
    page.remove_all(&CLUTTER);
    page
}

/// Text of the first non-empty element in the main content region.
pub fn summary(page: &Page) -> String {
    let Some(content) = page.select_first(&CONTENT) else {
        return String::new();
    };
    content
        .children()
        .filter_map(scraper::ElementRef::wrap)
        .map(page::text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_skips_infobox_lists_and_toc() {
        let page = Page::parse(
            r#"<div class="mw-parser-output">
                 <aside class="portable-infobox"><div data-source="jutsu rank"><div>A-rank</div></div></aside>
                 <div id="toc" class="toc"><ul><li>1 Overview</li></ul></div>
                 <ul><li>stray list</li></ul>
                 <p>The <b>Rasengan</b> is a spinning ball of chakra.</p>
                 <p>Second paragraph.</p>
               </div>"#,
        );
        assert_eq!(
            extract_summary(page),
            "The Rasengan is a spinning ball of chakra."
        );
    }

    #[test]
    fn summary_without_content_region_is_empty() {
        let page = Page::parse("<p>Loose paragraph</p>");
        assert_eq!(extract_summary(page), "");
    }

    #[test]
    fn dispatch_keeps_requested_name() {
        let record = assemble(Kind::Clan, "Uchiha Clan", "<h1>Uchiha</h1>").unwrap();
        assert_eq!(record.kind(), Kind::Clan);
        assert_eq!(record.name(), "Uchiha Clan");
        assert_eq!(assemble(Kind::Jutsu, "x", " ").err(), Some(ParseError::EmptyDocument));
    }
}
