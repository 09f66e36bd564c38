use crate::error::ParseError;
use crate::parser::infobox::{Infobox, Row};
use crate::parser::page::Page;
use crate::records::Clan;

type Setter = fn(&mut Clan, Row<'_>);

pub const ROWS: &[(&str, Setter)] = &[
    ("affiliation", |c, row| c.affiliation = row.item_links_or_text()),
    ("kekkei genkai", |c, row| c.kekkei_genkai = row.item_links_or_text()),
    ("classification", |c, row| c.classification = row.item_links_or_text()),
    ("jutsu", |c, row| c.jutsu = row.item_links()),
    ("tools", |c, row| c.tools = row.item_links()),
    ("members", |c, row| c.members = row.item_links()),
];

pub fn assemble(name: &str, markup: &str) -> Result<Clan, ParseError> {
    let page = Page::try_parse(markup)?;
    let mut clan = extract_structured(name, &page);
    clan.summary = super::extract_summary(page);
    Ok(clan)
}

pub fn extract_structured(name: &str, page: &Page) -> Clan {
    let mut clan = Clan {
        name: name.to_string(),
        ..Default::default()
    };
    let Some(infobox) = Infobox::find(page) else {
        return clan;
    };
    clan.images = infobox.images();
    for (key, set) in ROWS {
        if let Some(row) = infobox.row(key) {
            set(&mut clan, row);
        }
    }
    clan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uchiha() {
        let html = std::fs::read_to_string("tests/fixtures/clan_uchiha.html").unwrap();
        let clan = assemble("Uchiha Clan", &html).unwrap();
        assert_eq!(clan.name, "Uchiha Clan");
        assert_eq!(clan.affiliation, vec!["Konohagakure"]);
        assert_eq!(clan.kekkei_genkai, vec!["Sharingan", "Mangekyō Sharingan"]);
        assert_eq!(clan.jutsu, vec!["Fire Release: Great Fireball Technique", "Izanagi"]);
        assert_eq!(clan.members, vec!["Itachi Uchiha", "Sasuke Uchiha", "Madara Uchiha"]);
        assert!(clan.tools.is_empty());
        assert!(clan.classification.is_empty());
        assert_eq!(clan.images.len(), 1);
        assert_eq!(
            clan.summary,
            "The Uchiha clan was one of the four noble clans of Konohagakure."
        );
    }

    #[test]
    fn summary_read_after_structured_fields() {
        // The infobox is stripped during cleanup, so rows must be read first.
        let html = r#"<div class="mw-parser-output"><aside class="portable-infobox">
            <div data-source="members"><div class="pi-data-value"><ul><li><a>Hashirama Senju</a></li></ul></div></div>
            </aside><p>The Senju clan.</p></div>"#;
        let clan = assemble("Senju Clan", html).unwrap();
        assert_eq!(clan.members, vec!["Hashirama Senju"]);
        assert_eq!(clan.summary, "The Senju clan.");
    }
}
