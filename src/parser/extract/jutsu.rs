use crate::error::ParseError;
use crate::parser::infobox::{Infobox, Row};
use crate::parser::page::Page;
use crate::records::Jutsu;

type Setter = fn(&mut Jutsu, Row<'_>);

/// Infobox `data-source` key → field setter. Keys not listed are ignored.
pub const ROWS: &[(&str, Setter)] = &[
    ("jutsu rank", |j, row| j.rank = row.text()),
    ("jutsu type", |j, row| j.nature = row.items()),
    ("jutsu classification", |j, row| j.classification = row.split(", ")),
    ("hand signs", |j, row| j.handsigns = row.text()),
    // Derived techniques are read from "derived jutsu", not the "jutsu media" row.
    ("derived jutsu", |j, row| j.derived_jutsu = row.item_links()),
    ("parent jutsu", |j, row| j.parent_jutsu = row.item_links()),
    ("users", |j, row| j.users = row.item_links()),
    ("related jutsu", |j, row| j.related_jutsu = row.links()),
];

pub fn assemble(name: &str, markup: &str) -> Result<Jutsu, ParseError> {
    let page = Page::try_parse(markup)?;
    let mut jutsu = extract_structured(name, &page);
    jutsu.summary = super::extract_summary(page);
    Ok(jutsu)
}

/// Every field except the summary. Missing rows keep their defaults.
pub fn extract_structured(name: &str, page: &Page) -> Jutsu {
    let mut jutsu = Jutsu {
        name: name.to_string(),
        ..Default::default()
    };
    let Some(infobox) = Infobox::find(page) else {
        return jutsu;
    };
    for (key, set) in ROWS {
        if let Some(row) = infobox.row(key) {
            set(&mut jutsu, row);
        }
    }
    jutsu
}
