use crate::error::ParseError;
use crate::parser::infobox::{Infobox, Row};
use crate::parser::page::Page;
use crate::records::{Character, PersonalInfo};

type Setter = fn(&mut PersonalInfo, Row<'_>);

/// Infobox keys feeding `personalInfo`, spelled as the wiki tags them.
pub const PERSONAL_ROWS: &[(&str, Setter)] = &[
    ("birthdate", |p, row| p.birthdate = row.text()),
    ("sex", |p, row| p.sex = row.text()),
    ("age", |p, row| p.age = row.items_or_text()),
    ("height", |p, row| p.height = row.items_or_text()),
    ("weight", |p, row| p.weight = row.items_or_text()),
    ("affiliation", |p, row| p.affiliation = row.item_links_or_text()),
    ("status", |p, row| p.status = row.text()),
    ("clan", |p, row| p.clan = row.item_links_or_text()),
    ("team", |p, row| p.team = row.item_links_or_text()),
    ("kekkei genkai", |p, row| p.kekkei_genkai = row.item_links_or_text()),
    ("ninja rank", |p, row| p.ninja_rank = row.items_or_text()),
    ("nature type", |p, row| p.nature_type = row.item_links_or_text()),
    ("classification", |p, row| p.classification = row.item_links_or_text()),
];

pub fn assemble(name: &str, markup: &str) -> Result<Character, ParseError> {
    let page = Page::try_parse(markup)?;
    let mut character = extract_structured(name, &page);
    character.summary = super::extract_summary(page);
    Ok(character)
}

pub fn extract_structured(name: &str, page: &Page) -> Character {
    let mut character = Character {
        name: name.to_string(),
        ..Default::default()
    };
    let Some(infobox) = Infobox::find(page) else {
        return character;
    };
    character.images = infobox.images();
    character.jutsu = infobox.row("jutsu").map(|r| r.item_links()).unwrap_or_default();
    for (key, set) in PERSONAL_ROWS {
        if let Some(row) = infobox.row(key) {
            set(&mut character.personal_info, row);
        }
    }
    character
}
