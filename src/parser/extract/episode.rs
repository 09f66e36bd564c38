use crate::error::ParseError;
use crate::parser::infobox;
use crate::parser::page::Page;
use crate::parser::sections::{self, BEHIND_THE_SCENES, SYNOPSIS, TRIVIA};
use crate::records::Episode;

pub fn assemble(name: &str, markup: &str) -> Result<Episode, ParseError> {
    let page = Page::try_parse(markup)?;
    Ok(extract_structured(name, &page))
}

pub fn extract_structured(name: &str, page: &Page) -> Episode {
    Episode {
        name: name.to_string(),
        number: infobox::scalar(page, "episode"),
        synopsis: sections::section_text(page, SYNOPSIS),
        trivia: sections::section_list(page, TRIVIA),
        behind_the_scenes: sections::section_text(page, BEHIND_THE_SCENES),
        arc: infobox::scalar(page, "arc"),
        japanese_air_date: infobox::scalar(page, "japanese airdate"),
        english_air_date: infobox::scalar(page, "english airdate"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/episode_homecoming.html").unwrap()
    }

    #[test]
    fn homecoming() {
        let ep = assemble("Homecoming", &fixture()).unwrap();
        assert_eq!(ep.name, "Homecoming");
        assert_eq!(ep.number, "1");
        assert_eq!(ep.arc, "Kazekage Rescue Mission");
        assert_eq!(ep.japanese_air_date, "February 15, 2007");
        assert_eq!(ep.english_air_date, "October 28, 2009");
        assert_eq!(
            ep.synopsis,
            "Naruto returns to Konoha after two and a half years of training with Jiraiya.\nHe meets Sakura & Kakashi again."
        );
        assert_eq!(
            ep.trivia,
            vec![
                "This is the first episode of Naruto: Shippūden.",
                "The opening theme is \"Hero's Come Back!!\"."
            ]
        );
        assert_eq!(ep.behind_the_scenes, "The episode was previewed at Jump Festa 2007.");
    }

    #[test]
    fn bare_page_has_only_name() {
        let ep = assemble("Filler", "<html><body><p>Nothing here.</p></body></html>").unwrap();
        assert_eq!(
            ep,
            Episode {
                name: "Filler".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn plot_heading_fills_synopsis() {
        let html = r#"<div class="mw-parser-output"><h2><span class="mw-headline" id="Plot">Plot</span></h2>
            <p>Gaara is captured.</p><h2><span id="Trivia">Trivia</span></h2></div>"#;
        let ep = assemble("The Kazekage Stands Tall", html).unwrap();
        assert_eq!(ep.synopsis, "Gaara is captured.");
        assert!(ep.trivia.is_empty());
    }
}
