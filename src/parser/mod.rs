pub mod extract;
pub mod infobox;
pub mod listing;
pub mod page;
pub mod sections;

use crate::db::ScrapedPage;
use crate::error::ParseError;
use crate::records::Record;

/// Two-phase pipeline: structured fields from the intact page, then the summary from a sanitized one.
pub fn process_page(page: &ScrapedPage) -> Result<Record, ParseError> {
    extract::assemble(page.kind, &page.name, &page.html)
}
