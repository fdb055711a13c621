//! Embed locator: the first usable `<iframe>`/`<frame>` source of a page.

use scraper::{Html, Selector};

use crate::url_model::{normalize, NormalizedUrl};

const FRAME_SELECTOR: &str = "iframe[src], frame[src]";

/// The embedded player frame a landing page points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReference {
    pub source_url: NormalizedUrl,
}

/// Returns the first frame-like element (document order) whose `src`
/// normalizes to a usable URL, or `None` when the page has none.
///
/// Only the first usable embed is returned; later ones (often tracking or ad
/// frames) are ignored.
pub fn locate_embed(html: &str) -> Option<EmbedReference> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(FRAME_SELECTOR).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .find_map(normalize)
        .map(|source_url| EmbedReference { source_url })
}
