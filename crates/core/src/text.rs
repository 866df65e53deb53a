//! Plain-text extraction from platform-supplied HTML.

use scraper::Html;

/// Strips every tag from an HTML fragment and keeps only its text nodes.
///
/// Entities are decoded; everything else (including LaTeX such as `\frac{1}{2}`)
/// comes through byte-for-byte.
#[must_use]
pub fn strip_markup(html: &str) -> String {
    if !html.contains(['<', '&']) {
        return html.to_string();
    }
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}
