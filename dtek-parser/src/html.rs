//! HTML helpers for the directory page.

use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Selector for the anti-forgery token tag.
static CSRF_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="csrf-token"]"#).expect("valid csrf selector")
});

/// Selector for script blocks.
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));

/// Resource paths that only appear on bot-challenge interstitials.
pub const BOT_MARKERS: &[&str] = &[
    "/_Incapsula_Resource",
    "_Incapsula_Resource?",
    "/cdn-cgi/challenge-platform/",
];

/// Returns the anti-forgery token, if the page carries a non-empty one.
///
/// The value is returned byte-exact; only an all-whitespace value counts as
/// absent.
pub fn csrf_token(document: &Html) -> Option<String> {
    document
        .select(&CSRF_SELECTOR)
        .filter_map(|el| el.value().attr("content"))
        .find(|content| !content.trim().is_empty())
        .map(str::to_string)
}

/// Returns true if the raw page is a bot-protection interstitial.
pub fn is_bot_interstitial(raw: &str) -> bool {
    BOT_MARKERS.iter().any(|marker| raw.contains(marker))
}

/// Returns the text of every inline script block, in document order.
///
/// Blocks with a `src` attribute are external and skipped.
pub fn inline_scripts(document: &Html) -> Vec<String> {
    document
        .select(&SCRIPT_SELECTOR)
        .filter(|el| el.value().attr("src").is_none())
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
