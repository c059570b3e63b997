//! HTML → visible text rendering.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
}

/// Tags whose text never shows on screen.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Visible text of an HTML document, one space between text nodes.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        if !hidden {
            parts.push(text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

/// Collapse runs of whitespace (including NBSP) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE
        .replace_all(&text.replace('\u{a0}', " "), " ")
        .trim()
        .to_string()
}
