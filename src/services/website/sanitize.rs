use scraper::Html;

pub const MAX_TEXT_LEN: usize = 500;

/// Reduces possibly-HTML text to plain text: markup is dropped, runs of
/// whitespace become one space, and the result is capped at 500 characters.
pub fn sanitize_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(text);
    let plain: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");

    plain
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_TEXT_LEN)
        .collect()
}
