//! Line items from OCR or text-layer output.

use regex::Captures;
use tracing::debug;

use super::patterns::{line_item_patterns, BRAND_IN_NAME, MULTI_SPACE};
use super::ExtractedItem;

/// Run every line-item pattern over the whole text, in pattern order.
///
/// Overlapping matches from different patterns are all kept.
pub fn parse_text(text: &str) -> Vec<ExtractedItem> {
    let mut items = Vec::new();

    for (index, pattern) in line_item_patterns().iter().enumerate() {
        let before = items.len();
        items.extend(pattern.captures_iter(text).map(|caps| item_from_captures(&caps)));
        debug!("Pattern {} matched {} lines", index + 1, items.len() - before);
    }

    items
}

fn item_from_captures(caps: &Captures<'_>) -> ExtractedItem {
    let first = caps[1].trim();
    let second = caps[2].trim();
    let price = caps[3].trim().to_string();

    let (raw_name, quantity) = if first.chars().all(|c| c.is_ascii_digit()) {
        (second, first)
    } else {
        (first, second)
    };

    let (name, brand) = split_brand(raw_name);

    ExtractedItem {
        name,
        brand,
        quantity: Some(quantity.to_string()),
        cost_price: Some(price),
        ..Default::default()
    }
}

/// Pull a parenthesized brand out of a candidate name.
fn split_brand(raw: &str) -> (String, Option<String>) {
    let brand = BRAND_IN_NAME
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .filter(|b| !b.is_empty());

    let stripped = BRAND_IN_NAME.replace_all(raw, " ");
    let name = MULTI_SPACE.replace_all(stripped.trim(), " ").into_owned();

    (name, brand)
}
