//! Line items from spreadsheet rows, with header and column inference.

use rust_decimal::Decimal;
use tracing::debug;

use super::amounts::parse_amount;
use super::ExtractedItem;

/// Rows scanned for a header.
const HEADER_SCAN_ROWS: usize = 10;

const NAME_HEADERS: &[&str] = &["item", "description", "product", "name", "drug name"];
const QUANTITY_HEADERS: &[&str] = &["qty", "quantity", "amount"];
const PRICE_HEADERS: &[&str] = &["price", "unit price", "cost", "cost price"];
const BRAND_HEADERS: &[&str] = &["brand", "manufacturer"];

/// Rows whose name contains one of these are summaries or repeated headers.
const SKIP_NAME_WORDS: &[&str] = &["total", "subtotal", "item", "product", "description"];

/// Column positions used to read line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: Option<usize>,
    pub quantity: Option<usize>,
    pub price: Option<usize>,
    pub brand: Option<usize>,
}

impl ColumnMap {
    fn categories(&self) -> usize {
        [self.name, self.quantity, self.price, self.brand]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    fn with_defaults(self) -> ResolvedColumns {
        ResolvedColumns {
            name: self.name.unwrap_or(0),
            quantity: self.quantity.unwrap_or(1),
            price: self.price.unwrap_or(2),
            brand: self.brand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedColumns {
    name: usize,
    quantity: usize,
    price: usize,
    brand: Option<usize>,
}

/// Parse spreadsheet rows into line items.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<ExtractedItem> {
    let (start, columns) = match detect_header(rows) {
        Some((index, map)) => {
            debug!("Header found at row {}: {:?}", index, map);
            (index + 1, map)
        }
        None => {
            let map = sniff_columns(rows);
            debug!("No header row, sniffed columns {:?}", map);
            (0, map)
        }
    };
    let columns = columns.with_defaults();

    rows.iter()
        .skip(start)
        .filter_map(|row| item_from_row(row, &columns))
        .collect()
}

/// Find the first row (within the scan window) naming at least two column kinds.
///
/// Rows whose cells read as column titles win over rows that only mention a
/// header word, such as letterhead lines like "Supplier Name: X".
pub fn detect_header(rows: &[Vec<String>]) -> Option<(usize, ColumnMap)> {
    [HeaderMatch::Word, HeaderMatch::Substring]
        .into_iter()
        .find_map(|min| {
            rows.iter()
                .take(HEADER_SCAN_ROWS)
                .enumerate()
                .map(|(index, row)| (index, header_columns(row, min)))
                .find(|(_, map)| map.categories() >= 2)
        })
}

/// How closely a cell matches a header vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HeaderMatch {
    /// A vocabulary entry appears somewhere inside the cell.
    Substring,
    /// A vocabulary entry appears as whole words, and at least half the cell
    /// is header words.
    Word,
    /// The cell is made only of header words.
    Cell,
}

fn header_columns(row: &[String], min: HeaderMatch) -> ColumnMap {
    let cells: Vec<String> = row.iter().map(|c| c.trim().to_lowercase()).collect();
    let mut claimed = vec![false; cells.len()];

    let mut pick = |vocab: &[&str]| {
        let mut best: Option<(usize, HeaderMatch)> = None;
        for (col, cell) in cells.iter().enumerate() {
            if claimed[col] {
                continue;
            }
            let Some(level) = header_match(cell, vocab).filter(|level| *level >= min) else {
                continue;
            };
            if best.is_none_or(|(_, best_level)| level > best_level) {
                best = Some((col, level));
            }
        }
        let col = best.map(|(col, _)| col);
        if let Some(col) = col {
            claimed[col] = true;
        }
        col
    };

    // Brand before name so "Brand Name" is not taken as the item name
    let brand = pick(BRAND_HEADERS);
    let price = pick(PRICE_HEADERS);
    let quantity = pick(QUANTITY_HEADERS);
    let name = pick(NAME_HEADERS);

    ColumnMap {
        name,
        quantity,
        price,
        brand,
    }
}

fn header_match(cell: &str, vocab: &[&str]) -> Option<HeaderMatch> {
    let tokens = words(cell);
    if tokens.is_empty() {
        return None;
    }

    let whole_word = vocab.iter().any(|entry| {
        let entry = words(entry);
        tokens.windows(entry.len()).any(|window| window == entry.as_slice())
    });
    if !whole_word {
        return vocab
            .iter()
            .any(|entry| cell.contains(entry))
            .then_some(HeaderMatch::Substring);
    }

    let known = tokens.iter().filter(|token| is_header_word(token)).count();
    Some(if known == tokens.len() {
        HeaderMatch::Cell
    } else if known * 2 >= tokens.len() {
        HeaderMatch::Word
    } else {
        HeaderMatch::Substring
    })
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

fn is_header_word(token: &str) -> bool {
    [NAME_HEADERS, QUANTITY_HEADERS, PRICE_HEADERS, BRAND_HEADERS]
        .iter()
        .flat_map(|vocab| vocab.iter())
        .any(|entry| entry.split(' ').any(|word| word == token))
}

/// Guess columns from the cell types of the second row.
fn sniff_columns(rows: &[Vec<String>]) -> ColumnMap {
    let mut map = ColumnMap::default();
    let Some(sample) = rows.get(1) else {
        return map;
    };

    for (col, cell) in sample.iter().enumerate() {
        let cell = cell.trim();
        match parse_amount(cell) {
            Some(value) => {
                let small_whole = value.fract().is_zero()
                    && value > Decimal::ZERO
                    && value < Decimal::from(1000);
                if small_whole && map.quantity.is_none() {
                    map.quantity = Some(col);
                } else if !small_whole && map.price.is_none() {
                    map.price = Some(col);
                }
            }
            None => {
                if cell.chars().count() > 3 && map.name.is_none() {
                    map.name = Some(col);
                }
            }
        }
    }

    map
}

fn item_from_row(row: &[String], columns: &ResolvedColumns) -> Option<ExtractedItem> {
    let cell = |index: usize| row.get(index).map(|c| c.trim()).unwrap_or("");

    let name = cell(columns.name);
    if name.is_empty() {
        return None;
    }
    let lowered = name.to_lowercase();
    if SKIP_NAME_WORDS.iter().any(|word| lowered.contains(word)) {
        return None;
    }

    let price = cell(columns.price);
    if price.is_empty() {
        return None;
    }

    let quantity = match cell(columns.quantity) {
        "" => "1",
        q => q,
    };

    let brand = columns
        .brand
        .map(cell)
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    Some(ExtractedItem {
        name: name.to_string(),
        brand,
        quantity: Some(quantity.to_string()),
        cost_price: Some(price.to_string()),
        ..Default::default()
    })
}
