//! Regex patterns for invoice line items and header metadata.
//!
//! Every pattern uses `[ \t]` instead of `\s` so that no match spans a line.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "2 x Amoxicillin (AmoxiPlus) $8.50", "2x ...", "2×...", quantity at line start.
    // A letter x needs a following blank so "2 Xylometazoline" keeps its X.
    pub static ref QUANTITY_NAME_PRICE: Regex = Regex::new(
        r"(?m)^[ \t]*(\d+)(?:[ \t]*[xX][ \t]+|[ \t]*×[ \t]*|[ \t]+)([A-Za-z][A-Za-z0-9 ()./+-]*?)[ \t]+\$?(\d[\d,]*\.\d{2})\b"
    ).unwrap();

    // "Paracetamol 500mg 10 tabs 3.50"
    pub static ref NAME_UNITS_PRICE: Regex = Regex::new(
        r"(?i)\b([A-Za-z][A-Za-z0-9 ()./+-]*?)[ \t]+(\d+)[ \t]*(?:tablets?|tabs?|capsules?|caps?|pcs|pc|units?|box(?:es)?|packs?|bottles?|strips?|vials?|amps?|sachets?)\b[ \t]+\$?(\d[\d,]*\.\d{2})\b"
    ).unwrap();

    // "Amoxicillin 500mg 8.50"
    pub static ref NAME_STRENGTH_PRICE: Regex = Regex::new(
        r"(?i)\b([A-Za-z][A-Za-z0-9 ()./+-]*?)[ \t]+(\d+(?:\.\d+)?[ \t]*(?:mcg|mg|ml|iu|g|%))[ \t]+\$?(\d[\d,]*\.\d{2})\b"
    ).unwrap();

    // Parenthesized brand inside a candidate name
    pub static ref BRAND_IN_NAME: Regex = Regex::new(r"\(([^)]+)\)").unwrap();

    pub static ref MULTI_SPACE: Regex = Regex::new(r"[ \t]{2,}").unwrap();

    // Invoice header fields
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?im)\binvoice[ \t]*(?:number|no\.?|#)[ \t]*[:#]?[ \t]*([A-Za-z0-9][A-Za-z0-9/_-]*)"
    ).unwrap();

    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?im)\bdate[ \t]*:?[ \t]*([^\n]+)"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{4})\b"
    ).unwrap();

    pub static ref DATE_LONG: Regex = Regex::new(
        r"(?i)\b(\d{1,2})[ \t]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[ \t]+(\d{4})\b"
    ).unwrap();
}

/// Line-item patterns in the order they are applied.
pub fn line_item_patterns() -> [&'static Regex; 3] {
    [&QUANTITY_NAME_PRICE, &NAME_UNITS_PRICE, &NAME_STRENGTH_PRICE]
}
