//! Line-item parsing from raw extraction output.

pub mod amounts;
pub mod metadata;
pub mod patterns;
pub mod spreadsheet;
pub mod text;

pub use amounts::{coerce_quantity, parse_amount};
pub use metadata::{extract_metadata, InvoiceMetadata};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extract::RawDocument;

/// A candidate invoice line, exactly as found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub name: String,
    pub brand: Option<String>,
    pub quantity: Option<String>,
    pub cost_price: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<String>,
}

/// Result of parsing one document.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Candidate lines in document/pattern order.
    pub items: Vec<ExtractedItem>,
    /// Header fields found in the text.
    pub metadata: InvoiceMetadata,
}

/// Turns raw pages or rows into candidate line items.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineItemParser;

impl LineItemParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw document. Finding nothing is not an error.
    pub fn parse(&self, document: &RawDocument) -> ParsedDocument {
        let text = document.joined_text();
        let items = match document {
            RawDocument::Text { .. } => text::parse_text(&text),
            RawDocument::Table { rows } => spreadsheet::parse_rows(rows),
        };

        info!("Parsed {} candidate line items", items.len());

        ParsedDocument {
            items,
            metadata: extract_metadata(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_text_document() {
        let doc = RawDocument::Text {
            pages: vec!["Invoice No: 88\nDate: 2025-02-01\n2 x Amoxicillin (AmoxiPlus) $8.50".to_string()],
        };
        let parsed = LineItemParser::new().parse(&doc);

        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].name, "Amoxicillin");
        assert_eq!(parsed.metadata.invoice_number.as_deref(), Some("88"));
        assert_eq!(parsed.metadata.invoice_date, NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn test_parse_table_document() {
        let doc = RawDocument::Table {
            rows: vec![
                vec!["Item".into(), "Qty".into(), "Price".into()],
                vec!["Paracetamol".into(), "10".into(), "3.50".into()],
            ],
        };
        let parsed = LineItemParser::new().parse(&doc);

        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].quantity.as_deref(), Some("10"));
        assert_eq!(parsed.metadata, InvoiceMetadata::default());
    }
}
