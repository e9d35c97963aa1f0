//! Supplier invoice, line item and catalog records handled by the intake pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of uploaded document, which selects the extraction adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    /// PDF document (scanned or text).
    Pdf,
    /// Photo or scan of an invoice.
    Image,
    /// Workbook or CSV export.
    Spreadsheet,
}

impl FileKind {
    /// Detect the file kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "bmp" => Some(Self::Image),
            "xlsx" | "xlsm" | "xls" | "ods" | "csv" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Stored code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "IMAGE",
            Self::Spreadsheet => "SPREADSHEET",
        }
    }

    /// Parse a stored code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PDF" => Some(Self::Pdf),
            "IMAGE" => Some(Self::Image),
            "SPREADSHEET" | "EXCEL" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an uploaded invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    PartiallyProcessed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::PartiallyProcessed => "PARTIALLY_PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "PARTIALLY_PROCESSED" => Some(Self::PartiallyProcessed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal state and operator note for a finished run.
    pub fn classify(found: u32, matched: u32) -> (Self, String) {
        if found == 0 {
            (
                Self::Failed,
                "No items could be extracted from the invoice".to_string(),
            )
        } else if matched == 0 {
            (
                Self::Failed,
                format!("Extracted {} items but none matched the drug catalog", found),
            )
        } else if matched < found {
            (
                Self::PartiallyProcessed,
                format!("Matched {} of {} items", matched, found),
            )
        } else {
            (Self::Completed, format!("All {} items matched", found))
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match classification of an extracted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    PartialMatch,
    Unmatched,
    /// Set by an operator from the review screen.
    ManuallyMatched,
    /// Set by an operator; never imported.
    Ignored,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::PartialMatch => "PARTIAL_MATCH",
            Self::Unmatched => "UNMATCHED",
            Self::ManuallyMatched => "MANUALLY_MATCHED",
            Self::Ignored => "IGNORED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MATCHED" => Some(Self::Matched),
            "PARTIAL_MATCH" => Some(Self::PartialMatch),
            "UNMATCHED" => Some(Self::Unmatched),
            "MANUALLY_MATCHED" => Some(Self::ManuallyMatched),
            "IGNORED" => Some(Self::Ignored),
            _ => None,
        }
    }

    /// Whether items in this state are picked up by the import stage.
    pub fn is_importable(&self) -> bool {
        matches!(self, Self::Matched | Self::ManuallyMatched)
    }

    /// Whether the state was set by an operator and is left alone by the matcher.
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::ManuallyMatched | Self::Ignored)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vendor that sends invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_active: bool,
}

/// Fields for registering a supplier.
#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// One uploaded supplier invoice document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceUpload {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,
    pub file_path: PathBuf,
    pub file_kind: FileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub processing_status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_notes: Option<String>,
    pub total_items_found: u32,
    pub total_items_matched: u32,
}

impl InvoiceUpload {
    /// Reference string written to inventory logs for stock taken from this invoice.
    pub fn reference(&self) -> String {
        match &self.invoice_number {
            Some(number) => format!("Supplier Invoice #{}", number),
            None => format!("Supplier Invoice upload {}", self.id),
        }
    }
}

/// Fields for registering an upload.
#[derive(Debug, Clone)]
pub struct NewInvoiceUpload {
    pub supplier_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub file_path: PathBuf,
    pub file_kind: FileKind,
    pub uploaded_by: Option<String>,
}

/// A candidate line extracted from an invoice, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub extracted_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_cost_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_batch_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_expiry_date: Option<String>,
    /// Normalized quantity, filled on a successful match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Normalized unit cost, filled on a successful match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
    pub match_status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_drug_id: Option<i64>,
    /// Similarity score 0-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_notes: Option<String>,
    pub is_imported: bool,
}

/// A sanitized line ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoiceItem {
    pub name: String,
    pub brand: Option<String>,
    pub quantity: String,
    pub cost_price: String,
    pub batch_number: Option<String>,
    pub expiry_date: Option<String>,
}

/// A catalog drug with its stock position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drug {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub stock_quantity: i64,
    pub cost_price: Decimal,
    pub is_active: bool,
}

/// Fields for adding a drug to the catalog.
#[derive(Debug, Clone)]
pub struct NewDrug {
    pub name: String,
    pub brand: Option<String>,
    pub stock_quantity: i64,
    pub cost_price: Decimal,
}

/// Matcher view of a catalog drug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: i64, name: impl Into<String>, brand: Option<&str>) -> Self {
        Self {
            id,
            name: name.into(),
            brand: brand.map(str::to_string),
        }
    }
}

/// Kind of stock movement recorded in the inventory log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryOperation {
    Add,
    Remove,
    Adjust,
    Sale,
    Return,
}

impl InventoryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Adjust => "ADJUST",
            Self::Sale => "SALE",
            Self::Return => "RETURN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADD" => Some(Self::Add),
            "REMOVE" => Some(Self::Remove),
            "ADJUST" => Some(Self::Adjust),
            "SALE" => Some(Self::Sale),
            "RETURN" => Some(Self::Return),
            _ => None,
        }
    }
}

/// Append-only audit record of a stock change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLog {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug_id: Option<i64>,
    pub quantity_change: i64,
    pub operation: InventoryOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("inv.PDF")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("scan.jpeg")), Some(FileKind::Image));
        assert_eq!(FileKind::from_path(Path::new("stock.xlsx")), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_path(Path::new("stock.csv")), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::PartiallyProcessed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(ProcessingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MatchStatus::parse("MANUALLY_MATCHED"), Some(MatchStatus::ManuallyMatched));
        assert_eq!(MatchStatus::parse("bogus"), None);
    }

    #[test]
    fn test_classify_outcomes() {
        assert_eq!(ProcessingStatus::classify(0, 0).0, ProcessingStatus::Failed);
        assert_eq!(ProcessingStatus::classify(4, 0).0, ProcessingStatus::Failed);
        let (status, note) = ProcessingStatus::classify(5, 3);
        assert_eq!(status, ProcessingStatus::PartiallyProcessed);
        assert!(note.contains("3 of 5"));
        assert_eq!(ProcessingStatus::classify(2, 2).0, ProcessingStatus::Completed);
    }

    #[test]
    fn test_importable_states() {
        assert!(MatchStatus::Matched.is_importable());
        assert!(MatchStatus::ManuallyMatched.is_importable());
        assert!(!MatchStatus::PartialMatch.is_importable());
        assert!(!MatchStatus::Ignored.is_importable());
    }

    #[test]
    fn test_reference_prefers_invoice_number() {
        let mut upload = InvoiceUpload {
            id: 7,
            supplier_id: None,
            invoice_number: Some("SUP-991".to_string()),
            invoice_date: None,
            file_path: PathBuf::from("a.pdf"),
            file_kind: FileKind::Pdf,
            uploaded_by: None,
            upload_date: Utc::now(),
            processing_status: ProcessingStatus::Pending,
            processing_notes: None,
            total_items_found: 0,
            total_items_matched: 0,
        };
        assert_eq!(upload.reference(), "Supplier Invoice #SUP-991");
        upload.invoice_number = None;
        assert_eq!(upload.reference(), "Supplier Invoice upload 7");
    }
}
