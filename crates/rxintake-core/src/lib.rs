//! Core library for pharmacy supplier invoice intake.
//!
//! This crate provides:
//! - Document extraction from PDFs, scanned images (OCR) and spreadsheets
//! - Line-item parsing from OCR text and tabular rows
//! - Fuzzy matching of extracted items against the drug catalog
//! - SQLite persistence for uploads, items, stock and the inventory audit log
//! - Processing runs and idempotent import of matched items into stock

pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod ocr;
pub mod parse;
pub mod pdf;
pub mod pipeline;
pub mod sanitize;
pub mod store;

pub use error::{ExtractionError, IntakeError, Result, StoreError};
pub use extract::{DocumentExtractor, RawDocument};
pub use matcher::{CatalogMatcher, IndelRatio, MatchOutcome, SimilarityScorer};
pub use models::config::IntakeConfig;
pub use models::invoice::{
    CatalogEntry, Drug, FileKind, InventoryLog, InventoryOperation, InvoiceItem, InvoiceUpload,
    MatchStatus, NewDrug, NewInvoiceUpload, NewSupplier, ProcessingStatus, Supplier,
};
pub use ocr::{OcrResult, TextBox, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::create_engine;
pub use parse::{ExtractedItem, LineItemParser};
pub use pipeline::{ImportReconciler, ImportReport, InvoiceProcessor, ProcessingSummary};
pub use sanitize::FieldSanitizer;
pub use store::Database;
