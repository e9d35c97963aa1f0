//! Error types for the rxintake-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the rxintake library.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The invoice is already being processed by another run.
    #[error("invoice {0} is already being processed")]
    AlreadyProcessing(i64),

    /// No invoice upload with this id.
    #[error("invoice {0} not found")]
    InvoiceNotFound(i64),

    /// No invoice item with this id.
    #[error("invoice item {0} not found")]
    ItemNotFound(i64),

    /// No drug with this id.
    #[error("drug {0} not found")]
    DrugNotFound(i64),

    /// The item was already imported into inventory and cannot change.
    #[error("invoice item {0} is already imported")]
    ItemAlreadyImported(i64),

    /// The file extension does not map to a known file kind.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning a stored file into raw text or cells.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The stored file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Workbook or CSV decoding error.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// OCR is required for this document but no engine is configured.
    #[error("no OCR engine available")]
    OcrUnavailable,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection or recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised by the SQLite store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A column held a value that does not decode into the domain type.
    #[error("invalid value in column {column}: {value}")]
    InvalidColumn { column: String, value: String },

    /// A row referenced by a write no longer exists.
    #[error("no row {id} in {table}")]
    NotFound { table: &'static str, id: i64 },
}

/// Result type for the rxintake library.
pub type Result<T> = std::result::Result<T, IntakeError>;
