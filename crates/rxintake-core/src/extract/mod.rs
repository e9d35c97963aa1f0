//! Turns a stored invoice file into raw text pages or rows of cells.

pub mod spreadsheet;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::PdfConfig;
use crate::models::invoice::FileKind;
use crate::ocr::TextRecognizer;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Raw extraction output, before any line-item parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDocument {
    /// Text per page (OCR output or embedded text layer).
    Text { pages: Vec<String> },
    /// Spreadsheet cells, row-major.
    Table { rows: Vec<Vec<String>> },
}

impl RawDocument {
    /// All pages joined into one blob, each preceded by a `--- Page N ---` line.
    ///
    /// Tables are rendered one row per line with tab-separated cells.
    pub fn joined_text(&self) -> String {
        match self {
            Self::Text { pages } => pages
                .iter()
                .enumerate()
                .map(|(i, text)| format!("--- Page {} ---\n{}", i + 1, text))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Table { rows } => rows
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Format adapter front-end for PDF, image and spreadsheet uploads.
pub struct DocumentExtractor<'a> {
    recognizer: Option<&'a dyn TextRecognizer>,
    pdf: PdfConfig,
}

impl<'a> DocumentExtractor<'a> {
    /// Create an extractor. Without a recognizer, images cannot be read and
    /// PDFs fall back to their embedded text layer.
    pub fn new(recognizer: Option<&'a dyn TextRecognizer>, pdf: PdfConfig) -> Self {
        Self { recognizer, pdf }
    }

    /// Extract a stored file according to its declared kind.
    pub fn extract(&self, path: &Path, kind: FileKind) -> Result<RawDocument, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::FileNotFound(path.to_path_buf()));
        }

        info!("Extracting {} as {}", path.display(), kind);

        match kind {
            FileKind::Pdf => self.extract_pdf(path),
            FileKind::Image => self.extract_image(path),
            FileKind::Spreadsheet => Ok(RawDocument::Table {
                rows: spreadsheet::read_rows(path)?,
            }),
        }
    }

    fn extract_image(&self, path: &Path) -> Result<RawDocument, ExtractionError> {
        let recognizer = self.recognizer.ok_or(ExtractionError::OcrUnavailable)?;
        let image = image::open(path)?;
        let text = recognizer.extract_text(&image)?;
        debug!("OCR produced {} characters", text.len());
        Ok(RawDocument::Text { pages: vec![text] })
    }

    fn extract_pdf(&self, path: &Path) -> Result<RawDocument, ExtractionError> {
        let data = std::fs::read(path)?;
        let mut pdf = PdfExtractor::new();
        pdf.load(&data)?;

        let total = pdf.page_count() as usize;
        let pages_to_process = if self.pdf.max_pages > 0 {
            total.min(self.pdf.max_pages)
        } else {
            total
        };
        if pages_to_process < total {
            warn!("Processing only {} of {} pages", pages_to_process, total);
        }

        let mut text_layer: Option<Vec<String>> = None;
        if self.pdf.prefer_embedded_text || self.recognizer.is_none() {
            text_layer = Some(pdf.extract_page_texts()?);
        }

        let mut pages = Vec::with_capacity(pages_to_process);
        for index in 0..pages_to_process {
            let page_num = index as u32 + 1;

            if self.pdf.prefer_embedded_text {
                let embedded = page_text(text_layer.as_deref(), index);
                if embedded.trim().len() >= self.pdf.min_text_length {
                    debug!("Page {} has an embedded text layer, skipping OCR", page_num);
                    pages.push(embedded);
                    continue;
                }
            }

            if let Some(recognizer) = self.recognizer {
                match pdf.render_page(page_num) {
                    Ok(image) => {
                        pages.push(recognizer.extract_text(&image)?);
                        continue;
                    }
                    Err(e) => warn!("Page {} has no scan image ({}), using text layer", page_num, e),
                }
            }

            if text_layer.is_none() {
                text_layer = Some(pdf.extract_page_texts()?);
            }
            pages.push(page_text(text_layer.as_deref(), index));
        }

        info!("Extracted {} pages from PDF", pages.len());
        Ok(RawDocument::Text { pages })
    }
}

fn page_text(layer: Option<&[String]>, index: usize) -> String {
    layer
        .and_then(|pages| pages.get(index))
        .cloned()
        .unwrap_or_default()
}
