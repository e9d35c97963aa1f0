//! Invoice processing runs and the per-item review actions.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{IntakeError, Result};
use crate::extract::DocumentExtractor;
use crate::matcher::{CatalogMatcher, MatchOutcome};
use crate::models::config::IntakeConfig;
use crate::models::invoice::{
    CatalogEntry, InvoiceItem, InvoiceUpload, MatchStatus, NewInvoiceItem, ProcessingStatus,
};
use crate::ocr::TextRecognizer;
use crate::parse::{coerce_quantity, parse_amount, LineItemParser};
use crate::sanitize::FieldSanitizer;
use crate::store::{Database, ItemMatchUpdate};

/// Outcome of one processing run, as shown to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    pub invoice_id: i64,
    pub status: ProcessingStatus,
    pub found: u32,
    pub matched: u32,
    pub notes: String,
    /// Extraction error message when the run failed before parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Drives an invoice through extraction, parsing, matching and classification.
pub struct InvoiceProcessor<'a> {
    db: &'a Database,
    recognizer: Option<&'a dyn TextRecognizer>,
    config: IntakeConfig,
    matcher: CatalogMatcher,
    sanitizer: FieldSanitizer,
    parser: LineItemParser,
}

impl<'a> InvoiceProcessor<'a> {
    pub fn new(db: &'a Database, config: &IntakeConfig) -> Self {
        Self {
            db,
            recognizer: None,
            config: config.clone(),
            matcher: CatalogMatcher::new(config.matching.clone()),
            sanitizer: FieldSanitizer::new(config.sanitizer.clone()),
            parser: LineItemParser::new(),
        }
    }

    /// Use an OCR engine for images and scanned PDF pages.
    pub fn with_recognizer(mut self, recognizer: Option<&'a dyn TextRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Process (or re-process) an invoice.
    ///
    /// Fails with [`IntakeError::AlreadyProcessing`] while another run holds the
    /// invoice, unless `force` is set. Extraction problems are reported in the
    /// summary as a FAILED run; storage errors mark the invoice FAILED and are
    /// returned.
    pub fn process(&self, invoice_id: i64, force: bool) -> Result<ProcessingSummary> {
        let invoice = self
            .db
            .get_invoice(invoice_id)?
            .ok_or(IntakeError::InvoiceNotFound(invoice_id))?;

        if !self.db.begin_processing(invoice_id, force)? {
            return Err(IntakeError::AlreadyProcessing(invoice_id));
        }
        info!(
            "Processing invoice {} ({}, {})",
            invoice_id,
            invoice.file_kind,
            invoice.file_path.display()
        );

        match self.run(&invoice) {
            Ok(summary) => {
                info!(
                    "Invoice {} {}: {} found, {} matched",
                    invoice_id, summary.status, summary.found, summary.matched
                );
                Ok(summary)
            }
            Err(e) => {
                let notes = format!("Processing failed: {}", e);
                if let Err(mark) = self
                    .db
                    .set_invoice_status(invoice_id, ProcessingStatus::Failed, &notes)
                {
                    warn!("Could not mark invoice {} as failed: {}", invoice_id, mark);
                }
                Err(e)
            }
        }
    }

    fn run(&self, invoice: &InvoiceUpload) -> Result<ProcessingSummary> {
        let id = invoice.id;

        let imported = self.db.count_imported_items(id)?;
        if imported > 0 {
            info!(
                "Invoice {} has {} imported items, re-running matching only",
                id, imported
            );
        } else {
            let removed = self.db.delete_unimported_items(id)?;
            if removed > 0 {
                debug!("Removed {} items from a previous run", removed);
            }

            let extractor = DocumentExtractor::new(self.recognizer, self.config.pdf.clone());
            let document = match extractor.extract(&invoice.file_path, invoice.file_kind) {
                Ok(document) => document,
                Err(e) => {
                    let notes = format!("Extraction failed: {}", e);
                    warn!("Invoice {}: {}", id, notes);
                    self.db
                        .finish_processing(id, ProcessingStatus::Failed, &notes, 0, 0)?;
                    return Ok(ProcessingSummary {
                        invoice_id: id,
                        status: ProcessingStatus::Failed,
                        found: 0,
                        matched: 0,
                        notes,
                        error: Some(e.to_string()),
                    });
                }
            };

            let parsed = self.parser.parse(&document);
            let items: Vec<NewInvoiceItem> = parsed
                .items
                .iter()
                .map(|item| self.sanitizer.sanitize(item))
                .collect();
            self.db.insert_items(id, &items)?;
            self.db.fill_invoice_metadata(
                id,
                parsed.metadata.invoice_number.as_deref(),
                parsed.metadata.invoice_date,
            )?;
        }

        self.match_invoice_items(id)?;

        let (found, matched) = self.db.item_counts(id)?;
        let (status, notes) = ProcessingStatus::classify(found, matched);
        self.db.finish_processing(id, status, &notes, found, matched)?;

        Ok(ProcessingSummary {
            invoice_id: id,
            status,
            found,
            matched,
            notes,
            error: None,
        })
    }

    /// Run the automatic matcher over every item it may still classify.
    fn match_invoice_items(&self, invoice_id: i64) -> Result<usize> {
        let catalog = self.db.catalog_snapshot()?;
        let mut updated = 0;

        for item in self.db.list_items(invoice_id)? {
            if item.is_imported || item.match_status.is_manual() {
                continue;
            }
            if self.apply_match(&item, &catalog)? {
                updated += 1;
            }
        }

        debug!("Matched {} items against {} catalog drugs", updated, catalog.len());
        Ok(updated)
    }

    fn apply_match(&self, item: &InvoiceItem, catalog: &[CatalogEntry]) -> Result<bool> {
        let outcome = self.matcher.match_item(
            &item.extracted_name,
            item.extracted_brand.as_deref(),
            catalog,
        );
        Ok(self.db.update_item_match(item.id, &outcome_update(item, &outcome))?)
    }

    /// Re-run the automatic matcher on one item, overriding any manual decision.
    pub fn match_item(&self, item_id: i64) -> Result<InvoiceItem> {
        let item = self.editable_item(item_id)?;
        let catalog = self.db.catalog_snapshot()?;
        if !self.apply_match(&item, &catalog)? {
            return Err(IntakeError::ItemAlreadyImported(item_id));
        }
        self.refresh_counters(item.invoice_id)?;
        self.reload_item(item_id)
    }

    /// Match an item to a drug by hand.
    ///
    /// Quantity and cost fall back to the extracted text when not given.
    pub fn manual_match(
        &self,
        item_id: i64,
        drug_id: i64,
        quantity: Option<u32>,
        cost_price: Option<Decimal>,
    ) -> Result<InvoiceItem> {
        let item = self.editable_item(item_id)?;
        if self.db.get_drug(drug_id)?.is_none() {
            return Err(IntakeError::DrugNotFound(drug_id));
        }

        let update = ItemMatchUpdate {
            status: MatchStatus::ManuallyMatched,
            drug_id: Some(drug_id),
            confidence: Some(100),
            quantity: quantity.or_else(|| item.extracted_quantity.as_deref().and_then(coerce_quantity)),
            cost_price: cost_price.or_else(|| item.extracted_cost_price.as_deref().and_then(parse_amount)),
            notes: Some("Matched manually".to_string()),
        };
        self.write_manual(&item, &update)
    }

    /// Exclude an item from import.
    pub fn ignore_item(&self, item_id: i64) -> Result<InvoiceItem> {
        let item = self.editable_item(item_id)?;
        let update = ItemMatchUpdate {
            status: MatchStatus::Ignored,
            drug_id: None,
            confidence: None,
            quantity: None,
            cost_price: None,
            notes: Some("Ignored by operator".to_string()),
        };
        self.write_manual(&item, &update)
    }

    /// Recount found/matched items for an invoice; the status is left as is.
    pub fn refresh_counters(&self, invoice_id: i64) -> Result<(u32, u32)> {
        let (found, matched) = self.db.item_counts(invoice_id)?;
        self.db.set_invoice_counters(invoice_id, found, matched)?;
        Ok((found, matched))
    }

    fn write_manual(&self, item: &InvoiceItem, update: &ItemMatchUpdate) -> Result<InvoiceItem> {
        if !self.db.update_item_match(item.id, update)? {
            return Err(IntakeError::ItemAlreadyImported(item.id));
        }
        info!("Item {} set to {}", item.id, update.status);
        self.refresh_counters(item.invoice_id)?;
        self.reload_item(item.id)
    }

    fn editable_item(&self, item_id: i64) -> Result<InvoiceItem> {
        let item = self.reload_item(item_id)?;
        if item.is_imported {
            return Err(IntakeError::ItemAlreadyImported(item_id));
        }
        Ok(item)
    }

    fn reload_item(&self, item_id: i64) -> Result<InvoiceItem> {
        self.db
            .get_item(item_id)?
            .ok_or(IntakeError::ItemNotFound(item_id))
    }
}

/// Persisted state for an automatic match outcome.
fn outcome_update(item: &InvoiceItem, outcome: &MatchOutcome) -> ItemMatchUpdate {
    let (quantity, cost_price, notes) = match outcome.status {
        MatchStatus::Matched => (
            item.extracted_quantity.as_deref().and_then(coerce_quantity),
            item.extracted_cost_price.as_deref().and_then(parse_amount),
            None,
        ),
        MatchStatus::PartialMatch => (None, None, Some("Possible match, needs review".to_string())),
        _ => (None, None, Some("No matching drug in catalog".to_string())),
    };

    ItemMatchUpdate {
        status: outcome.status,
        drug_id: outcome.drug_id,
        confidence: Some(outcome.confidence),
        quantity,
        cost_price,
        notes,
    }
}
