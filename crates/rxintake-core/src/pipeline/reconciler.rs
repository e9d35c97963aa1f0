//! Moves matched invoice items into inventory.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{IntakeError, Result};
use crate::models::invoice::InvoiceItem;
use crate::parse::{coerce_quantity, parse_amount};
use crate::store::{Database, StockReceipt};

const IMPORT_NOTE: &str = "Imported from supplier invoice";

/// One item that could not be imported.
#[derive(Debug, Clone, Serialize)]
pub struct ImportItemError {
    pub item_id: i64,
    pub name: String,
    pub message: String,
}

/// Result of an import run over one invoice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub invoice_id: i64,
    pub imported: usize,
    /// Importable items that were already imported or changed state meanwhile.
    pub skipped: usize,
    pub errors: Vec<ImportItemError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Receives MATCHED and MANUALLY_MATCHED items into stock, once each.
pub struct ImportReconciler<'a> {
    db: &'a Database,
}

impl<'a> ImportReconciler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Import every importable item of an invoice.
    ///
    /// Each item is received in its own transaction; a failing item is
    /// recorded in the report and the rest continue.
    pub fn import_invoice(&self, invoice_id: i64, user: &str) -> Result<ImportReport> {
        let invoice = self
            .db
            .get_invoice(invoice_id)?
            .ok_or(IntakeError::InvoiceNotFound(invoice_id))?;
        let reference = invoice.reference();

        let mut report = ImportReport {
            invoice_id,
            ..ImportReport::default()
        };

        for item in self.db.list_items(invoice_id)? {
            if item.is_imported || !item.match_status.is_importable() {
                continue;
            }
            let Some(drug_id) = item.matched_drug_id else {
                report.errors.push(ImportItemError {
                    item_id: item.id,
                    name: item.extracted_name.clone(),
                    message: "No drug linked to matched item".to_string(),
                });
                continue;
            };

            let receipt = StockReceipt {
                item_id: item.id,
                drug_id,
                quantity: import_quantity(&item),
                cost_price: import_cost(&item),
                reference: &reference,
                notes: IMPORT_NOTE,
                user,
            };

            match self.db.receive_stock(&receipt) {
                Ok(true) => report.imported += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!("Failed to import item {} ({}): {}", item.id, item.extracted_name, e);
                    report.errors.push(ImportItemError {
                        item_id: item.id,
                        name: item.extracted_name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Imported {} items from invoice {} ({} skipped, {} errors)",
            report.imported,
            invoice_id,
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }
}

/// Normalized quantity, else the extracted text, else one unit. Zero counts as absent.
fn import_quantity(item: &InvoiceItem) -> u32 {
    item.quantity
        .filter(|quantity| *quantity > 0)
        .or_else(|| {
            item.extracted_quantity
                .as_deref()
                .and_then(coerce_quantity)
                .filter(|quantity| *quantity > 0)
        })
        .unwrap_or(1)
}

/// Unit cost to record on the drug. Zero means the invoice had no usable price.
fn import_cost(item: &InvoiceItem) -> Option<Decimal> {
    item.cost_price
        .or_else(|| item.extracted_cost_price.as_deref().and_then(parse_amount))
        .filter(|cost| !cost.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::IntakeConfig;
    use crate::models::invoice::{MatchStatus, ProcessingStatus};
    use crate::pipeline::test_support::{catalog_db, csv_invoice};
    use crate::pipeline::InvoiceProcessor;
    use crate::store::ItemMatchUpdate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_import_is_idempotent() {
        let (db, drugs) = catalog_db();
        let (_dir, invoice_id) = csv_invoice(&db);
        InvoiceProcessor::new(&db, &IntakeConfig::default())
            .process(invoice_id, false)
            .unwrap();

        let reconciler = ImportReconciler::new(&db);
        let first = reconciler.import_invoice(invoice_id, "pharmacist").unwrap();
        assert_eq!(first.imported, 3);
        assert!(first.is_clean());

        let paracetamol = db.get_drug(drugs[0]).unwrap().unwrap();
        assert_eq!(paracetamol.stock_quantity, 10);
        assert_eq!(paracetamol.cost_price, Decimal::new(350, 2));

        let second = reconciler.import_invoice(invoice_id, "pharmacist").unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(db.get_drug(drugs[0]).unwrap().unwrap().stock_quantity, 10);

        let logs = db.list_inventory_logs(None).unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].reference.as_deref(), Some("Supplier Invoice upload 1"));
        assert_eq!(logs[0].user.as_deref(), Some("pharmacist"));
    }

    #[test]
    fn test_reprocessing_after_import_keeps_items() {
        let (db, _) = catalog_db();
        let (_dir, invoice_id) = csv_invoice(&db);
        let processor = InvoiceProcessor::new(&db, &IntakeConfig::default());
        processor.process(invoice_id, false).unwrap();
        ImportReconciler::new(&db)
            .import_invoice(invoice_id, "system")
            .unwrap();

        let before: Vec<i64> = db.list_items(invoice_id).unwrap().iter().map(|i| i.id).collect();
        let summary = processor.process(invoice_id, false).unwrap();
        let after: Vec<i64> = db.list_items(invoice_id).unwrap().iter().map(|i| i.id).collect();

        assert_eq!(before, after);
        assert_eq!(summary.status, ProcessingStatus::PartiallyProcessed);
        assert_eq!(db.count_imported_items(invoice_id).unwrap(), 3);
    }

    #[test]
    fn test_zero_cost_leaves_drug_price() {
        let (db, drugs) = catalog_db();
        let (_dir, invoice_id) = csv_invoice(&db);
        InvoiceProcessor::new(&db, &IntakeConfig::default())
            .process(invoice_id, false)
            .unwrap();

        let items = db.list_items(invoice_id).unwrap();
        db.update_item_match(
            items[3].id,
            &ItemMatchUpdate {
                status: MatchStatus::ManuallyMatched,
                drug_id: Some(drugs[3]),
                confidence: Some(100),
                quantity: None,
                cost_price: Some(Decimal::ZERO),
                notes: None,
            },
        )
        .unwrap();

        let report = ImportReconciler::new(&db)
            .import_invoice(invoice_id, "system")
            .unwrap();
        assert_eq!(report.imported, 4);

        let cetirizine = db.get_drug(drugs[3]).unwrap().unwrap();
        assert_eq!(cetirizine.cost_price, Decimal::new(120, 2));
        assert_eq!(cetirizine.stock_quantity, 1);
    }

    #[test]
    fn test_zero_quantity_imports_one_unit() {
        let (db, drugs) = catalog_db();
        let (_dir, invoice_id) = csv_invoice(&db);
        InvoiceProcessor::new(&db, &IntakeConfig::default())
            .process(invoice_id, false)
            .unwrap();

        let items = db.list_items(invoice_id).unwrap();
        db.update_item_match(
            items[0].id,
            &ItemMatchUpdate {
                status: MatchStatus::Matched,
                drug_id: Some(drugs[0]),
                confidence: Some(100),
                quantity: Some(0),
                cost_price: None,
                notes: None,
            },
        )
        .unwrap();

        let report = ImportReconciler::new(&db)
            .import_invoice(invoice_id, "system")
            .unwrap();
        assert_eq!(report.imported, 3);

        assert_eq!(db.get_drug(drugs[0]).unwrap().unwrap().stock_quantity, 1);
        let logs = db.list_inventory_logs(Some(drugs[0])).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].quantity_change, 1);
    }

    #[test]
    fn test_matched_item_without_drug_is_reported() {
        let (db, _) = catalog_db();
        let (_dir, invoice_id) = csv_invoice(&db);
        InvoiceProcessor::new(&db, &IntakeConfig::default())
            .process(invoice_id, false)
            .unwrap();

        let items = db.list_items(invoice_id).unwrap();
        db.update_item_match(
            items[4].id,
            &ItemMatchUpdate {
                status: MatchStatus::Matched,
                drug_id: None,
                confidence: Some(90),
                quantity: Some(3),
                cost_price: None,
                notes: None,
            },
        )
        .unwrap();

        let report = ImportReconciler::new(&db)
            .import_invoice(invoice_id, "system")
            .unwrap();
        assert_eq!(report.imported, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].item_id, items[4].id);
        assert!(!db.get_item(items[4].id).unwrap().unwrap().is_imported);
    }

    #[test]
    fn test_unknown_invoice() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            ImportReconciler::new(&db).import_invoice(3, "system"),
            Err(IntakeError::InvoiceNotFound(3))
        ));
    }
}
