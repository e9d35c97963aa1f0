//! Invoice uploads and their extracted items.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{optional_decimal_column, parsed_column, Database, Result};
use crate::models::invoice::{
    FileKind, InvoiceItem, InvoiceUpload, MatchStatus, NewInvoiceItem, NewInvoiceUpload,
    ProcessingStatus,
};

const INVOICE_COLUMNS: &str = "id, supplier_id, invoice_number, invoice_date, file_path, file_kind, \
     uploaded_by, upload_date, processing_status, processing_notes, total_items_found, total_items_matched";

const ITEM_COLUMNS: &str = "id, invoice_id, extracted_name, extracted_brand, extracted_quantity, \
     extracted_cost_price, extracted_batch_number, extracted_expiry_date, quantity, cost_price, \
     match_status, matched_drug_id, match_confidence, processing_notes, is_imported";

/// New match state for an item that has not been imported yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMatchUpdate {
    pub status: MatchStatus,
    pub drug_id: Option<i64>,
    pub confidence: Option<u8>,
    pub quantity: Option<u32>,
    pub cost_price: Option<Decimal>,
    pub notes: Option<String>,
}

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<InvoiceUpload> {
    Ok(InvoiceUpload {
        id: row.get(0)?,
        supplier_id: row.get(1)?,
        invoice_number: row.get(2)?,
        invoice_date: row.get(3)?,
        file_path: row.get::<_, String>(4)?.into(),
        file_kind: parsed_column(row, 5, "invoice_uploads.file_kind", FileKind::parse)?,
        uploaded_by: row.get(6)?,
        upload_date: row.get(7)?,
        processing_status: parsed_column(
            row,
            8,
            "invoice_uploads.processing_status",
            ProcessingStatus::parse,
        )?,
        processing_notes: row.get(9)?,
        total_items_found: row.get(10)?,
        total_items_matched: row.get(11)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InvoiceItem> {
    Ok(InvoiceItem {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        extracted_name: row.get(2)?,
        extracted_brand: row.get(3)?,
        extracted_quantity: row.get(4)?,
        extracted_cost_price: row.get(5)?,
        extracted_batch_number: row.get(6)?,
        extracted_expiry_date: row.get(7)?,
        quantity: row.get(8)?,
        cost_price: optional_decimal_column(row, 9, "invoice_items.cost_price")?,
        match_status: parsed_column(row, 10, "invoice_items.match_status", MatchStatus::parse)?,
        matched_drug_id: row.get(11)?,
        match_confidence: row.get(12)?,
        processing_notes: row.get(13)?,
        is_imported: row.get(14)?,
    })
}

impl Database {
    pub fn insert_invoice(&self, upload: &NewInvoiceUpload) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO invoice_uploads
             (supplier_id, invoice_number, invoice_date, file_path, file_kind, uploaded_by,
              upload_date, processing_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                upload.supplier_id,
                upload.invoice_number,
                upload.invoice_date,
                upload.file_path.to_string_lossy(),
                upload.file_kind.as_str(),
                upload.uploaded_by,
                Utc::now(),
                ProcessingStatus::Pending.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_invoice(&self, id: i64) -> Result<Option<InvoiceUpload>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM invoice_uploads WHERE id = ?1", INVOICE_COLUMNS),
                params![id],
                invoice_from_row,
            )
            .optional()?)
    }

    /// Uploads, newest first.
    pub fn list_invoices(&self) -> Result<Vec<InvoiceUpload>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoice_uploads ORDER BY upload_date DESC, id DESC",
            INVOICE_COLUMNS
        ))?;
        let invoices = stmt
            .query_map([], invoice_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(invoices)
    }

    /// Move an invoice into PROCESSING unless another run holds it.
    ///
    /// `force` also takes over an invoice stuck in PROCESSING. Returns whether
    /// this caller now owns the run.
    pub fn begin_processing(&self, id: i64, force: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE invoice_uploads
             SET processing_status = ?2, processing_notes = NULL
             WHERE id = ?1 AND (processing_status <> ?2 OR ?3)",
            params![id, ProcessingStatus::Processing.as_str(), force],
        )?;
        Ok(changed == 1)
    }

    /// Record a run's outcome and counters.
    pub fn finish_processing(
        &self,
        id: i64,
        status: ProcessingStatus,
        notes: &str,
        found: u32,
        matched: u32,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE invoice_uploads
             SET processing_status = ?2, processing_notes = ?3,
                 total_items_found = ?4, total_items_matched = ?5
             WHERE id = ?1",
            params![id, status.as_str(), notes, found, matched],
        )?;
        Ok(())
    }

    /// Set the status and note, leaving the counters alone.
    pub fn set_invoice_status(&self, id: i64, status: ProcessingStatus, notes: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE invoice_uploads SET processing_status = ?2, processing_notes = ?3 WHERE id = ?1",
            params![id, status.as_str(), notes],
        )?;
        Ok(())
    }

    /// Store the counters computed from the persisted items.
    pub fn set_invoice_counters(&self, id: i64, found: u32, matched: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE invoice_uploads SET total_items_found = ?2, total_items_matched = ?3 WHERE id = ?1",
            params![id, found, matched],
        )?;
        Ok(())
    }

    /// Fill in the invoice number and date where the upload has none.
    pub fn fill_invoice_metadata(
        &self,
        id: i64,
        invoice_number: Option<&str>,
        invoice_date: Option<NaiveDate>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE invoice_uploads
             SET invoice_number = COALESCE(invoice_number, ?2),
                 invoice_date = COALESCE(invoice_date, ?3)
             WHERE id = ?1",
            params![id, invoice_number, invoice_date],
        )?;
        Ok(())
    }

    /// Insert sanitized items for an invoice in one transaction.
    pub fn insert_items(&self, invoice_id: i64, items: &[NewInvoiceItem]) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(items.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO invoice_items
                 (invoice_id, extracted_name, extracted_brand, extracted_quantity,
                  extracted_cost_price, extracted_batch_number, extracted_expiry_date, match_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for item in items {
                stmt.execute(params![
                    invoice_id,
                    item.name,
                    item.brand,
                    item.quantity,
                    item.cost_price,
                    item.batch_number,
                    item.expiry_date,
                    MatchStatus::Unmatched.as_str(),
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    pub fn get_item(&self, id: i64) -> Result<Option<InvoiceItem>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM invoice_items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                item_from_row,
            )
            .optional()?)
    }

    /// Items of an invoice in extraction order.
    pub fn list_items(&self, invoice_id: i64) -> Result<Vec<InvoiceItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoice_items WHERE invoice_id = ?1 ORDER BY id",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![invoice_id], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Drop the items of an invoice that never reached inventory.
    pub fn delete_unimported_items(&self, invoice_id: i64) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM invoice_items WHERE invoice_id = ?1 AND is_imported = 0",
            params![invoice_id],
        )?)
    }

    pub fn count_imported_items(&self, invoice_id: i64) -> Result<u32> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM invoice_items WHERE invoice_id = ?1 AND is_imported = 1",
            params![invoice_id],
            |row| row.get(0),
        )?)
    }

    /// (found, matched) for an invoice, counted from its items.
    pub fn item_counts(&self, invoice_id: i64) -> Result<(u32, u32)> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN match_status IN (?2, ?3) THEN 1 ELSE 0 END), 0)
             FROM invoice_items WHERE invoice_id = ?1",
            params![
                invoice_id,
                MatchStatus::Matched.as_str(),
                MatchStatus::ManuallyMatched.as_str(),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
    }

    /// Write a new match state. Imported items are never touched; returns
    /// whether the row changed.
    pub fn update_item_match(&self, item_id: i64, update: &ItemMatchUpdate) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE invoice_items
             SET match_status = ?2, matched_drug_id = ?3, match_confidence = ?4,
                 quantity = ?5, cost_price = ?6, processing_notes = ?7
             WHERE id = ?1 AND is_imported = 0",
            params![
                item_id,
                update.status.as_str(),
                update.drug_id,
                update.confidence,
                update.quantity,
                update.cost_price.map(|d| d.to_string()),
                update.notes,
            ],
        )?;
        Ok(changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn upload(path: &str, kind: FileKind) -> NewInvoiceUpload {
        NewInvoiceUpload {
            supplier_id: None,
            invoice_number: None,
            invoice_date: None,
            file_path: PathBuf::from(path),
            file_kind: kind,
            uploaded_by: Some("pharmacist".to_string()),
        }
    }

    fn new_item(name: &str) -> NewInvoiceItem {
        NewInvoiceItem {
            name: name.to_string(),
            brand: None,
            quantity: "1".to_string(),
            cost_price: "0.00".to_string(),
            batch_number: None,
            expiry_date: None,
        }
    }

    #[test]
    fn test_invoice_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_invoice(&upload("/tmp/inv.pdf", FileKind::Pdf)).unwrap();

        let invoice = db.get_invoice(id).unwrap().unwrap();
        assert_eq!(invoice.file_path, PathBuf::from("/tmp/inv.pdf"));
        assert_eq!(invoice.file_kind, FileKind::Pdf);
        assert_eq!(invoice.processing_status, ProcessingStatus::Pending);
        assert_eq!(invoice.uploaded_by.as_deref(), Some("pharmacist"));
        assert_eq!(invoice.total_items_found, 0);
        assert_eq!(db.list_invoices().unwrap().len(), 1);
    }

    #[test]
    fn test_begin_processing_is_exclusive() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_invoice(&upload("a.csv", FileKind::Spreadsheet)).unwrap();

        assert!(db.begin_processing(id, false).unwrap());
        assert!(!db.begin_processing(id, false).unwrap());
        assert!(db.begin_processing(id, true).unwrap());

        db.finish_processing(id, ProcessingStatus::Failed, "boom", 0, 0).unwrap();
        assert!(db.begin_processing(id, false).unwrap());
        assert!(!db.begin_processing(id + 100, true).unwrap());
    }

    #[test]
    fn test_metadata_only_fills_gaps() {
        let db = Database::open_in_memory().unwrap();
        let mut new = upload("a.pdf", FileKind::Pdf);
        new.invoice_number = Some("KEEP-1".to_string());
        let id = db.insert_invoice(&new).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 14);
        db.fill_invoice_metadata(id, Some("OCR-2"), date).unwrap();

        let invoice = db.get_invoice(id).unwrap().unwrap();
        assert_eq!(invoice.invoice_number.as_deref(), Some("KEEP-1"));
        assert_eq!(invoice.invoice_date, date);
    }

    #[test]
    fn test_items_and_counts() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_invoice(&upload("a.csv", FileKind::Spreadsheet)).unwrap();
        let ids = db
            .insert_items(id, &[new_item("Aspirin"), new_item("Ibuprofen"), new_item("Zinc")])
            .unwrap();
        assert_eq!(ids.len(), 3);

        let update = ItemMatchUpdate {
            status: MatchStatus::Matched,
            drug_id: None,
            confidence: Some(91),
            quantity: Some(5),
            cost_price: Some(Decimal::new(120, 2)),
            notes: None,
        };
        assert!(db.update_item_match(ids[0], &update).unwrap());
        assert!(db
            .update_item_match(
                ids[1],
                &ItemMatchUpdate {
                    status: MatchStatus::ManuallyMatched,
                    ..update.clone()
                }
            )
            .unwrap());

        assert_eq!(db.item_counts(id).unwrap(), (3, 2));

        let item = db.get_item(ids[0]).unwrap().unwrap();
        assert_eq!(item.match_status, MatchStatus::Matched);
        assert_eq!(item.match_confidence, Some(91));
        assert_eq!(item.cost_price, Some(Decimal::new(120, 2)));
        assert_eq!(
            db.list_items(id)
                .unwrap()
                .iter()
                .map(|i| i.extracted_name.as_str())
                .collect::<Vec<_>>(),
            vec!["Aspirin", "Ibuprofen", "Zinc"]
        );

        assert_eq!(db.delete_unimported_items(id).unwrap(), 3);
        assert_eq!(db.item_counts(id).unwrap(), (0, 0));
    }
}
