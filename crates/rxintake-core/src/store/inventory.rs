//! Stock movements and the inventory audit log.

use chrono::Utc;
use rusqlite::{params, Row};
use rust_decimal::Decimal;
use tracing::debug;

use super::{parsed_column, Database, Result};
use crate::error::StoreError;
use crate::models::invoice::{InventoryLog, InventoryOperation, MatchStatus};

/// Everything needed to move one invoice item into stock.
#[derive(Debug, Clone)]
pub struct StockReceipt<'a> {
    pub item_id: i64,
    pub drug_id: i64,
    pub quantity: u32,
    /// New unit cost for the drug, if the invoice states one.
    pub cost_price: Option<Decimal>,
    pub reference: &'a str,
    pub notes: &'a str,
    pub user: &'a str,
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryLog> {
    Ok(InventoryLog {
        id: row.get(0)?,
        drug_id: row.get(1)?,
        quantity_change: row.get(2)?,
        operation: parsed_column(row, 3, "inventory_logs.operation", InventoryOperation::parse)?,
        reference: row.get(4)?,
        notes: row.get(5)?,
        user: row.get(6)?,
        timestamp: row.get(7)?,
    })
}

impl Database {
    /// Receive an item into stock in a single transaction: flag the item
    /// imported, add to the drug's stock, update its cost and append an ADD log.
    ///
    /// Returns `false` (and changes nothing) when the item was already imported
    /// or is no longer in an importable state.
    pub fn receive_stock(&self, receipt: &StockReceipt<'_>) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;

        let flagged = tx.execute(
            "UPDATE invoice_items SET is_imported = 1, quantity = ?2
             WHERE id = ?1 AND is_imported = 0 AND match_status IN (?3, ?4)",
            params![
                receipt.item_id,
                receipt.quantity,
                MatchStatus::Matched.as_str(),
                MatchStatus::ManuallyMatched.as_str(),
            ],
        )?;
        if flagged == 0 {
            debug!("Item {} already imported or no longer matched, rolling back", receipt.item_id);
            tx.rollback()?;
            return Ok(false);
        }

        let updated = tx.execute(
            "UPDATE drugs
             SET stock_quantity = stock_quantity + ?2,
                 cost_price = COALESCE(?3, cost_price)
             WHERE id = ?1",
            params![
                receipt.drug_id,
                receipt.quantity,
                receipt.cost_price.map(|d| d.to_string()),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                table: "drugs",
                id: receipt.drug_id,
            });
        }

        tx.execute(
            "INSERT INTO inventory_logs (drug_id, quantity_change, operation, reference, notes, user, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                receipt.drug_id,
                receipt.quantity,
                InventoryOperation::Add.as_str(),
                receipt.reference,
                receipt.notes,
                receipt.user,
                Utc::now(),
            ],
        )?;

        tx.commit()?;
        Ok(true)
    }

    /// Audit log, oldest first, optionally for one drug.
    pub fn list_inventory_logs(&self, drug_id: Option<i64>) -> Result<Vec<InventoryLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, drug_id, quantity_change, operation, reference, notes, user, timestamp
             FROM inventory_logs
             WHERE ?1 IS NULL OR drug_id = ?1
             ORDER BY id",
        )?;
        let logs = stmt
            .query_map(params![drug_id], log_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::{FileKind, NewDrug, NewInvoiceItem, NewInvoiceUpload};
    use crate::store::ItemMatchUpdate;
    use pretty_assertions::assert_eq;

    fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let drug_id = db
            .insert_drug(&NewDrug {
                name: "Paracetamol".to_string(),
                brand: None,
                stock_quantity: 5,
                cost_price: Decimal::new(300, 2),
            })
            .unwrap();
        let invoice_id = db
            .insert_invoice(&NewInvoiceUpload {
                supplier_id: None,
                invoice_number: None,
                invoice_date: None,
                file_path: "inv.csv".into(),
                file_kind: FileKind::Spreadsheet,
                uploaded_by: None,
            })
            .unwrap();
        let item_id = db
            .insert_items(
                invoice_id,
                &[NewInvoiceItem {
                    name: "Paracetamol".to_string(),
                    brand: None,
                    quantity: "10".to_string(),
                    cost_price: "3.50".to_string(),
                    batch_number: None,
                    expiry_date: None,
                }],
            )
            .unwrap()[0];
        db.update_item_match(
            item_id,
            &ItemMatchUpdate {
                status: MatchStatus::Matched,
                drug_id: Some(drug_id),
                confidence: Some(100),
                quantity: Some(10),
                cost_price: None,
                notes: None,
            },
        )
        .unwrap();
        (db, drug_id, item_id)
    }

    #[test]
    fn test_receive_stock_once() {
        let (db, drug_id, item_id) = setup();
        let receipt = StockReceipt {
            item_id,
            drug_id,
            quantity: 10,
            cost_price: Some(Decimal::new(350, 2)),
            reference: "Supplier Invoice #42",
            notes: "Imported from supplier invoice",
            user: "pharmacist",
        };

        assert!(db.receive_stock(&receipt).unwrap());
        assert!(!db.receive_stock(&receipt).unwrap());

        let drug = db.get_drug(drug_id).unwrap().unwrap();
        assert_eq!(drug.stock_quantity, 15);
        assert_eq!(drug.cost_price, Decimal::new(350, 2));

        let logs = db.list_inventory_logs(Some(drug_id)).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].quantity_change, 10);
        assert_eq!(logs[0].operation, InventoryOperation::Add);
        assert_eq!(logs[0].reference.as_deref(), Some("Supplier Invoice #42"));
        assert_eq!(logs[0].user.as_deref(), Some("pharmacist"));

        let item = db.get_item(item_id).unwrap().unwrap();
        assert!(item.is_imported);
        assert_eq!(item.quantity, Some(10));
    }

    #[test]
    fn test_unmatched_item_is_not_received() {
        let (db, drug_id, item_id) = setup();
        db.update_item_match(
            item_id,
            &ItemMatchUpdate {
                status: MatchStatus::Ignored,
                drug_id: None,
                confidence: None,
                quantity: None,
                cost_price: None,
                notes: None,
            },
        )
        .unwrap();

        let receipt = StockReceipt {
            item_id,
            drug_id,
            quantity: 10,
            cost_price: None,
            reference: "ref",
            notes: "",
            user: "system",
        };
        assert!(!db.receive_stock(&receipt).unwrap());
        assert_eq!(db.get_drug(drug_id).unwrap().unwrap().stock_quantity, 5);
    }

    #[test]
    fn test_missing_drug_rolls_back() {
        let (db, drug_id, item_id) = setup();
        let receipt = StockReceipt {
            item_id,
            drug_id: drug_id + 99,
            quantity: 3,
            cost_price: None,
            reference: "ref",
            notes: "",
            user: "system",
        };

        assert!(matches!(
            db.receive_stock(&receipt),
            Err(StoreError::NotFound { table: "drugs", .. })
        ));
        assert!(!db.get_item(item_id).unwrap().unwrap().is_imported);
        assert!(db.list_inventory_logs(None).unwrap().is_empty());
    }
}
