//! Processing runs over uploaded invoices and the import into inventory.

pub mod processor;
pub mod reconciler;

pub use processor::{InvoiceProcessor, ProcessingSummary};
pub use reconciler::{ImportItemError, ImportReconciler, ImportReport};

#[cfg(test)]
pub(crate) mod test_support {
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use crate::models::invoice::{FileKind, NewDrug, NewInvoiceUpload};
    use crate::store::Database;

    /// In-memory store with Paracetamol, Amoxicillin, Ibuprofen and Cetirizine.
    pub(crate) fn catalog_db() -> (Database, Vec<i64>) {
        let db = Database::open_in_memory().unwrap();
        let drugs = [
            ("Paracetamol", Some("Panadol")),
            ("Amoxicillin", Some("AmoxiPlus")),
            ("Ibuprofen", Some("Brufen")),
            ("Cetirizine", None),
        ]
        .iter()
        .map(|(name, brand)| {
            db.insert_drug(&NewDrug {
                name: name.to_string(),
                brand: brand.map(str::to_string),
                stock_quantity: 0,
                cost_price: Decimal::new(120, 2),
            })
            .unwrap()
        })
        .collect();
        (db, drugs)
    }

    /// A CSV invoice with three known drugs and two unknown lines.
    pub(crate) fn csv_invoice(db: &Database) -> (TempDir, i64) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.csv");
        std::fs::write(
            &path,
            "Item,Qty,Price\n\
             Paracetamol,10,3.50\n\
             Amoxicillin,2,8.50\n\
             Ibuprofen,5,2.25\n\
             Zzzz Qqqq,1,1.00\n\
             Qwzk Vvvv,3,4.00\n",
        )
        .unwrap();

        let id = db
            .insert_invoice(&NewInvoiceUpload {
                supplier_id: None,
                invoice_number: None,
                invoice_date: None,
                file_path: path,
                file_kind: FileKind::Spreadsheet,
                uploaded_by: Some("pharmacist".to_string()),
            })
            .unwrap();
        (dir, id)
    }
}
