//! Suppliers and the drug catalog.

use rusqlite::{params, OptionalExtension, Row};

use super::{decimal_column, Database, Result};
use crate::models::invoice::{CatalogEntry, Drug, NewDrug, NewSupplier, Supplier};

const DRUG_COLUMNS: &str = "id, name, brand, stock_quantity, cost_price, is_active";

fn drug_from_row(row: &Row<'_>) -> rusqlite::Result<Drug> {
    Ok(Drug {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        stock_quantity: row.get(3)?,
        cost_price: decimal_column(row, 4, "drugs.cost_price")?,
        is_active: row.get(5)?,
    })
}

fn supplier_from_row(row: &Row<'_>) -> rusqlite::Result<Supplier> {
    Ok(Supplier {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_person: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        notes: row.get(6)?,
        is_active: row.get(7)?,
    })
}

impl Database {
    pub fn insert_supplier(&self, supplier: &NewSupplier) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO suppliers (name, contact_person, email, phone, address, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                supplier.name,
                supplier.contact_person,
                supplier.email,
                supplier.phone,
                supplier.address,
                supplier.notes,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_supplier(&self, id: i64) -> Result<Option<Supplier>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, contact_person, email, phone, address, notes, is_active
                 FROM suppliers WHERE id = ?1",
                params![id],
                supplier_from_row,
            )
            .optional()?)
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, contact_person, email, phone, address, notes, is_active
             FROM suppliers ORDER BY name, id",
        )?;
        let suppliers = stmt
            .query_map([], supplier_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(suppliers)
    }

    pub fn insert_drug(&self, drug: &NewDrug) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO drugs (name, brand, stock_quantity, cost_price) VALUES (?1, ?2, ?3, ?4)",
            params![
                drug.name,
                drug.brand,
                drug.stock_quantity,
                drug.cost_price.to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_drug(&self, id: i64) -> Result<Option<Drug>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM drugs WHERE id = ?1", DRUG_COLUMNS),
                params![id],
                drug_from_row,
            )
            .optional()?)
    }

    pub fn list_drugs(&self) -> Result<Vec<Drug>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM drugs ORDER BY id", DRUG_COLUMNS))?;
        let drugs = stmt
            .query_map([], drug_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(drugs)
    }

    /// Active drugs in id order, as seen by the matcher.
    pub fn catalog_snapshot(&self) -> Result<Vec<CatalogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, brand FROM drugs WHERE is_active = 1 ORDER BY id")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(CatalogEntry {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    brand: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Take a drug out of (or back into) the matcher's catalog.
    pub fn set_drug_active(&self, id: i64, active: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE drugs SET is_active = ?2 WHERE id = ?1",
            params![id, active],
        )?;
        Ok(changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn drug(name: &str, brand: Option<&str>) -> NewDrug {
        NewDrug {
            name: name.to_string(),
            brand: brand.map(str::to_string),
            stock_quantity: 0,
            cost_price: Decimal::new(100, 2),
        }
    }

    #[test]
    fn test_drug_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_drug(&NewDrug {
                stock_quantity: 12,
                cost_price: Decimal::new(350, 2),
                ..drug("Paracetamol", Some("Panadol"))
            })
            .unwrap();

        let stored = db.get_drug(id).unwrap().unwrap();
        assert_eq!(stored.name, "Paracetamol");
        assert_eq!(stored.brand.as_deref(), Some("Panadol"));
        assert_eq!(stored.stock_quantity, 12);
        assert_eq!(stored.cost_price, Decimal::new(350, 2));
        assert!(stored.is_active);
        assert!(db.get_drug(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_catalog_snapshot_skips_inactive() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_drug(&drug("Amoxicillin", Some("AmoxiPlus"))).unwrap();
        let b = db.insert_drug(&drug("Ibuprofen", None)).unwrap();
        let c = db.insert_drug(&drug("Cetirizine", None)).unwrap();
        assert!(db.set_drug_active(b, false).unwrap());

        assert_eq!(
            db.catalog_snapshot().unwrap(),
            vec![
                CatalogEntry::new(a, "Amoxicillin", Some("AmoxiPlus")),
                CatalogEntry::new(c, "Cetirizine", None),
            ]
        );
    }

    #[test]
    fn test_suppliers() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_supplier(&NewSupplier {
                name: "MediSupply Ltd".to_string(),
                email: Some("orders@medisupply.test".to_string()),
                ..NewSupplier::default()
            })
            .unwrap();

        let suppliers = db.list_suppliers().unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].id, id);
        assert_eq!(suppliers[0].email.as_deref(), Some("orders@medisupply.test"));
        assert!(suppliers[0].is_active);
        assert_eq!(db.get_supplier(id).unwrap().unwrap().name, "MediSupply Ltd");
    }
}
