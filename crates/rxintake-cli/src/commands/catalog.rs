//! Supplier and drug catalog commands.

use clap::{Args, Subcommand};
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;

use rxintake_core::{Drug, NewDrug, NewSupplier, Supplier};

use super::{to_csv, Context, OutputFormat};

/// Arguments for the supplier command.
#[derive(Args)]
pub struct SupplierArgs {
    #[command(subcommand)]
    command: SupplierCommand,
}

#[derive(Subcommand)]
enum SupplierCommand {
    /// Register a supplier
    Add {
        /// Supplier name
        name: String,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List suppliers
    List {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments for the drug command.
#[derive(Args)]
pub struct DrugArgs {
    #[command(subcommand)]
    command: DrugCommand,
}

#[derive(Subcommand)]
enum DrugCommand {
    /// Add a drug to the catalog
    Add {
        /// Generic name
        name: String,
        /// Brand name
        #[arg(short, long)]
        brand: Option<String>,
        /// Units currently in stock
        #[arg(long, default_value = "0")]
        stock: i64,
        /// Unit cost price
        #[arg(long, default_value = "0")]
        cost: Decimal,
    },

    /// List catalog drugs with stock levels
    List {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Stop matching invoice items against a drug
    Deactivate {
        /// Drug id
        id: i64,
    },

    /// Match invoice items against a deactivated drug again
    Activate {
        /// Drug id
        id: i64,
    },
}

#[derive(Serialize)]
struct SupplierRow<'a> {
    id: i64,
    name: &'a str,
    contact_person: &'a str,
    email: &'a str,
    phone: &'a str,
    is_active: bool,
}

impl<'a> From<&'a Supplier> for SupplierRow<'a> {
    fn from(s: &'a Supplier) -> Self {
        Self {
            id: s.id,
            name: &s.name,
            contact_person: s.contact_person.as_deref().unwrap_or(""),
            email: s.email.as_deref().unwrap_or(""),
            phone: s.phone.as_deref().unwrap_or(""),
            is_active: s.is_active,
        }
    }
}

#[derive(Serialize)]
struct DrugRow<'a> {
    id: i64,
    name: &'a str,
    brand: &'a str,
    stock_quantity: i64,
    cost_price: String,
    is_active: bool,
}

impl<'a> From<&'a Drug> for DrugRow<'a> {
    fn from(d: &'a Drug) -> Self {
        Self {
            id: d.id,
            name: &d.name,
            brand: d.brand.as_deref().unwrap_or(""),
            stock_quantity: d.stock_quantity,
            cost_price: d.cost_price.to_string(),
            is_active: d.is_active,
        }
    }
}

pub async fn run_supplier(args: SupplierArgs, ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open_db()?;

    match args.command {
        SupplierCommand::Add {
            name,
            contact,
            email,
            phone,
            address,
            notes,
        } => {
            if name.trim().is_empty() {
                anyhow::bail!("Supplier name cannot be empty");
            }
            let id = db.insert_supplier(&NewSupplier {
                name: name.trim().to_string(),
                contact_person: contact,
                email,
                phone,
                address,
                notes,
            })?;
            println!("{} Added supplier {} ({})", style("✓").green(), id, name.trim());
        }
        SupplierCommand::List { format } => {
            let suppliers = db.list_suppliers()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suppliers)?),
                OutputFormat::Csv => {
                    let rows: Vec<SupplierRow> = suppliers.iter().map(SupplierRow::from).collect();
                    print!("{}", to_csv(&rows)?);
                }
                OutputFormat::Text => {
                    if suppliers.is_empty() {
                        println!("{} No suppliers registered.", style("ℹ").blue());
                    }
                    for s in &suppliers {
                        println!(
                            "{:>5}  {}{}",
                            s.id,
                            s.name,
                            s.email
                                .as_deref()
                                .map(|e| format!(" <{}>", e))
                                .unwrap_or_default()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

pub async fn run_drug(args: DrugArgs, ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open_db()?;

    match args.command {
        DrugCommand::Add {
            name,
            brand,
            stock,
            cost,
        } => {
            if name.trim().is_empty() {
                anyhow::bail!("Drug name cannot be empty");
            }
            let id = db.insert_drug(&NewDrug {
                name: name.trim().to_string(),
                brand,
                stock_quantity: stock,
                cost_price: cost,
            })?;
            println!("{} Added drug {} ({})", style("✓").green(), id, name.trim());
        }
        DrugCommand::List { format } => {
            let drugs = db.list_drugs()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&drugs)?),
                OutputFormat::Csv => {
                    let rows: Vec<DrugRow> = drugs.iter().map(DrugRow::from).collect();
                    print!("{}", to_csv(&rows)?);
                }
                OutputFormat::Text => {
                    if drugs.is_empty() {
                        println!("{} The drug catalog is empty.", style("ℹ").blue());
                    }
                    for d in &drugs {
                        let name = match &d.brand {
                            Some(brand) => format!("{} ({})", d.name, brand),
                            None => d.name.clone(),
                        };
                        let line = format!(
                            "{:>5}  {:<40} stock {:>6}  cost {}",
                            d.id, name, d.stock_quantity, d.cost_price
                        );
                        if d.is_active {
                            println!("{}", line);
                        } else {
                            println!("{} {}", line, style("(inactive)").dim());
                        }
                    }
                }
            }
        }
        DrugCommand::Deactivate { id } => set_active(&db, id, false)?,
        DrugCommand::Activate { id } => set_active(&db, id, true)?,
    }

    Ok(())
}

fn set_active(db: &rxintake_core::Database, id: i64, active: bool) -> anyhow::Result<()> {
    if !db.set_drug_active(id, active)? {
        anyhow::bail!("Drug {} not found", id);
    }
    let state = if active { "activated" } else { "deactivated" };
    println!("{} Drug {} {}", style("✓").green(), id, state);
    Ok(())
}
