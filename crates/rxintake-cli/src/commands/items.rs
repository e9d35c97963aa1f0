//! Item review commands: list an invoice's items, match or ignore one.

use clap::Args;
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;

use rxintake_core::{InvoiceItem, InvoiceProcessor, MatchStatus};

use super::{to_csv, Context, OutputFormat};

/// Arguments for the items command.
#[derive(Args)]
pub struct ItemsArgs {
    /// Invoice id
    #[arg(required = true)]
    invoice_id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Arguments for the match command.
#[derive(Args)]
pub struct MatchArgs {
    /// Item id
    #[arg(required = true)]
    item_id: i64,

    /// Link the item to this drug instead of re-running the matcher
    #[arg(short, long)]
    drug: Option<i64>,

    /// Quantity to import (with --drug)
    #[arg(short, long, requires = "drug", value_parser = clap::value_parser!(u32).range(1..))]
    quantity: Option<u32>,

    /// Unit cost to record (with --drug)
    #[arg(long, requires = "drug")]
    cost: Option<Decimal>,
}

/// Arguments for the ignore command.
#[derive(Args)]
pub struct IgnoreArgs {
    /// Item id
    #[arg(required = true)]
    item_id: i64,
}

#[derive(Serialize)]
struct ItemRow<'a> {
    id: i64,
    name: &'a str,
    brand: &'a str,
    extracted_quantity: &'a str,
    extracted_cost_price: &'a str,
    status: &'static str,
    drug_id: String,
    confidence: String,
    quantity: String,
    cost_price: String,
    imported: bool,
}

impl<'a> From<&'a InvoiceItem> for ItemRow<'a> {
    fn from(item: &'a InvoiceItem) -> Self {
        Self {
            id: item.id,
            name: &item.extracted_name,
            brand: item.extracted_brand.as_deref().unwrap_or(""),
            extracted_quantity: item.extracted_quantity.as_deref().unwrap_or(""),
            extracted_cost_price: item.extracted_cost_price.as_deref().unwrap_or(""),
            status: item.match_status.as_str(),
            drug_id: optional(item.matched_drug_id),
            confidence: optional(item.match_confidence),
            quantity: optional(item.quantity),
            cost_price: optional(item.cost_price),
            imported: item.is_imported,
        }
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub async fn run_items(args: ItemsArgs, ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open_db()?;
    let invoice = db
        .get_invoice(args.invoice_id)?
        .ok_or_else(|| anyhow::anyhow!("Invoice {} not found", args.invoice_id))?;
    let items = db.list_items(args.invoice_id)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Csv => {
            let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
            print!("{}", to_csv(&rows)?);
        }
        OutputFormat::Text => {
            println!(
                "Invoice {} [{}] {} found, {} matched",
                invoice.id,
                invoice.processing_status,
                invoice.total_items_found,
                invoice.total_items_matched
            );
            if let Some(notes) = &invoice.processing_notes {
                println!("  {}", notes);
            }
            println!();
            for item in &items {
                print_item(item);
            }
        }
    }

    Ok(())
}

pub async fn run_match(args: MatchArgs, ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open_db()?;
    let processor = InvoiceProcessor::new(&db, &ctx.config);

    let item = match args.drug {
        Some(drug_id) => processor.manual_match(args.item_id, drug_id, args.quantity, args.cost)?,
        None => processor.match_item(args.item_id)?,
    };

    print_item(&item);
    Ok(())
}

pub async fn run_ignore(args: IgnoreArgs, ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open_db()?;
    let item = InvoiceProcessor::new(&db, &ctx.config).ignore_item(args.item_id)?;
    print_item(&item);
    Ok(())
}

fn print_item(item: &InvoiceItem) {
    let status = match item.match_status {
        MatchStatus::Matched | MatchStatus::ManuallyMatched => style(item.match_status.as_str()).green(),
        MatchStatus::PartialMatch => style(item.match_status.as_str()).yellow(),
        MatchStatus::Unmatched => style(item.match_status.as_str()).red(),
        MatchStatus::Ignored => style(item.match_status.as_str()).dim(),
    };

    let mut line = format!("{:>5}  {:<16}  {}", item.id, status, item.extracted_name);
    if let Some(brand) = &item.extracted_brand {
        line.push_str(&format!(" ({})", brand));
    }
    line.push_str(&format!(
        "  qty {}  price {}",
        item.extracted_quantity.as_deref().unwrap_or("-"),
        item.extracted_cost_price.as_deref().unwrap_or("-")
    ));
    if let Some(drug_id) = item.matched_drug_id {
        line.push_str(&format!(
            "  -> drug {} ({}%)",
            drug_id,
            item.match_confidence.unwrap_or(0)
        ));
    }
    if item.is_imported {
        line.push_str(&format!("  {}", style("imported").cyan()));
    }
    println!("{}", line);
}
