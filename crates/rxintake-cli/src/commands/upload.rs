//! Upload command - register an invoice file for processing.

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::Args;
use console::style;
use tracing::info;

use rxintake_core::{FileKind, IntakeError, NewInvoiceUpload};

use super::Context;

/// Arguments for the upload command.
#[derive(Args)]
pub struct UploadArgs {
    /// Invoice file (PDF, image, spreadsheet or CSV)
    #[arg(required = true)]
    file: PathBuf,

    /// Supplier id
    #[arg(short, long)]
    supplier: Option<i64>,

    /// Invoice number printed on the document
    #[arg(short = 'n', long)]
    invoice_number: Option<String>,

    /// Invoice date (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Who uploaded the file
    #[arg(short, long)]
    user: Option<String>,
}

pub async fn run(args: UploadArgs, ctx: &Context) -> anyhow::Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Input file not found: {}", args.file.display());
    }

    let file_kind = FileKind::from_path(&args.file).ok_or_else(|| {
        let extension = args
            .file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        IntakeError::UnsupportedFormat(extension)
    })?;

    let file_path = args
        .file
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.file.display()))?;

    let db = ctx.open_db()?;
    if let Some(supplier_id) = args.supplier {
        if db.get_supplier(supplier_id)?.is_none() {
            anyhow::bail!("Supplier {} not found", supplier_id);
        }
    }

    let id = db.insert_invoice(&NewInvoiceUpload {
        supplier_id: args.supplier,
        invoice_number: args.invoice_number,
        invoice_date: args.date,
        file_path,
        file_kind,
        uploaded_by: args.user,
    })?;
    info!("Registered {} as invoice {}", args.file.display(), id);

    println!(
        "{} Uploaded invoice {} ({})",
        style("✓").green(),
        id,
        file_kind
    );
    println!("Run 'rxintake process {}' to extract its items.", id);

    Ok(())
}
