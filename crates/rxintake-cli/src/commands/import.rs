//! Import command - receive matched items into stock.

use clap::Args;
use console::style;

use rxintake_core::ImportReconciler;

use super::{Context, OutputFormat};

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Invoice id
    #[arg(required = true)]
    invoice_id: i64,

    /// User recorded on the inventory log (default: processing.default_user)
    #[arg(short, long)]
    user: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ImportArgs, ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open_db()?;
    let user = args
        .user
        .unwrap_or_else(|| ctx.config.processing.default_user.clone());

    let report = ImportReconciler::new(&db).import_invoice(args.invoice_id, &user)?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Imported {} items from invoice {}",
        style("✓").green(),
        report.imported,
        report.invoice_id
    );
    if report.skipped > 0 {
        println!(
            "{} Skipped {} items already imported",
            style("ℹ").blue(),
            report.skipped
        );
    }
    if !report.is_clean() {
        eprintln!("{}", style("Failed items:").yellow());
        for error in &report.errors {
            eprintln!("  - {} {}: {}", error.item_id, error.name, error.message);
        }
    }

    Ok(())
}
