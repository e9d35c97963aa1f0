//! Process command - extract, parse and match the items of an uploaded invoice.

use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use rxintake_core::models::config::IntakeConfig;
use rxintake_core::{
    create_engine, FileKind, InvoiceProcessor, ProcessingStatus, ProcessingSummary, TextRecognizer,
};

use super::{Context, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Invoice id
    #[arg(required = true)]
    invoice_id: i64,

    /// Take over an invoice left in PROCESSING by an interrupted run
    #[arg(long)]
    force: bool,

    /// Give up after this many seconds (default: processing.timeout_secs)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ProcessArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let timeout = Duration::from_secs(args.timeout.unwrap_or(ctx.config.processing.timeout_secs));
    let invoice_id = args.invoice_id;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Processing invoice {}...", invoice_id));

    let worker_ctx = ctx.clone();
    let force = args.force;
    let task = tokio::task::spawn_blocking(move || -> anyhow::Result<ProcessingSummary> {
        let db = worker_ctx.open_db()?;
        let kind = db.get_invoice(invoice_id)?.map(|invoice| invoice.file_kind);
        let engine = match kind {
            Some(FileKind::Pdf | FileKind::Image) => load_recognizer(&worker_ctx.config),
            _ => None,
        };

        let processor = InvoiceProcessor::new(&db, &worker_ctx.config).with_recognizer(engine.as_deref());
        Ok(processor.process(invoice_id, force)?)
    });

    let outcome = tokio::time::timeout(timeout, task).await;
    pb.finish_and_clear();

    let summary = match outcome {
        Ok(joined) => joined??,
        Err(_) => {
            // The blocking worker cannot be cancelled; exit instead of waiting for it.
            eprintln!(
                "{} Processing invoice {} timed out after {}s. Re-run with --force once it has stopped.",
                style("✗").red(),
                invoice_id,
                timeout.as_secs()
            );
            std::process::exit(1);
        }
    };

    debug!("Total processing time: {:?}", start.elapsed());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Csv => print!("{}", super::to_csv(&[SummaryRow::from(&summary)])?),
        OutputFormat::Text => print_summary(&summary),
    }

    Ok(())
}

/// Load the OCR engine when its models are installed.
fn load_recognizer(config: &IntakeConfig) -> Option<Box<dyn TextRecognizer>> {
    if !config.models.is_available() {
        warn!(
            "OCR models not found in {}, images cannot be read and PDFs use their text layer",
            config.models.model_dir.display()
        );
        return None;
    }

    match create_engine(&config.models, &config.ocr) {
        Ok(engine) => Some(engine),
        Err(e) => {
            warn!("Failed to load OCR models: {}", e);
            None
        }
    }
}

#[derive(serde::Serialize)]
struct SummaryRow<'a> {
    invoice_id: i64,
    status: &'static str,
    found: u32,
    matched: u32,
    notes: &'a str,
}

impl<'a> From<&'a ProcessingSummary> for SummaryRow<'a> {
    fn from(s: &'a ProcessingSummary) -> Self {
        Self {
            invoice_id: s.invoice_id,
            status: s.status.as_str(),
            found: s.found,
            matched: s.matched,
            notes: &s.notes,
        }
    }
}

fn print_summary(summary: &ProcessingSummary) {
    let marker = match summary.status {
        ProcessingStatus::Completed => style("✓").green(),
        ProcessingStatus::PartiallyProcessed => style("!").yellow(),
        _ => style("✗").red(),
    };

    println!(
        "{} Invoice {} {}: {} items found, {} matched",
        marker, summary.invoice_id, summary.status, summary.found, summary.matched
    );
    println!("  {}", summary.notes);
    if let Some(error) = &summary.error {
        println!("  {} {}", style("Error:").red(), error);
    }
    if summary.found > summary.matched {
        println!();
        println!(
            "Review with 'rxintake items {}', then 'rxintake import {}'.",
            summary.invoice_id, summary.invoice_id
        );
    }
}
