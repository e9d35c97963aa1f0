//! CLI application for pharmacy supplier invoice intake.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{catalog, config, import, items, process, upload, Context};

/// Pharmacy invoice intake - turn supplier invoices into stock
#[derive(Parser)]
#[command(name = "rxintake")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides database.path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage suppliers
    Supplier(catalog::SupplierArgs),

    /// Manage the drug catalog
    Drug(catalog::DrugArgs),

    /// Register an invoice file
    Upload(upload::UploadArgs),

    /// Extract, parse and match an uploaded invoice
    Process(process::ProcessArgs),

    /// List the extracted items of an invoice
    Items(items::ItemsArgs),

    /// Re-run matching for an item, or match it to a drug by hand
    Match(items::MatchArgs),

    /// Exclude an item from import
    Ignore(items::IgnoreArgs),

    /// Receive matched items into stock
    Import(import::ImportArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let is_config = matches!(cli.command, Commands::Config(_));
    let ctx = Context::load(cli.config.as_deref(), cli.db.as_deref(), is_config)?;

    match cli.command {
        Commands::Supplier(args) => catalog::run_supplier(args, &ctx).await,
        Commands::Drug(args) => catalog::run_drug(args, &ctx).await,
        Commands::Upload(args) => upload::run(args, &ctx).await,
        Commands::Process(args) => process::run(args, &ctx).await,
        Commands::Items(args) => items::run_items(args, &ctx).await,
        Commands::Match(args) => items::run_match(args, &ctx).await,
        Commands::Ignore(args) => items::run_ignore(args, &ctx).await,
        Commands::Import(args) => import::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
