//! Subcommands and the state they share.

pub mod catalog;
pub mod config;
pub mod import;
pub mod items;
pub mod process;
pub mod upload;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::debug;

use rxintake_core::models::config::IntakeConfig;
use rxintake_core::Database;

/// Output format for listings and summaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

/// Resolved configuration and database location for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: IntakeConfig,
    pub config_path: PathBuf,
}

impl Context {
    /// Load `--config` if given, else the user config file if it exists, else defaults.
    /// `--db` overrides the configured database path.
    ///
    /// With `allow_missing`, a `--config` path that does not exist yet yields
    /// defaults (used by `config init`).
    pub fn load(config: Option<&Path>, db: Option<&Path>, allow_missing: bool) -> anyhow::Result<Self> {
        let (mut intake, config_path) = match config {
            Some(path) if allow_missing && !path.exists() => (IntakeConfig::default(), path.to_path_buf()),
            Some(path) => (
                IntakeConfig::from_file(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?,
                path.to_path_buf(),
            ),
            None => {
                let path = default_config_path();
                let intake = if path.exists() {
                    IntakeConfig::from_file(&path)
                        .with_context(|| format!("Failed to read config {}", path.display()))?
                } else {
                    IntakeConfig::default()
                };
                (intake, path)
            }
        };

        if let Some(db) = db {
            intake.database.path = db.to_path_buf();
        }
        debug!("Using database {}", intake.database.path.display());

        Ok(Self {
            config: intake,
            config_path,
        })
    }

    pub fn open_db(&self) -> anyhow::Result<Database> {
        Database::open_with_config(&self.config.database).with_context(|| {
            format!(
                "Failed to open database {}",
                self.config.database.path.display()
            )
        })
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rxintake")
        .join("config.json")
}

/// Render serializable rows as CSV with a header line.
pub fn to_csv<T: serde::Serialize>(rows: &[T]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}
