//! Configuration structures for the intake pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{IntakeError, Result};

/// Main configuration for rxintake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Database configuration.
    pub database: DatabaseConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Catalog matching configuration.
    pub matching: MatchingConfig,

    /// Field length bounds applied before persistence.
    pub sanitizer: SanitizerConfig,

    /// Processing run configuration.
    pub processing: ProcessingConfig,
}

/// SQLite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,

    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rxintake.db"),
            busy_timeout_ms: 5000,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` tokens emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,

    /// Maximum image dimension (longer side) handed to the engine.
    pub max_image_size: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            max_image_size: 2048,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Use the embedded text layer when it is long enough, skipping OCR.
    pub prefer_embedded_text: bool,

    /// Minimum embedded text length for a page to count as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 20,
            prefer_embedded_text: false,
            min_text_length: 20,
        }
    }
}

/// OCR model file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Whether all model files are present on disk.
    pub fn is_available(&self) -> bool {
        [&self.detection_model, &self.recognition_model, &self.dictionary]
            .iter()
            .all(|name| self.model_dir.join(name).exists())
    }
}

/// Thresholds for catalog matching. Scores are on a 0-100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum score for MATCHED.
    pub matched_threshold: u8,

    /// Minimum score for PARTIAL_MATCH.
    pub partial_threshold: u8,

    /// Added when item and drug brands are equal.
    pub brand_bonus: u8,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            matched_threshold: 70,
            partial_threshold: 50,
            brand_bonus: 20,
        }
    }
}

/// Maximum stored lengths, in characters, of extracted fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub name_max: usize,
    pub brand_max: usize,
    pub quantity_max: usize,
    pub price_max: usize,
    pub batch_number_max: usize,
    pub expiry_date_max: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            name_max: 500,
            brand_max: 255,
            quantity_max: 50,
            price_max: 50,
            batch_number_max: 100,
            expiry_date_max: 50,
        }
    }
}

/// Processing run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Upper bound on a single processing run, in seconds.
    pub timeout_secs: u64,

    /// User recorded on inventory logs when none is given.
    pub default_user: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            default_user: "system".to_string(),
        }
    }
}

impl IntakeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| IntakeError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| IntakeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_dir.join(model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: IntakeConfig =
            serde_json::from_str(r#"{"matching": {"matched_threshold": 80}}"#).unwrap();
        assert_eq!(config.matching.matched_threshold, 80);
        assert_eq!(config.matching.partial_threshold, 50);
        assert_eq!(config.sanitizer.name_max, 500);
        assert_eq!(config.database.path, PathBuf::from("rxintake.db"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = IntakeConfig::default();
        config.processing.timeout_secs = 42;
        config.save(&path).unwrap();

        let loaded = IntakeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.processing.timeout_secs, 42);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert!(matches!(IntakeConfig::from_file(&path), Err(IntakeError::Io(_))));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(IntakeConfig::from_file(&path), Err(IntakeError::Config(_))));
    }

    #[test]
    fn test_missing_models_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let models = ModelConfig {
            model_dir: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };
        assert!(!models.is_available());
    }
}
