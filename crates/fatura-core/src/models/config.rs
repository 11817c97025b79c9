//! Configuration structures for extraction, ingestion and storage.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::invoice::rules::address::DEFAULT_ADDRESS_KEYWORDS;

/// Main configuration for the fatura pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaturaConfig {
    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch ingestion configuration.
    pub ingest: IngestConfig,

    /// Storage locations.
    pub storage: StorageConfig,
}

/// Token positions of the kWh amount and the value on an energy line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyColumns {
    pub amount: usize,
    pub value: usize,
}

impl Default for EnergyColumns {
    fn default() -> Self {
        Self {
            amount: 1,
            value: 3,
        }
    }
}

/// Labels and layout parameters used to locate invoice fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Label above the installation and client numbers.
    pub installation_label: String,

    /// Label above the `MMM/YYYY due-date total` header line.
    pub reference_label: String,

    /// Label above the tariff class lines.
    pub class_label: String,

    /// Primary energy line caption.
    pub energy_label: String,

    /// SCEE energy line caption.
    pub scee_label: String,

    /// Distributed generation compensation line caption.
    pub compensated_label: String,

    /// Public lighting contribution caption.
    pub public_lighting_label: String,

    /// Late fee caption.
    pub fine_label: String,

    /// Label above the reading dates line.
    pub reading_label: String,

    /// Individual tax id caption.
    pub cpf_label: String,

    /// Company tax id caption, used when the CPF caption is absent.
    pub cnpj_label: String,

    /// Prefixes identifying the street address line.
    pub address_keywords: Vec<String>,

    pub energy_columns: EnergyColumns,
    pub scee_columns: EnergyColumns,
    pub compensated_columns: EnergyColumns,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            installation_label: "Nº DA INSTALAÇÃO".to_string(),
            reference_label: "Referente a".to_string(),
            class_label: "Classe".to_string(),
            energy_label: "Energia Elétrica".to_string(),
            scee_label: "Energia SCEE s/ ICMS".to_string(),
            compensated_label: "Energia compensada GD I".to_string(),
            public_lighting_label: "Contrib Ilum Publica Municipal".to_string(),
            fine_label: "Multa".to_string(),
            reading_label: "Atual".to_string(),
            cpf_label: "CPF".to_string(),
            cnpj_label: "CNPJ".to_string(),
            address_keywords: DEFAULT_ADDRESS_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            energy_columns: EnergyColumns::default(),
            scee_columns: EnergyColumns::default(),
            compensated_columns: EnergyColumns::default(),
        }
    }
}

/// Batch ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of documents processed concurrently.
    pub workers: usize,

    /// Timeout applied to each store operation, in milliseconds.
    pub persist_timeout_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            persist_timeout_ms: 10_000,
        }
    }
}

impl IngestConfig {
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot of the invoice store.
    pub store_path: PathBuf,

    /// Directory holding archived invoice PDFs.
    pub documents_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("fatura-store.json"),
            documents_dir: PathBuf::from("invoices"),
        }
    }
}

impl FaturaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FaturaConfig =
            serde_json::from_str(r#"{"ingest": {"workers": 8}}"#).unwrap();
        assert_eq!(config.ingest.workers, 8);
        assert_eq!(config.ingest.persist_timeout(), Duration::from_secs(10));
        assert_eq!(config.extraction.reference_label, "Referente a");
        assert_eq!(config.extraction.address_keywords.len(), 7);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FaturaConfig::default();
        config.extraction.scee_columns = EnergyColumns { amount: 2, value: 4 };
        config.save(&path).unwrap();

        let loaded = FaturaConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.scee_columns, EnergyColumns { amount: 2, value: 4 });
        assert_eq!(loaded.storage.documents_dir, PathBuf::from("invoices"));
    }
}
