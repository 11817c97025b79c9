//! CLI subcommands and the helpers they share.

pub mod config;
pub mod extract;
pub mod ingest;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use fatura_core::models::config::FaturaConfig;
use fatura_core::pdf::PdfTextSource;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fatura")
        .join("config.json")
}

/// Load the configuration given with `--config`, else the default file if it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FaturaConfig> {
    if let Some(path) = config_path {
        return Ok(FaturaConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(FaturaConfig::from_file(&default_path)?)
    } else {
        Ok(FaturaConfig::default())
    }
}

/// Whether a file looks like an invoice document we can read.
pub fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Read the text of an invoice document: the text layer of a PDF, or a
/// plain-text file as is.
pub fn read_document_text(path: &Path) -> anyhow::Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let text = match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            PdfTextSource::from_bytes(&data)?
        }
        "txt" => fs::read_to_string(path)?,
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    if text.trim().is_empty() {
        anyhow::bail!("No text extracted from {}", path.display());
    }

    debug!("Read {} chars from {}", text.len(), path.display());
    Ok(text)
}
