//! Error types for the fatura-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the fatura library.
#[derive(Error, Debug)]
pub enum FaturaError {
    /// Persistence error, including an inconsistent snapshot.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Required field is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// No invoice data could be extracted.
    #[error("no invoice data found")]
    NoData,
}

/// Errors raised by an invoice store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The backing storage failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors that fail the ingestion of a single document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// A store operation returned an error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A store operation did not complete in time.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

/// Errors related to metric derivation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// A billing line that metrics depend on is absent.
    #[error("missing billing field: {0}")]
    MissingField(&'static str),
}

/// Result type for the fatura library.
pub type Result<T> = std::result::Result<T, FaturaError>;
