//! Invoice field extraction module.

pub mod locate;
mod parser;
pub mod rules;

pub use parser::{ExtractionResult, InvoiceFieldExtractor, InvoiceParser};

use crate::error::ExtractionError;
use crate::models::invoice::InvoiceRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice field extractors.
pub trait InvoiceExtractor: Send + Sync {
    /// Extract a validated invoice from document text, or `None` when the
    /// document lacks any mandatory field.
    fn extract(&self, text: &str) -> Option<InvoiceRecord>;
}
