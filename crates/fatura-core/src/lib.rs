//! Core library for electricity invoice processing.
//!
//! This crate provides:
//! - Label-anchored field extraction from CEMIG invoice text
//! - Consumption and distributed-generation metrics
//! - Concurrent batch ingestion with deduplication
//! - Monthly reporting over stored invoices
//! - PDF text extraction (`pdf` feature)

pub mod error;
pub mod ingest;
pub mod invoice;
pub mod metrics;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod reporting;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use error::{FaturaError, Result};
pub use ingest::{BatchIngestor, BatchReport, IngestOutcome, SkipReason, SourceDocument};
pub use invoice::{ExtractionResult, InvoiceExtractor, InvoiceFieldExtractor, InvoiceParser};
pub use metrics::{derive_metrics, EnrichedInvoice, InvoiceMetrics};
pub use models::invoice::{ClientIdentity, InvoiceData, InvoiceKey, InvoiceRecord, RawAddress};
#[cfg(feature = "pdf")]
pub use pdf::PdfTextSource;
pub use store::{InvoiceStore, MemoryStore, StoredAddress, StoredClient, StoredInvoice};
