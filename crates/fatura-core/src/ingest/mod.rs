//! Batch ingestion: extract, deduplicate and persist invoices.
//!
//! Every document runs through the same pipeline:
//! 1. extract a record from the text (no record means the document is skipped)
//! 2. look the invoice up by its (month, year, installation) key
//! 3. find the client by number, creating it and its address when unknown
//! 4. persist the invoice linked to that client
//!
//! Steps 2 to 4 hold a lock on the invoice key and step 3 additionally holds
//! a lock on the client number, so concurrent documents sharing either key
//! never produce duplicate rows.

mod locks;

pub use locks::KeyedLocks;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::IngestError;
use crate::invoice::{InvoiceExtractor, InvoiceFieldExtractor};
use crate::models::config::IngestConfig;
use crate::models::invoice::{InvoiceKey, InvoiceRecord};
use crate::store::{InvoiceStore, StoreResult};

/// Why a document produced no new invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No valid record could be extracted from the text.
    Unparseable,
    /// An invoice with the same key is already stored.
    Duplicate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unparseable => write!(f, "unparseable"),
            SkipReason::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new invoice was stored.
    Created {
        invoice_id: Uuid,
        key: InvoiceKey,
        /// Whether the client was created by this document.
        new_client: bool,
    },
    /// Nothing was stored.
    Skipped(SkipReason),
    /// Persistence failed for this document.
    Failed(IngestError),
}

impl IngestOutcome {
    /// Short status label: `created`, `skipped` or `failed`.
    pub fn status(&self) -> &'static str {
        match self {
            IngestOutcome::Created { .. } => "created",
            IngestOutcome::Skipped(_) => "skipped",
            IngestOutcome::Failed(_) => "failed",
        }
    }
}

/// A named document text, e.g. the text extracted from one file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Outcome of one named document.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub name: String,
    pub outcome: IngestOutcome,
}

/// Outcomes of a batch, in input order, with counts per status.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub processing_time_ms: u64,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<DocumentOutcome>, processing_time_ms: u64) -> Self {
        let mut report = Self {
            processing_time_ms,
            ..Self::default()
        };
        for doc in &outcomes {
            match doc.outcome {
                IngestOutcome::Created { .. } => report.created += 1,
                IngestOutcome::Skipped(_) => report.skipped += 1,
                IngestOutcome::Failed(_) => report.failed += 1,
            }
        }
        report.outcomes = outcomes;
        report
    }
}

/// Orchestrates extraction and persistence over batches of documents.
pub struct BatchIngestor<S, E = InvoiceFieldExtractor> {
    store: Arc<S>,
    extractor: E,
    invoice_locks: KeyedLocks<InvoiceKey>,
    client_locks: KeyedLocks<String>,
    workers: usize,
    persist_timeout: Duration,
}

impl<S: InvoiceStore> BatchIngestor<S> {
    /// Create an ingestor using the default extractor and settings.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_extractor(store, InvoiceFieldExtractor::new())
    }
}

impl<S: InvoiceStore, E: InvoiceExtractor> BatchIngestor<S, E> {
    /// Create an ingestor with a custom extractor.
    pub fn with_extractor(store: Arc<S>, extractor: E) -> Self {
        let defaults = IngestConfig::default();
        Self {
            store,
            extractor,
            invoice_locks: KeyedLocks::new(),
            client_locks: KeyedLocks::new(),
            workers: defaults.workers,
            persist_timeout: defaults.persist_timeout(),
        }
    }

    /// Apply worker count and persistence timeout from configuration.
    pub fn with_config(self, config: &IngestConfig) -> Self {
        self.with_workers(config.workers)
            .with_persist_timeout(config.persist_timeout())
    }

    /// Maximum number of documents in flight at once.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Time limit for each store operation.
    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Ingest a single document text.
    pub async fn ingest_one(&self, text: &str) -> IngestOutcome {
        let Some(record) = self.extractor.extract(text) else {
            return IngestOutcome::Skipped(SkipReason::Unparseable);
        };

        match self.persist(&record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(key = %record.key(), "failed to persist invoice: {}", e);
                IngestOutcome::Failed(e)
            }
        }
    }

    /// Ingest several texts concurrently. Outcomes follow input order.
    pub async fn ingest_batch<I, T>(&self, texts: I) -> Vec<IngestOutcome>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        stream::iter(texts)
            .map(|text| async move { self.ingest_one(text.as_ref()).await })
            .buffered(self.workers)
            .collect()
            .await
    }

    /// Ingest named documents and summarize the outcomes.
    pub async fn ingest_documents(&self, documents: Vec<SourceDocument>) -> BatchReport {
        self.ingest_documents_with(documents, |_| {}).await
    }

    /// Like [`BatchIngestor::ingest_documents`], calling `on_done` as each
    /// outcome becomes available.
    pub async fn ingest_documents_with<F>(
        &self,
        documents: Vec<SourceDocument>,
        on_done: F,
    ) -> BatchReport
    where
        F: Fn(&DocumentOutcome),
    {
        let start = Instant::now();
        let total = documents.len();
        info!(documents = total, workers = self.workers, "Starting ingestion batch");

        let outcomes: Vec<DocumentOutcome> = stream::iter(documents)
            .map(|doc| async move {
                let outcome = self.ingest_one(&doc.text).await;
                debug!(document = %doc.name, status = outcome.status(), "document ingested");
                DocumentOutcome {
                    name: doc.name,
                    outcome,
                }
            })
            .buffered(self.workers)
            .inspect(|doc| on_done(doc))
            .collect()
            .await;

        let report = BatchReport::from_outcomes(outcomes, start.elapsed().as_millis() as u64);
        info!(
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            "Ingestion batch finished in {}ms",
            report.processing_time_ms
        );
        report
    }

    async fn persist(&self, record: &InvoiceRecord) -> Result<IngestOutcome, IngestError> {
        let key = record.key();
        let _invoice_guard = self.invoice_locks.lock(&key).await;

        let existing = self
            .timed("find_invoice_by_key", self.store.find_invoice_by_key(&key))
            .await?;
        if existing.is_some() {
            debug!(%key, "invoice already stored");
            return Ok(IngestOutcome::Skipped(SkipReason::Duplicate));
        }

        let (client_id, new_client) = self.resolve_client(record).await?;
        let invoice = self
            .timed(
                "create_invoice",
                self.store.create_invoice(&record.data, client_id),
            )
            .await?;

        info!(%key, invoice_id = %invoice.id, "invoice stored");
        Ok(IngestOutcome::Created {
            invoice_id: invoice.id,
            key,
            new_client,
        })
    }

    /// Find the record's client, creating it together with its address when
    /// the client number is unknown.
    async fn resolve_client(&self, record: &InvoiceRecord) -> Result<(Uuid, bool), IngestError> {
        let number = &record.client.client_number;
        let _client_guard = self.client_locks.lock(number).await;

        let existing = self
            .timed("find_client_by_number", self.store.find_client_by_number(number))
            .await?;
        if let Some(client) = existing {
            return Ok((client.id, false));
        }

        let client = self
            .timed("create_client", self.store.create_client(&record.client))
            .await?;
        self.timed(
            "create_address",
            self.store.create_address(&record.address, client.id),
        )
        .await?;

        debug!(client_number = %number, client_id = %client.id, "client created");
        Ok((client.id, true))
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StoreResult<T>>,
    ) -> Result<T, IngestError> {
        match tokio::time::timeout(self.persist_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(IngestError::Timeout {
                operation,
                timeout: self.persist_timeout,
            }),
        }
    }
}
