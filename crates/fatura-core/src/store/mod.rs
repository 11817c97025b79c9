//! Persistence interface consumed by the ingestion pipeline.
//!
//! Each operation is atomic for a single entity. The pipeline never needs a
//! transaction spanning several entities.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::invoice::{ClientIdentity, InvoiceData, InvoiceKey, RawAddress};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A persisted account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredClient {
    pub id: Uuid,
    #[serde(flatten)]
    pub identity: ClientIdentity,
}

/// A persisted service address, owned by one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAddress {
    pub id: Uuid,
    pub client_id: Uuid,
    #[serde(flatten)]
    pub address: RawAddress,
}

/// A persisted invoice, linked to its client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInvoice {
    pub id: Uuid,
    pub client_id: Uuid,
    #[serde(flatten)]
    pub data: InvoiceData,
}

impl AsRef<InvoiceData> for StoredInvoice {
    fn as_ref(&self) -> &InvoiceData {
        &self.data
    }
}

/// Storage backend for clients, addresses and invoices.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Invoice with the given (month, year, installation) identity.
    async fn find_invoice_by_key(&self, key: &InvoiceKey) -> StoreResult<Option<StoredInvoice>>;

    /// Client with the given client number.
    async fn find_client_by_number(&self, client_number: &str) -> StoreResult<Option<StoredClient>>;

    /// Insert a client. Fails with [`StoreError::Duplicate`] if the client
    /// number is taken.
    async fn create_client(&self, identity: &ClientIdentity) -> StoreResult<StoredClient>;

    /// Insert an address owned by an existing client.
    async fn create_address(
        &self,
        address: &RawAddress,
        client_id: Uuid,
    ) -> StoreResult<StoredAddress>;

    /// Insert an invoice for an existing client. Fails with
    /// [`StoreError::Duplicate`] if its key is taken.
    async fn create_invoice(
        &self,
        invoice: &InvoiceData,
        client_id: Uuid,
    ) -> StoreResult<StoredInvoice>;

    /// All invoices in insertion order.
    async fn list_invoices(&self) -> StoreResult<Vec<StoredInvoice>>;

    /// All clients in insertion order.
    async fn list_clients(&self) -> StoreResult<Vec<StoredClient>>;

    /// Address owned by a client.
    async fn find_address_by_client(&self, client_id: Uuid) -> StoreResult<Option<StoredAddress>>;
}
