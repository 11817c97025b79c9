//! In-memory invoice store with JSON snapshots.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{InvoiceStore, StoreResult, StoredAddress, StoredClient, StoredInvoice};
use crate::error::StoreError;
use crate::models::invoice::{ClientIdentity, InvoiceData, InvoiceKey, RawAddress};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    clients: Vec<StoredClient>,
    addresses: Vec<StoredAddress>,
    invoices: Vec<StoredInvoice>,
}

impl Snapshot {
    /// Check the constraints a snapshot edited outside the store could break.
    fn validate(&self) -> StoreResult<()> {
        let mut client_numbers = HashSet::new();
        for client in &self.clients {
            if !client_numbers.insert(client.identity.client_number.as_str()) {
                return Err(StoreError::Duplicate {
                    entity: "client",
                    key: client.identity.client_number.clone(),
                });
            }
        }

        let client_ids: HashSet<Uuid> = self.clients.iter().map(|c| c.id).collect();
        let dangling = self
            .addresses
            .iter()
            .map(|a| a.client_id)
            .chain(self.invoices.iter().map(|i| i.client_id))
            .find(|id| !client_ids.contains(id));
        if let Some(id) = dangling {
            return Err(StoreError::NotFound {
                entity: "client",
                key: id.to_string(),
            });
        }

        let mut keys = HashSet::new();
        for invoice in &self.invoices {
            let key = invoice.data.key();
            if !keys.insert(key.clone()) {
                return Err(StoreError::Duplicate {
                    entity: "invoice",
                    key: key.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Store keeping all entities in memory, enforcing the client-number and
/// invoice-key uniqueness constraints on insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`MemoryStore::save`]. A missing file yields
    /// an empty store.
    pub fn open(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            debug!("No store snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        snapshot.validate()?;
        info!(
            clients = snapshot.clients.len(),
            invoices = snapshot.invoices.len(),
            "Loaded store snapshot from {}",
            path.display()
        );

        Ok(Self {
            state: RwLock::new(snapshot),
        })
    }

    /// Write the current contents to a JSON file.
    pub async fn save(&self, path: &Path) -> crate::Result<()> {
        let content = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)?
        };

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        debug!("Saved store snapshot to {}", path.display());
        Ok(())
    }

    /// All addresses in insertion order.
    pub async fn list_addresses(&self) -> Vec<StoredAddress> {
        self.state.read().await.addresses.clone()
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn find_invoice_by_key(&self, key: &InvoiceKey) -> StoreResult<Option<StoredInvoice>> {
        let state = self.state.read().await;
        Ok(state.invoices.iter().find(|i| &i.data.key() == key).cloned())
    }

    async fn find_client_by_number(
        &self,
        client_number: &str,
    ) -> StoreResult<Option<StoredClient>> {
        let state = self.state.read().await;
        Ok(state
            .clients
            .iter()
            .find(|c| c.identity.client_number == client_number)
            .cloned())
    }

    async fn create_client(&self, identity: &ClientIdentity) -> StoreResult<StoredClient> {
        let mut state = self.state.write().await;
        if state
            .clients
            .iter()
            .any(|c| c.identity.client_number == identity.client_number)
        {
            return Err(StoreError::Duplicate {
                entity: "client",
                key: identity.client_number.clone(),
            });
        }

        let client = StoredClient {
            id: Uuid::new_v4(),
            identity: identity.clone(),
        };
        state.clients.push(client.clone());
        Ok(client)
    }

    async fn create_address(
        &self,
        address: &RawAddress,
        client_id: Uuid,
    ) -> StoreResult<StoredAddress> {
        let mut state = self.state.write().await;
        if !state.clients.iter().any(|c| c.id == client_id) {
            return Err(StoreError::NotFound {
                entity: "client",
                key: client_id.to_string(),
            });
        }

        let address = StoredAddress {
            id: Uuid::new_v4(),
            client_id,
            address: address.clone(),
        };
        state.addresses.push(address.clone());
        Ok(address)
    }

    async fn create_invoice(
        &self,
        invoice: &InvoiceData,
        client_id: Uuid,
    ) -> StoreResult<StoredInvoice> {
        let mut state = self.state.write().await;
        let key = invoice.key();
        if state.invoices.iter().any(|i| i.data.key() == key) {
            return Err(StoreError::Duplicate {
                entity: "invoice",
                key: key.to_string(),
            });
        }
        if !state.clients.iter().any(|c| c.id == client_id) {
            return Err(StoreError::NotFound {
                entity: "client",
                key: client_id.to_string(),
            });
        }

        let invoice = StoredInvoice {
            id: Uuid::new_v4(),
            client_id,
            data: invoice.clone(),
        };
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn list_invoices(&self) -> StoreResult<Vec<StoredInvoice>> {
        Ok(self.state.read().await.invoices.clone())
    }

    async fn list_clients(&self) -> StoreResult<Vec<StoredClient>> {
        Ok(self.state.read().await.clients.clone())
    }

    async fn find_address_by_client(&self, client_id: Uuid) -> StoreResult<Option<StoredAddress>> {
        let state = self.state.read().await;
        Ok(state.addresses.iter().find(|a| a.client_id == client_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaturaError;
    use crate::fixtures::SAMPLE_INVOICE;
    use crate::invoice::{InvoiceExtractor, InvoiceFieldExtractor};
    use crate::models::invoice::InvoiceRecord;
    use pretty_assertions::assert_eq;

    fn record() -> InvoiceRecord {
        InvoiceFieldExtractor::new()
            .with_reading_year(2024)
            .extract(SAMPLE_INVOICE)
            .unwrap()
    }

    #[tokio::test]
    async fn test_client_number_is_unique() {
        let store = MemoryStore::new();
        let record = record();

        store.create_client(&record.client).await.unwrap();
        let err = store.create_client(&record.client).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::Duplicate {
                entity: "client",
                key: "7202788969".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invoice_key_is_unique() {
        let store = MemoryStore::new();
        let record = record();
        let client = store.create_client(&record.client).await.unwrap();

        store.create_invoice(&record.data, client.id).await.unwrap();
        assert!(matches!(
            store.create_invoice(&record.data, client.id).await,
            Err(StoreError::Duplicate { entity: "invoice", .. })
        ));

        let found = store.find_invoice_by_key(&record.key()).await.unwrap();
        assert_eq!(found.map(|i| i.client_id), Some(client.id));
    }

    #[tokio::test]
    async fn test_address_requires_client() {
        let store = MemoryStore::new();
        let record = record();

        assert!(matches!(
            store.create_address(&record.address, Uuid::new_v4()).await,
            Err(StoreError::NotFound { entity: "client", .. })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let record = record();

        let store = MemoryStore::new();
        let client = store.create_client(&record.client).await.unwrap();
        store.create_address(&record.address, client.id).await.unwrap();
        store.create_invoice(&record.data, client.id).await.unwrap();
        store.save(&path).await.unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.list_invoices().await.unwrap(), store.list_invoices().await.unwrap());
        assert_eq!(
            reopened.find_address_by_client(client.id).await.unwrap().map(|a| a.address),
            Some(record.address)
        );
    }

    #[tokio::test]
    async fn test_open_rejects_duplicate_invoice_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let record = record();

        let store = MemoryStore::new();
        let client = store.create_client(&record.client).await.unwrap();
        let invoice = store.create_invoice(&record.data, client.id).await.unwrap();
        store.state.write().await.invoices.push(StoredInvoice {
            id: Uuid::new_v4(),
            ..invoice
        });
        store.save(&path).await.unwrap();

        assert!(matches!(
            MemoryStore::open(&path),
            Err(FaturaError::Store(StoreError::Duplicate { entity: "invoice", .. }))
        ));
    }

    #[tokio::test]
    async fn test_open_rejects_unknown_client_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let record = record();

        let store = MemoryStore::new();
        let client = store.create_client(&record.client).await.unwrap();
        store.create_invoice(&record.data, client.id).await.unwrap();
        store.state.write().await.clients.clear();
        store.save(&path).await.unwrap();

        assert!(matches!(
            MemoryStore::open(&path),
            Err(FaturaError::Store(StoreError::NotFound { entity: "client", .. }))
        ));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(&dir.path().join("absent.json")).unwrap();
        assert!(store.list_clients().await.unwrap().is_empty());
    }
}
