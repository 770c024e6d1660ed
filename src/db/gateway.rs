use bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::StoreConfig;

/// Errors from the document store boundary. Callers convert these into
/// caller-facing failures; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to MongoDB: {0}")]
    Connect(String),

    #[error("store operation failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("failed to decode stored document: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("insert did not return an object id")]
    MissingInsertId,
}

/// Trait for document types that declare their collection indexes,
/// applied once at bootstrap (`sereno db init`).
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Shared handle to the document store. Constructed once at startup and
/// passed by reference to repositories and the report engine; the driver
/// establishes server connections lazily on first operation.
#[derive(Clone)]
pub struct StoreGateway {
    client: Client,
    db_name: String,
}

impl StoreGateway {
    pub async fn connect(cfg: &StoreConfig) -> Result<Self, StoreError> {
        // Bound server selection so an unreachable MongoDB fails the call
        // instead of hanging it.
        let uri = if cfg.uri.contains('?') {
            format!(
                "{}&serverSelectionTimeoutMS={}&connectTimeoutMS={}",
                cfg.uri, cfg.server_selection_timeout_ms, cfg.connect_timeout_ms
            )
        } else {
            format!(
                "{}?serverSelectionTimeoutMS={}&connectTimeoutMS={}",
                cfg.uri, cfg.server_selection_timeout_ms, cfg.connect_timeout_ms
            )
        };

        let client = Client::with_uri_str(&uri)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        info!("Document store handle ready for database '{}'", cfg.database);

        Ok(Self {
            client,
            db_name: cfg.database.clone(),
        })
    }

    pub fn database(&self) -> Database {
        self.client.database(&self.db_name)
    }

    /// Get a typed collection handle
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.database().collection::<T>(name)
    }

    /// Liveness probe used by health checks
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub async fn count_documents(&self, collection: &str) -> Result<u64, StoreError> {
        let count = self
            .database()
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?;
        Ok(count)
    }

    pub async fn list_collection_names(&self) -> Result<Vec<String>, StoreError> {
        let names = self.database().list_collection_names().await?;
        Ok(names)
    }

    /// Remove every document in a collection. Administrative only.
    pub async fn clear_collection(&self, collection: &str) -> Result<u64, StoreError> {
        let result = self
            .database()
            .collection::<Document>(collection)
            .delete_many(doc! {})
            .await?;
        info!(
            "Cleared {} documents from collection '{}'",
            result.deleted_count, collection
        );
        Ok(result.deleted_count)
    }

    /// Apply the indexes a document type declares for its collection
    pub async fn apply_indexes<T>(&self, collection: &str) -> Result<(), StoreError>
    where
        T: IntoIndexes,
    {
        let schema_indices = T::into_indices();
        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.database()
            .collection::<Document>(collection)
            .create_indexes(indices)
            .await?;

        info!("Applied indexes for collection '{}'", collection);
        Ok(())
    }
}
