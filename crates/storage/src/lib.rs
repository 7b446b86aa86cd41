use std::path::PathBuf;

use chirp_core::Fields;

mod memory;
#[cfg(feature = "native")]
mod native;

pub use memory::MemoryDocumentStore;
#[cfg(feature = "native")]
pub use native::NativeDocumentStore;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to open database at {path}: {reason}")]
    ConnectionFailed { path: PathBuf, reason: String },

    #[error("migration {version} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("no document {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("document {collection}/{id} is corrupt: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },
}

/// A stored document and its key within its collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Keyed document storage with partial-update semantics.
///
/// `update` merges the given fields into an existing document and leaves every
/// other field untouched; it fails with [`DocumentError::NotFound`] when the
/// document does not exist. `delete` of a missing document succeeds.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DocumentError>;

    /// Documents of a collection, newest first.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentError>;

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DocumentError>;

    async fn update(&self, collection: &str, id: &str, fields: Fields)
    -> Result<(), DocumentError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentError>;
}

#[cfg(feature = "native")]
pub async fn open_document_store(
    path: &std::path::Path,
) -> Result<NativeDocumentStore, DocumentError> {
    NativeDocumentStore::open(path).await
}
