//! In-memory collaborators that record every call made through their
//! interfaces and can be told to fail a given operation.

use std::collections::HashSet;
use std::sync::Mutex;

use bytes::Bytes;
use chirp_blobs::{BlobError, BlobHandle, BlobPath, BlobStore, ObjectBlobStore};
use chirp_core::{Fields, Prompt};
use chirp_storage::{Document, DocumentError, DocumentStore, MemoryDocumentStore};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().expect("fake state mutex poisoned")
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentCall {
    Get { collection: String, id: String },
    List { collection: String },
    Set { collection: String, id: String, fields: Fields },
    Update { collection: String, id: String, fields: Fields },
    Delete { collection: String, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentOp {
    Get,
    List,
    Set,
    Update,
    Delete,
}

#[derive(Debug, Default)]
pub struct RecordingDocuments {
    inner: MemoryDocumentStore,
    calls: Mutex<Vec<DocumentCall>>,
    failing: Mutex<HashSet<DocumentOp>>,
}

impl RecordingDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document without recording a call.
    pub async fn seed(&self, collection: &str, id: &str, fields: Fields) {
        self.inner
            .set(collection, id, fields)
            .await
            .expect("memory store never fails to set");
    }

    /// Current contents of a document, read without recording a call.
    pub async fn stored(&self, collection: &str, id: &str) -> Option<Fields> {
        self.inner
            .get(collection, id)
            .await
            .expect("memory store never fails to get")
    }

    pub fn fail_on(&self, op: DocumentOp) {
        lock(&self.failing).insert(op);
    }

    pub fn calls(&self) -> Vec<DocumentCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, op: DocumentOp, call: DocumentCall) -> Result<(), DocumentError> {
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(&op) {
            return Err(DocumentError::QueryFailed(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

impl DocumentStore for RecordingDocuments {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DocumentError> {
        self.record(
            DocumentOp::Get,
            DocumentCall::Get {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )?;
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        self.record(
            DocumentOp::List,
            DocumentCall::List {
                collection: collection.to_string(),
            },
        )?;
        self.inner.list(collection).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DocumentError> {
        self.record(
            DocumentOp::Set,
            DocumentCall::Set {
                collection: collection.to_string(),
                id: id.to_string(),
                fields: fields.clone(),
            },
        )?;
        self.inner.set(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentError> {
        self.record(
            DocumentOp::Update,
            DocumentCall::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields: fields.clone(),
            },
        )?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentError> {
        self.record(
            DocumentOp::Delete,
            DocumentCall::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )?;
        self.inner.delete(collection, id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobCall {
    Upload { path: String, size: usize },
    Url { path: String },
    Delete { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Upload,
    Url,
    Delete,
}

pub const FAKE_PUBLIC_URL: &str = "https://cdn.example.com";

#[derive(Debug)]
pub struct RecordingBlobs {
    inner: ObjectBlobStore,
    calls: Mutex<Vec<BlobCall>>,
    failing: Mutex<HashSet<BlobOp>>,
}

impl Default for RecordingBlobs {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBlobs {
    pub fn new() -> Self {
        Self {
            inner: ObjectBlobStore::in_memory(FAKE_PUBLIC_URL)
                .expect("fake public url is valid"),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Store a blob without recording a call.
    pub async fn seed(&self, path: &str, bytes: &'static [u8]) {
        let path = BlobPath::parse(path).expect("seed path is valid");
        self.inner
            .upload(&path, Bytes::from_static(bytes))
            .await
            .expect("in-memory upload never fails");
    }

    pub async fn contains(&self, path: &str) -> bool {
        let path = BlobPath::parse(path).expect("path is valid");
        self.inner
            .exists(&path)
            .await
            .expect("in-memory head never fails")
    }

    pub async fn read(&self, path: &str) -> Option<Bytes> {
        let path = BlobPath::parse(path).expect("path is valid");
        self.inner.read(&path).await.ok()
    }

    pub fn fail_on(&self, op: BlobOp) {
        lock(&self.failing).insert(op);
    }

    pub fn calls(&self) -> Vec<BlobCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, op: BlobOp, call: BlobCall) -> Result<(), BlobError> {
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(&op) {
            return Err(BlobError::Backend(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

impl BlobStore for RecordingBlobs {
    async fn upload(&self, path: &BlobPath, bytes: Bytes) -> Result<BlobHandle, BlobError> {
        self.record(
            BlobOp::Upload,
            BlobCall::Upload {
                path: path.to_string(),
                size: bytes.len(),
            },
        )?;
        self.inner.upload(path, bytes).await
    }

    async fn url(&self, handle: &BlobHandle) -> Result<String, BlobError> {
        self.record(
            BlobOp::Url,
            BlobCall::Url {
                path: handle.path.to_string(),
            },
        )?;
        self.inner.url(handle).await
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), BlobError> {
        self.record(
            BlobOp::Delete,
            BlobCall::Delete {
                path: path.to_string(),
            },
        )?;
        self.inner.delete(path).await
    }
}

/// Prompt with a fixed confirmation answer that remembers what it was asked.
#[derive(Debug)]
pub struct ScriptedPrompt {
    answer: bool,
    confirmations: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn confirming() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self {
            answer,
            confirmations: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn confirmations(&self) -> Vec<String> {
        lock(&self.confirmations).clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        lock(&self.alerts).clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> bool {
        lock(&self.confirmations).push(message.to_string());
        self.answer
    }

    fn alert(&self, message: &str) {
        tracing::debug!(message, "scripted alert");
        lock(&self.alerts).push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_is_not_recorded() {
        let documents = RecordingDocuments::new();
        documents.seed("tweets", "t1", Fields::new()).await;
        assert!(documents.calls().is_empty());
        assert!(documents.stored("tweets", "t1").await.is_some());

        let blobs = RecordingBlobs::new();
        blobs.seed("tweets/u1/t1", b"x").await;
        assert!(blobs.calls().is_empty());
        assert!(blobs.contains("tweets/u1/t1").await);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_then_returned() {
        let documents = RecordingDocuments::new();
        documents.fail_on(DocumentOp::Delete);

        let result = documents.delete("tweets", "t1").await;

        assert!(matches!(result, Err(DocumentError::QueryFailed(_))));
        assert_eq!(documents.calls().len(), 1);
    }
}
