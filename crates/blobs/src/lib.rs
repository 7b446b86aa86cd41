//! Photo storage for posts.
//!
//! Blobs are addressed by slash-separated paths (`tweets/{authorId}/{postId}`)
//! and served from a public base URL. [`ObjectBlobStore`] adapts any
//! [`object_store::ObjectStore`] backend to the [`BlobStore`] interface the
//! card talks to.

use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid blob path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid public url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no blob at {0}")]
    NotFound(String),

    #[error("blob backend error: {0}")]
    Backend(String),

    #[error("I/O error preparing blob store: {0}")]
    Io(#[from] std::io::Error),
}

/// Validated location of a blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath {
    raw: String,
    location: ObjectPath,
}

impl BlobPath {
    pub fn parse(raw: impl Into<String>) -> Result<Self, BlobError> {
        let raw = raw.into();
        let location = ObjectPath::parse(&raw).map_err(|error| BlobError::InvalidPath {
            path: raw.clone(),
            reason: error.to_string(),
        })?;
        if location.as_ref().is_empty() {
            return Err(BlobError::InvalidPath {
                path: raw,
                reason: "path is empty".to_string(),
            });
        }
        Ok(Self { raw, location })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn location(&self) -> &ObjectPath {
        &self.location
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Reference to a freshly uploaded blob, exchanged for its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub path: BlobPath,
    pub e_tag: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `bytes` at `path`, replacing any existing blob.
    async fn upload(&self, path: &BlobPath, bytes: Bytes) -> Result<BlobHandle, BlobError>;

    /// Public retrieval URL of an uploaded blob.
    async fn url(&self, handle: &BlobHandle) -> Result<String, BlobError>;

    /// Remove the blob at `path`; a missing blob is [`BlobError::NotFound`].
    async fn delete(&self, path: &BlobPath) -> Result<(), BlobError>;
}

pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    base: Url,
}

impl fmt::Debug for ObjectBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBlobStore")
            .field("store", &self.store.to_string())
            .field("base", &self.base.as_str())
            .finish()
    }
}

fn backend_error(path: &BlobPath, error: object_store::Error) -> BlobError {
    match error {
        object_store::Error::NotFound { .. } => BlobError::NotFound(path.to_string()),
        other => BlobError::Backend(other.to_string()),
    }
}

fn parse_base(public_url: &str) -> Result<Url, BlobError> {
    let mut base = Url::parse(public_url).map_err(|error| BlobError::InvalidUrl {
        url: public_url.to_string(),
        reason: error.to_string(),
    })?;
    if base.cannot_be_a_base() {
        return Err(BlobError::InvalidUrl {
            url: public_url.to_string(),
            reason: "url cannot be used as a base".to_string(),
        });
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

impl ObjectBlobStore {
    pub fn new(store: Arc<dyn ObjectStore>, public_url: &str) -> Result<Self, BlobError> {
        Ok(Self {
            store,
            base: parse_base(public_url)?,
        })
    }

    pub fn in_memory(public_url: &str) -> Result<Self, BlobError> {
        Self::new(Arc::new(InMemory::new()), public_url)
    }

    /// Blobs stored as files below `directory`, which is created if missing.
    pub fn local(directory: &FsPath, public_url: &str) -> Result<Self, BlobError> {
        std::fs::create_dir_all(directory)?;
        let store = LocalFileSystem::new_with_prefix(directory)
            .map_err(|error| BlobError::Backend(error.to_string()))?;
        Self::new(Arc::new(store), public_url)
    }

    pub async fn exists(&self, path: &BlobPath) -> Result<bool, BlobError> {
        match self.store.head(path.location()).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(error) => Err(backend_error(path, error)),
        }
    }

    pub async fn read(&self, path: &BlobPath) -> Result<Bytes, BlobError> {
        let result = self
            .store
            .get(path.location())
            .await
            .map_err(|error| backend_error(path, error))?;
        result
            .bytes()
            .await
            .map_err(|error| backend_error(path, error))
    }

    fn public_url(&self, path: &BlobPath, e_tag: Option<&str>) -> Result<String, BlobError> {
        let mut url = self
            .base
            .join(path.as_str())
            .map_err(|error| BlobError::InvalidUrl {
                url: format!("{}{}", self.base, path),
                reason: error.to_string(),
            })?;
        if let Some(e_tag) = e_tag {
            url.query_pairs_mut().append_pair("v", e_tag.trim_matches('"'));
        }
        Ok(url.into())
    }
}

impl BlobStore for ObjectBlobStore {
    async fn upload(&self, path: &BlobPath, bytes: Bytes) -> Result<BlobHandle, BlobError> {
        let size = bytes.len();
        let result = self
            .store
            .put(path.location(), bytes.into())
            .await
            .map_err(|error| backend_error(path, error))?;
        debug!(path = %path, size, e_tag = ?result.e_tag, "uploaded blob");

        Ok(BlobHandle {
            path: path.clone(),
            e_tag: result.e_tag,
        })
    }

    async fn url(&self, handle: &BlobHandle) -> Result<String, BlobError> {
        let meta = self
            .store
            .head(handle.path.location())
            .await
            .map_err(|error| backend_error(&handle.path, error))?;
        let e_tag = handle.e_tag.as_deref().or(meta.e_tag.as_deref());
        self.public_url(&handle.path, e_tag)
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), BlobError> {
        self.store
            .head(path.location())
            .await
            .map_err(|error| backend_error(path, error))?;
        self.store
            .delete(path.location())
            .await
            .map_err(|error| backend_error(path, error))?;
        debug!(path = %path, "deleted blob");
        Ok(())
    }
}
