use chirp_blobs::BlobError;
use chirp_storage::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("document store error: {0}")]
    Document(#[from] DocumentError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),
}
