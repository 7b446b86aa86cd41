use chirp_blobs::BlobError;
use chirp_storage::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("terminal initialization failed: {0}")]
    TerminalInit(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("document store error: {0}")]
    Document(#[from] DocumentError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
