use thiserror::Error;

/// Errors raised while decoding a stored post document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("document {id} is not a valid post: {reason}")]
    InvalidDocument { id: String, reason: String },
}
