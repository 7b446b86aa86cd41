use bytes::Bytes;

/// Alert shown when a picked photo is over the size limit.
pub const PHOTO_TOO_LARGE: &str = "Photo size too big! \n you can upload under 1MB";

/// One file picked in the card's photo input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of handing a file selection to the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSelection {
    /// Stored as the pending photo for the next commit.
    Accepted,
    /// Over the limit: the user was alerted and the input cleared.
    Rejected { size: u64, limit: u64 },
    /// Not exactly one file, or the card is not being edited.
    Ignored,
}
