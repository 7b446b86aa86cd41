/// Accept filter of the photo picker.
pub const PHOTO_ACCEPT: &str = "image/*";

/// Declarative description of what a card shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub author: String,
    pub body: BodyView,
    pub media: MediaView,
    /// Present only when the viewer authored the post.
    pub controls: Option<OwnerControls>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    Text(String),
    Editor { draft: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaView {
    None,
    Photo { url: String },
    Picker {
        accept: &'static str,
        selected: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerControls {
    /// `"edit"` while viewing, `"save"` while editing.
    pub edit_label: &'static str,
    pub delete_label: &'static str,
}

impl CardView {
    pub fn is_editing(&self) -> bool {
        matches!(self.body, BodyView::Editor { .. })
    }
}
