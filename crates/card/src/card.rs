use std::sync::Arc;

use chirp_blobs::{BlobError, BlobPath, BlobStore};
use chirp_core::config::CardConfig;
use chirp_core::{IdentityProvider, Post, PostPatch, Prompt};
use chirp_storage::DocumentStore;
use tracing::{debug, error, info, warn};

use crate::error::CardError;
use crate::photo::{PHOTO_TOO_LARGE, PhotoSelection, SelectedFile};
use crate::view::{BodyView, CardView, MediaView, OwnerControls, PHOTO_ACCEPT};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this tweet?";

/// Where a card keeps its post and how large a photo may be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSettings {
    pub collection: String,
    pub photo_prefix: String,
    pub max_photo_bytes: u64,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self::from(&CardConfig::default())
    }
}

impl From<&CardConfig> for CardSettings {
    fn from(config: &CardConfig) -> Self {
        Self {
            collection: config.collection.clone(),
            photo_prefix: config.photo_prefix.clone(),
            max_photo_bytes: config.max_photo_bytes,
        }
    }
}

/// Transient state of an edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub draft_body: String,
    pub pending_photo: Option<SelectedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardState {
    #[default]
    Viewing,
    Editing(EditSession),
    /// The post was deleted; nothing on the card is actionable any more.
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    NotOwner,
    Removed,
    Cancelled,
    Deleted,
    /// At least one of the removals failed; the failure was logged.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    NotEditing,
    NotOwner,
    Removed,
    Updated { photo_replaced: bool },
    /// The update sequence stopped early; the failure was logged.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditToggle {
    Began,
    Ignored,
    Committed(CommitOutcome),
}

pub struct TweetCard<D, B> {
    post: Post,
    identity: Arc<dyn IdentityProvider>,
    documents: Arc<D>,
    blobs: Arc<B>,
    settings: CardSettings,
    state: CardState,
}

impl<D, B> TweetCard<D, B>
where
    D: DocumentStore,
    B: BlobStore,
{
    pub fn new(
        post: Post,
        identity: Arc<dyn IdentityProvider>,
        documents: Arc<D>,
        blobs: Arc<B>,
        settings: CardSettings,
    ) -> Self {
        Self {
            post,
            identity,
            documents,
            blobs,
            settings,
            state: CardState::Viewing,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, CardState::Editing(_))
    }

    /// Largest photo, in bytes, this card accepts.
    pub fn max_photo_bytes(&self) -> u64 {
        self.settings.max_photo_bytes
    }

    pub fn is_removed(&self) -> bool {
        matches!(self.state, CardState::Removed)
    }

    pub fn draft_body(&self) -> Option<&str> {
        match &self.state {
            CardState::Editing(session) => Some(&session.draft_body),
            CardState::Viewing | CardState::Removed => None,
        }
    }

    pub fn pending_photo(&self) -> Option<&SelectedFile> {
        match &self.state {
            CardState::Editing(session) => session.pending_photo.as_ref(),
            CardState::Viewing | CardState::Removed => None,
        }
    }

    /// Whether the signed-in user authored this post.
    pub fn is_owner(&self) -> bool {
        self.post.is_owned_by(self.identity.current_uid().as_ref())
    }

    pub fn view(&self) -> CardView {
        let (body, media) = match &self.state {
            CardState::Editing(session) => (
                BodyView::Editor {
                    draft: session.draft_body.clone(),
                },
                MediaView::Picker {
                    accept: PHOTO_ACCEPT,
                    selected: session.pending_photo.as_ref().map(|file| file.name.clone()),
                },
            ),
            CardState::Viewing | CardState::Removed => (
                BodyView::Text(self.post.body.clone()),
                match &self.post.photo_url {
                    Some(url) => MediaView::Photo { url: url.clone() },
                    None => MediaView::None,
                },
            ),
        };

        let controls = (self.is_owner() && !self.is_removed()).then(|| OwnerControls {
            edit_label: if self.is_editing() { "save" } else { "edit" },
            delete_label: "Delete",
        });

        CardView {
            author: self.post.author_display_name.clone(),
            body,
            media,
            controls,
        }
    }

    /// Replace the displayed post with a newer snapshot of the same post.
    pub fn refresh(&mut self, post: Post) {
        if self.is_removed() {
            debug!(post_id = %self.post.id, "ignoring snapshot of a removed post");
            return;
        }
        if post.id != self.post.id {
            warn!(
                current = %self.post.id,
                incoming = %post.id,
                "ignoring snapshot of a different post"
            );
            return;
        }
        self.post = post;
    }

    pub fn begin_edit(&mut self) -> bool {
        if self.is_removed() {
            return false;
        }
        if !self.is_owner() {
            debug!(post_id = %self.post.id, "edit requested by non-owner");
            return false;
        }
        if self.is_editing() {
            return false;
        }

        self.state = CardState::Editing(EditSession {
            draft_body: self.post.body.clone(),
            pending_photo: None,
        });
        true
    }

    pub fn set_draft_body(&mut self, text: impl Into<String>) {
        if let CardState::Editing(session) = &mut self.state {
            session.draft_body = text.into();
        }
    }

    pub fn select_photo(&mut self, files: Vec<SelectedFile>, prompt: &dyn Prompt) -> PhotoSelection {
        let CardState::Editing(session) = &mut self.state else {
            return PhotoSelection::Ignored;
        };
        let Ok([file]) = <[SelectedFile; 1]>::try_from(files) else {
            return PhotoSelection::Ignored;
        };

        let size = file.size();
        let limit = self.settings.max_photo_bytes;
        if size > limit {
            session.pending_photo = None;
            info!(post_id = %self.post.id, file = %file.name, size, limit, "photo rejected");
            prompt.alert(PHOTO_TOO_LARGE);
            return PhotoSelection::Rejected { size, limit };
        }

        debug!(post_id = %self.post.id, file = %file.name, size, "photo selected");
        session.pending_photo = Some(file);
        PhotoSelection::Accepted
    }

    /// Single-button entry point: begins an edit while viewing, commits while
    /// editing.
    pub async fn toggle_edit(&mut self) -> EditToggle {
        if self.is_editing() {
            EditToggle::Committed(self.commit_edit().await)
        } else if self.begin_edit() {
            EditToggle::Began
        } else {
            EditToggle::Ignored
        }
    }

    /// Write the draft (and pending photo, if any) back to the stores.
    ///
    /// Unless the card was removed, it is back in [`CardState::Viewing`] with
    /// no pending photo when this returns, whatever the outcome.
    pub async fn commit_edit(&mut self) -> CommitOutcome {
        let session = match std::mem::take(&mut self.state) {
            CardState::Editing(session) => session,
            CardState::Removed => {
                self.state = CardState::Removed;
                return CommitOutcome::Removed;
            }
            CardState::Viewing => return CommitOutcome::NotEditing,
        };

        if !self.is_owner() {
            debug!(post_id = %self.post.id, "commit requested by non-owner");
            return CommitOutcome::NotOwner;
        }

        match self.apply_edit(session).await {
            Ok(patch) => {
                let photo_replaced = patch.photo_url.is_some();
                self.post.apply(&patch);
                info!(post_id = %self.post.id, photo_replaced, "post updated");
                CommitOutcome::Updated { photo_replaced }
            }
            Err(error) => {
                error!(post_id = %self.post.id, error = %error, "failed to update post");
                CommitOutcome::Failed
            }
        }
    }

    async fn apply_edit(&self, session: EditSession) -> Result<PostPatch, CardError> {
        let mut patch = PostPatch::body(session.draft_body);

        if let Some(photo) = session.pending_photo {
            let path = self.photo_path()?;

            match self.blobs.delete(&path).await {
                Ok(()) => {}
                Err(BlobError::NotFound(_)) => {
                    debug!(post_id = %self.post.id, "no previous photo to replace");
                }
                Err(error) => return Err(error.into()),
            }

            let handle = self.blobs.upload(&path, photo.bytes).await?;
            let url = self.blobs.url(&handle).await?;
            patch = patch.with_photo_url(url);
        }

        self.documents
            .update(
                &self.settings.collection,
                self.post.id.as_str(),
                patch.to_fields(),
            )
            .await?;

        Ok(patch)
    }

    /// Remove the post and its photo after the user confirms.
    ///
    /// Both removals are attempted even if the first fails; nothing is rolled
    /// back.
    pub async fn delete(&mut self, prompt: &dyn Prompt) -> DeleteOutcome {
        if self.is_removed() {
            return DeleteOutcome::Removed;
        }
        if !self.is_owner() {
            debug!(post_id = %self.post.id, "delete requested by non-owner");
            return DeleteOutcome::NotOwner;
        }
        if !prompt.confirm(DELETE_CONFIRMATION) {
            return DeleteOutcome::Cancelled;
        }

        let mut failed = false;

        if let Err(error) = self
            .documents
            .delete(&self.settings.collection, self.post.id.as_str())
            .await
        {
            error!(post_id = %self.post.id, error = %error, "failed to delete post document");
            failed = true;
        }

        if self.post.photo_url.is_some() {
            if let Err(error) = self.delete_photo().await {
                error!(post_id = %self.post.id, error = %error, "failed to delete post photo");
                failed = true;
            }
        }

        if failed {
            DeleteOutcome::Failed
        } else {
            info!(post_id = %self.post.id, "post deleted");
            self.state = CardState::Removed;
            DeleteOutcome::Deleted
        }
    }

    async fn delete_photo(&self) -> Result<(), CardError> {
        let path = self.photo_path()?;
        self.blobs.delete(&path).await?;
        Ok(())
    }

    fn photo_path(&self) -> Result<BlobPath, BlobError> {
        BlobPath::parse(self.post.photo_key(&self.settings.photo_prefix))
    }
}
