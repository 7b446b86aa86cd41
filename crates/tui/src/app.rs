use std::path::Path;
use std::sync::Arc;

use chirp_blobs::BlobStore;
use chirp_card::{
    CardSettings, CardView, CommitOutcome, DeleteOutcome, EditToggle, PhotoSelection,
    SelectedFile, TweetCard,
};
use chirp_core::{IdentityProvider, Post, PostId};
use chirp_storage::DocumentStore;
use crossterm::event::{self, Event as CrosstermEvent, EventStream};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::error::TuiError;
use crate::input::{self, Action};
use crate::prompt::ModalPrompt;
use crate::state::{AppState, InputMode};
use crate::ui;

/// Mount one card per stored post, newest first. Documents that do not decode
/// as posts are skipped.
pub async fn load_cards<D, B>(
    documents: Arc<D>,
    blobs: Arc<B>,
    identity: Arc<dyn IdentityProvider>,
    settings: &CardSettings,
) -> Result<Vec<TweetCard<D, B>>, TuiError>
where
    D: DocumentStore,
    B: BlobStore,
{
    let stored = documents.list(&settings.collection).await?;
    let mut cards = Vec::with_capacity(stored.len());

    for document in stored {
        match Post::from_document(PostId::new(document.id), &document.fields) {
            Ok(post) => cards.push(TweetCard::new(
                post,
                Arc::clone(&identity),
                Arc::clone(&documents),
                Arc::clone(&blobs),
                settings.clone(),
            )),
            Err(error) => warn!(error = %error, "skipping undecodable post"),
        }
    }

    info!(count = cards.len(), collection = %settings.collection, "loaded posts");
    Ok(cards)
}

pub struct TuiApp;

impl TuiApp {
    pub async fn run<D, B>(
        cards: Vec<TweetCard<D, B>>,
        viewer: Option<String>,
    ) -> Result<(), TuiError>
    where
        D: DocumentStore,
        B: BlobStore,
    {
        let mut terminal =
            ratatui::try_init().map_err(|e| TuiError::TerminalInit(e.to_string()))?;
        let result = run_loop(&mut terminal, cards, viewer).await;
        ratatui::restore();
        result
    }
}

async fn run_loop<D, B>(
    terminal: &mut DefaultTerminal,
    mut cards: Vec<TweetCard<D, B>>,
    viewer: Option<String>,
) -> Result<(), TuiError>
where
    D: DocumentStore,
    B: BlobStore,
{
    let mut state = AppState::new(cards.len(), viewer);
    let mut reader = EventStream::new();

    loop {
        let views: Vec<CardView> = cards.iter().map(TweetCard::view).collect();
        terminal
            .draw(|frame| ui::draw(frame, &state, &views))
            .map_err(|e| TuiError::Render(e.to_string()))?;

        let Some(terminal_event) = reader.next().await else {
            break;
        };
        if let CrosstermEvent::Key(key) = terminal_event? {
            if key.kind != event::KeyEventKind::Press {
                continue;
            }
            let action = input::handle_key(&mut state, key);
            handle_action(&mut state, &mut cards, action).await;
            if state.should_quit {
                break;
            }
        }
    }

    Ok(())
}

pub async fn handle_action<D, B>(
    state: &mut AppState,
    cards: &mut Vec<TweetCard<D, B>>,
    action: Action,
) where
    D: DocumentStore,
    B: BlobStore,
{
    let index = state.selected;
    let Some(card) = cards.get_mut(index) else {
        return;
    };

    match action {
        Action::None | Action::Quit => {}
        Action::ToggleEdit => match card.toggle_edit().await {
            EditToggle::Began => {
                state.input_mode = InputMode::Editing;
                state.set_status("editing");
            }
            EditToggle::Ignored => state.set_status("only the author can edit this post"),
            EditToggle::Committed(outcome) => {
                state.input_mode = InputMode::Normal;
                state.status = match outcome {
                    CommitOutcome::Updated {
                        photo_replaced: true,
                    } => Some("saved with new photo".to_string()),
                    CommitOutcome::Updated {
                        photo_replaced: false,
                    } => Some("saved".to_string()),
                    CommitOutcome::Failed
                    | CommitOutcome::NotOwner
                    | CommitOutcome::NotEditing
                    | CommitOutcome::Removed => None,
                };
            }
        },
        Action::Type(c) => {
            if let Some(draft) = card.draft_body() {
                let mut draft = draft.to_string();
                draft.push(c);
                card.set_draft_body(draft);
            }
        }
        Action::Backspace => {
            if let Some(draft) = card.draft_body() {
                let mut draft = draft.to_string();
                draft.pop();
                card.set_draft_body(draft);
            }
        }
        Action::AttachPhoto(path) => {
            let file = match read_photo(&path, card.max_photo_bytes()).await {
                Ok(file) => file,
                Err(message) => {
                    state.set_status(message);
                    return;
                }
            };
            let name = file.name.clone();
            let prompt = ModalPrompt::answered(false);
            match card.select_photo(vec![file], &prompt) {
                PhotoSelection::Accepted => state.set_status(format!("attached {name}")),
                PhotoSelection::Rejected { .. } => state.alert = prompt.take_alert(),
                PhotoSelection::Ignored => {}
            }
        }
        Action::RequestDelete => {
            if card.is_owner() {
                state.input_mode = InputMode::ConfirmDelete;
            } else {
                state.set_status("only the author can delete this post");
            }
        }
        Action::Delete { confirmed } => {
            let prompt = ModalPrompt::answered(confirmed);
            match card.delete(&prompt).await {
                DeleteOutcome::Deleted => {
                    cards.remove(index);
                    state.set_card_count(cards.len());
                    state.set_status("deleted");
                }
                DeleteOutcome::Cancelled => state.set_status("kept"),
                DeleteOutcome::Failed | DeleteOutcome::Removed => state.status = None,
                DeleteOutcome::NotOwner => {
                    state.set_status("only the author can delete this post")
                }
            }
        }
    }
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Read a picked file from disk. Only image types pass the picker filter.
///
/// At most `limit + 1` bytes are read: enough for the card to reject an
/// oversized file without loading all of it.
async fn read_photo(path: &Path, limit: u64) -> Result<SelectedFile, String> {
    let Some(content_type) = image_content_type(path) else {
        return Err(format!("{} is not an image", path.display()));
    };
    let unreadable = |error: std::io::Error| format!("cannot read {}: {error}", path.display());

    let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
    let wanted = size.min(limit.saturating_add(1));
    if size > limit {
        debug!(path = %path.display(), size, limit, "reading only the head of an oversized photo");
    }

    let file = tokio::fs::File::open(path).await.map_err(unreadable)?;
    let mut bytes = Vec::with_capacity(usize::try_from(wanted).unwrap_or_default());
    file.take(wanted)
        .read_to_end(&mut bytes)
        .await
        .map_err(unreadable)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SelectedFile::new(name, bytes).with_content_type(content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_core::{StaticIdentity, UserId};
    use chirp_test_support::fakes::{DocumentCall, DocumentOp, RecordingBlobs, RecordingDocuments};
    use serde_json::json;

    type Card = TweetCard<RecordingDocuments, RecordingBlobs>;

    struct Harness {
        documents: Arc<RecordingDocuments>,
        blobs: Arc<RecordingBlobs>,
        cards: Vec<Card>,
        state: AppState,
    }

    async fn harness(viewer: Option<&str>, settings: CardSettings) -> Harness {
        let documents = Arc::new(RecordingDocuments::new());
        let blobs = Arc::new(RecordingBlobs::new());
        let post = Post {
            id: PostId::new("t1"),
            author_id: UserId::new("u1"),
            author_display_name: "Alice".into(),
            photo_url: None,
            body: "hello".into(),
        };
        documents
            .seed(&settings.collection, "t1", post.to_document())
            .await;

        let identity: Arc<dyn IdentityProvider> = match viewer {
            Some(uid) => Arc::new(StaticIdentity::signed_in(uid)),
            None => Arc::new(StaticIdentity::anonymous()),
        };
        let cards = load_cards(
            Arc::clone(&documents),
            Arc::clone(&blobs),
            identity,
            &settings,
        )
        .await
        .unwrap();
        let state = AppState::new(cards.len(), viewer.map(str::to_string));

        Harness {
            documents,
            blobs,
            cards,
            state,
        }
    }

    impl Harness {
        async fn act(&mut self, action: Action) {
            handle_action(&mut self.state, &mut self.cards, action).await;
        }
    }

    #[tokio::test]
    async fn load_skips_documents_that_are_not_posts() {
        let documents = Arc::new(RecordingDocuments::new());
        let settings = CardSettings::default();
        documents
            .seed(
                &settings.collection,
                "broken",
                json!({"body": "no author"}).as_object().unwrap().clone(),
            )
            .await;

        let cards = load_cards(
            documents,
            Arc::new(RecordingBlobs::new()),
            Arc::new(StaticIdentity::anonymous()),
            &settings,
        )
        .await
        .unwrap();

        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn edit_type_and_save_updates_body() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;

        h.act(Action::ToggleEdit).await;
        assert_eq!(h.state.input_mode, InputMode::Editing);
        for c in " world".chars() {
            h.act(Action::Type(c)).await;
        }
        h.act(Action::Type('!')).await;
        h.act(Action::Backspace).await;
        h.act(Action::ToggleEdit).await;

        assert_eq!(h.state.input_mode, InputMode::Normal);
        assert_eq!(h.state.status.as_deref(), Some("saved"));
        assert_eq!(h.cards[0].post().body, "hello world");
        let updates: Vec<_> = h
            .documents
            .calls()
            .into_iter()
            .filter(|call| matches!(call, DocumentCall::Update { .. }))
            .collect();
        assert_eq!(
            updates,
            vec![DocumentCall::Update {
                collection: "tweets".into(),
                id: "t1".into(),
                fields: json!({"body": "hello world"}).as_object().unwrap().clone(),
            }]
        );
        assert!(h.blobs.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_save_is_not_shown_to_the_user() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;
        h.documents.fail_on(DocumentOp::Update);

        h.act(Action::ToggleEdit).await;
        h.act(Action::Type('!')).await;
        h.act(Action::ToggleEdit).await;

        assert_eq!(h.state.input_mode, InputMode::Normal);
        assert!(h.state.status.is_none());
        assert!(h.state.alert.is_none());
        assert_eq!(h.cards[0].post().body, "hello");
    }

    #[tokio::test]
    async fn failed_delete_is_not_shown_to_the_user() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;
        h.documents.fail_on(DocumentOp::Delete);

        h.act(Action::Delete { confirmed: true }).await;

        assert!(h.state.status.is_none());
        assert!(h.state.alert.is_none());
        assert_eq!(h.cards.len(), 1);
    }

    #[tokio::test]
    async fn oversized_file_is_read_only_up_to_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        std::fs::write(&path, vec![0u8; 64 * 1024]).unwrap();

        let file = read_photo(&path, 10).await.unwrap();
        assert_eq!(file.size(), 11);

        let file = read_photo(&path, 1_000_000).await.unwrap();
        assert_eq!(file.size(), 64 * 1024);
    }

    #[tokio::test]
    async fn non_owner_cannot_start_edit_or_delete() {
        let mut h = harness(Some("u2"), CardSettings::default()).await;

        h.act(Action::ToggleEdit).await;
        assert_eq!(h.state.input_mode, InputMode::Normal);

        h.act(Action::RequestDelete).await;
        assert_eq!(h.state.input_mode, InputMode::Normal);
        assert_eq!(
            h.state.status.as_deref(),
            Some("only the author can delete this post")
        );
    }

    #[tokio::test]
    async fn confirmed_delete_unmounts_card() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;

        h.act(Action::RequestDelete).await;
        assert_eq!(h.state.input_mode, InputMode::ConfirmDelete);
        h.state.input_mode = InputMode::Normal;
        h.act(Action::Delete { confirmed: true }).await;

        assert!(h.cards.is_empty());
        assert_eq!(h.state.card_count, 0);
        assert!(h.documents.stored("tweets", "t1").await.is_none());
    }

    #[tokio::test]
    async fn declined_delete_keeps_card() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;

        h.act(Action::Delete { confirmed: false }).await;

        assert_eq!(h.cards.len(), 1);
        assert_eq!(h.state.status.as_deref(), Some("kept"));
        assert!(h.documents.stored("tweets", "t1").await.is_some());
    }

    #[tokio::test]
    async fn oversized_photo_raises_alert() {
        let settings = CardSettings {
            max_photo_bytes: 4,
            ..CardSettings::default()
        };
        let mut h = harness(Some("u1"), settings).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, b"12345").unwrap();

        h.act(Action::ToggleEdit).await;
        h.act(Action::AttachPhoto(path)).await;

        assert_eq!(
            h.state.alert.as_deref(),
            Some(chirp_card::PHOTO_TOO_LARGE)
        );
        assert!(h.cards[0].pending_photo().is_none());
    }

    #[tokio::test]
    async fn attached_photo_is_uploaded_on_save() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.JPG");
        std::fs::write(&path, b"jpeg").unwrap();

        h.act(Action::ToggleEdit).await;
        h.act(Action::AttachPhoto(path)).await;
        assert_eq!(h.state.status.as_deref(), Some("attached cat.JPG"));
        assert_eq!(
            h.cards[0]
                .pending_photo()
                .and_then(|file| file.content_type.as_deref()),
            Some("image/jpeg")
        );
        h.act(Action::ToggleEdit).await;

        assert_eq!(h.state.status.as_deref(), Some("saved with new photo"));
        assert!(h.blobs.contains("tweets/u1/t1").await);
    }

    #[tokio::test]
    async fn non_image_files_are_not_offered_to_the_card() {
        let mut h = harness(Some("u1"), CardSettings::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"text").unwrap();

        h.act(Action::ToggleEdit).await;
        h.act(Action::AttachPhoto(path)).await;

        assert!(h.cards[0].pending_photo().is_none());
        assert!(
            h.state
                .status
                .as_deref()
                .is_some_and(|status| status.ends_with("is not an image"))
        );
    }
}
