#[cfg(all(test, feature = "native"))]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use bytes::Bytes;
    use serde_json::json;
    use tempfile::TempDir;

    use chirp_blobs::{BlobPath, BlobStore, ObjectBlobStore};
    use chirp_card::{
        CardSettings, CommitOutcome, DeleteOutcome, PHOTO_TOO_LARGE, PhotoSelection,
        SelectedFile, TweetCard,
    };
    use chirp_core::config::Config;
    use chirp_core::{IdentityProvider, Post, PostId, StaticIdentity};
    use chirp_storage::{DocumentStore, NativeDocumentStore};
    use chirp_test_support::fakes::ScriptedPrompt;
    use chirp_test_support::fixtures;

    const PUBLIC_URL: &str = "https://cdn.example.com";

    type LocalCard = TweetCard<NativeDocumentStore, ObjectBlobStore>;

    struct Stores {
        dir: TempDir,
        documents: Arc<NativeDocumentStore>,
        blobs: Arc<ObjectBlobStore>,
    }

    impl Stores {
        fn blob_file(&self, key: &str) -> std::path::PathBuf {
            self.dir.path().join("blobs").join(key)
        }
    }

    async fn setup_stores() -> Stores {
        let dir = TempDir::new().expect("failed to create temp dir");
        let documents = chirp_storage::open_document_store(&dir.path().join("chirp.db"))
            .await
            .expect("failed to open document store");
        let blobs = ObjectBlobStore::local(&dir.path().join("blobs"), PUBLIC_URL)
            .expect("failed to open blob store");
        Stores {
            dir,
            documents: Arc::new(documents),
            blobs: Arc::new(blobs),
        }
    }

    /// Store a fixture post under `id` and mount a card for it.
    async fn mount(stores: &Stores, fixture: &str, id: &str, config: &Config) -> LocalCard {
        let settings = CardSettings::from(&config.card);
        let fields = fixtures::post_fields(fixture);
        stores
            .documents
            .set(&settings.collection, id, fields.clone())
            .await
            .unwrap();

        let identity: Arc<dyn IdentityProvider> = match &config.identity.uid {
            Some(uid) => Arc::new(StaticIdentity::signed_in(uid.as_str())),
            None => Arc::new(StaticIdentity::anonymous()),
        };
        let post = Post::from_document(PostId::new(id), &fields).unwrap();
        TweetCard::new(
            post,
            identity,
            Arc::clone(&stores.documents),
            Arc::clone(&stores.blobs),
            settings,
        )
    }

    fn owner_config() -> Config {
        fixtures::config("owner.toml")
    }

    // ── Edit ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn body_only_edit_leaves_photo_and_author_untouched() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "with-photo.json", "t1", &owner_config()).await;

        assert!(card.begin_edit());
        card.set_draft_body("look at this cat!!");
        assert_eq!(
            card.commit_edit().await,
            CommitOutcome::Updated {
                photo_replaced: false
            }
        );

        let stored = stores.documents.get("tweets", "t1").await.unwrap().unwrap();
        assert_eq!(stored.get("body"), Some(&json!("look at this cat!!")));
        assert_eq!(
            stored.get("photoUrl"),
            Some(&json!("https://cdn.example.com/tweets/u1/with-photo?v=1"))
        );
        assert_eq!(stored.get("authorId"), Some(&json!("u1")));
        assert_eq!(stored.get("authorDisplayName"), Some(&json!("Alice")));
    }

    #[tokio::test]
    async fn edit_with_photo_uploads_file_and_records_url() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "text-only.json", "t1", &owner_config()).await;
        let prompt = ScriptedPrompt::confirming();

        card.begin_edit();
        card.set_draft_body("hello with cat");
        let selection = card.select_photo(
            vec![SelectedFile::new("cat.png", Bytes::from_static(b"png-bytes"))],
            &prompt,
        );
        assert_eq!(selection, PhotoSelection::Accepted);
        assert_eq!(
            card.commit_edit().await,
            CommitOutcome::Updated {
                photo_replaced: true
            }
        );

        assert_eq!(
            std::fs::read(stores.blob_file("tweets/u1/t1")).unwrap(),
            b"png-bytes"
        );
        let stored = stores.documents.get("tweets", "t1").await.unwrap().unwrap();
        let url = stored.get("photoUrl").and_then(|v| v.as_str()).unwrap();
        assert!(url.starts_with("https://cdn.example.com/tweets/u1/t1"), "{url}");
        assert_eq!(card.post().photo_url.as_deref(), Some(url));
        assert!(!card.is_editing());
    }

    #[tokio::test]
    async fn replacing_photo_overwrites_previous_blob() {
        let stores = setup_stores().await;
        let path = BlobPath::parse("tweets/u1/t1").unwrap();
        stores
            .blobs
            .upload(&path, Bytes::from_static(b"old"))
            .await
            .unwrap();
        let mut card = mount(&stores, "with-photo.json", "t1", &owner_config()).await;
        let prompt = ScriptedPrompt::confirming();

        card.begin_edit();
        card.select_photo(
            vec![SelectedFile::new("new.png", Bytes::from_static(b"new"))],
            &prompt,
        );
        card.commit_edit().await;

        assert_eq!(std::fs::read(stores.blob_file("tweets/u1/t1")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn photo_limit_applies_at_one_megabyte() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "text-only.json", "t1", &owner_config()).await;
        let prompt = ScriptedPrompt::confirming();
        card.begin_edit();

        let too_big = SelectedFile::new("big.jpg", vec![0u8; 1_000_001]);
        assert!(matches!(
            card.select_photo(vec![too_big], &prompt),
            PhotoSelection::Rejected { .. }
        ));
        assert_eq!(prompt.alerts(), vec![PHOTO_TOO_LARGE.to_string()]);

        let just_fits = SelectedFile::new("ok.jpg", vec![0u8; 1_000_000]);
        assert_eq!(
            card.select_photo(vec![just_fits], &prompt),
            PhotoSelection::Accepted
        );
        card.commit_edit().await;

        let metadata = std::fs::metadata(stores.blob_file("tweets/u1/t1")).unwrap();
        assert_eq!(metadata.len(), 1_000_000);
    }

    #[tokio::test]
    async fn edits_survive_reopening_the_database() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "text-only.json", "t1", &owner_config()).await;

        card.begin_edit();
        card.set_draft_body("hello world");
        card.commit_edit().await;

        let reopened = NativeDocumentStore::open(&stores.dir.path().join("chirp.db"))
            .await
            .unwrap();
        let stored = reopened.get("tweets", "t1").await.unwrap().unwrap();
        assert_eq!(stored.get("body"), Some(&json!("hello world")));
    }

    // ── Delete ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_removes_row_and_photo_file() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "text-only.json", "t1", &owner_config()).await;
        let prompt = ScriptedPrompt::confirming();
        card.begin_edit();
        card.select_photo(
            vec![SelectedFile::new("cat.png", Bytes::from_static(b"png"))],
            &prompt,
        );
        card.commit_edit().await;
        assert!(stores.blob_file("tweets/u1/t1").exists());

        assert_eq!(card.delete(&prompt).await, DeleteOutcome::Deleted);

        assert!(stores.documents.get("tweets", "t1").await.unwrap().is_none());
        assert!(!stores.blob_file("tweets/u1/t1").exists());
        assert!(stores.documents.list("tweets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_with_missing_photo_file_still_removes_row() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "with-photo.json", "t1", &owner_config()).await;
        let prompt = ScriptedPrompt::confirming();

        assert_eq!(card.delete(&prompt).await, DeleteOutcome::Failed);

        assert!(stores.documents.get("tweets", "t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn declined_delete_keeps_everything() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "text-only.json", "t1", &owner_config()).await;
        let prompt = ScriptedPrompt::declining();

        assert_eq!(card.delete(&prompt).await, DeleteOutcome::Cancelled);

        assert_eq!(
            prompt.confirmations(),
            vec!["Are you sure you want to delete this tweet?".to_string()]
        );
        assert!(stores.documents.get("tweets", "t1").await.unwrap().is_some());
    }

    // ── Ownership ────────────────────────────────────────────────────

    #[tokio::test]
    async fn non_owner_cannot_touch_someone_elses_post() {
        let stores = setup_stores().await;
        let mut card = mount(&stores, "someone-else.json", "t9", &owner_config()).await;
        let prompt = ScriptedPrompt::confirming();

        assert!(card.view().controls.is_none());
        assert!(!card.begin_edit());
        assert_eq!(card.delete(&prompt).await, DeleteOutcome::NotOwner);

        assert!(prompt.confirmations().is_empty());
        let stored = stores.documents.get("tweets", "t9").await.unwrap().unwrap();
        assert_eq!(stored, fixtures::post_fields("someone-else.json"));
    }

    #[tokio::test]
    async fn signed_out_viewer_sees_read_only_cards() {
        let stores = setup_stores().await;
        let card = mount(&stores, "text-only.json", "t1", &Config::default()).await;

        let view = card.view();
        assert!(view.controls.is_none());
        assert_eq!(view.author, "Alice");
    }

    #[tokio::test]
    async fn configured_limit_and_collection_are_honoured() {
        let stores = setup_stores().await;
        let mut config = owner_config();
        config.card.collection = "drafts".into();
        config.card.max_photo_bytes = 3;
        let mut card = mount(&stores, "text-only.json", "d1", &config).await;
        let prompt = ScriptedPrompt::confirming();

        card.begin_edit();
        assert!(matches!(
            card.select_photo(
                vec![SelectedFile::new("a.png", Bytes::from_static(b"four"))],
                &prompt
            ),
            PhotoSelection::Rejected { size: 4, limit: 3 }
        ));
        card.set_draft_body("draft edit");
        card.commit_edit().await;

        let stored = stores.documents.get("drafts", "d1").await.unwrap().unwrap();
        assert_eq!(stored.get("body"), Some(&json!("draft edit")));
        assert!(stores.documents.get("tweets", "d1").await.unwrap().is_none());
        assert!(!Path::new(&stores.blob_file("tweets/u1/d1")).exists());
    }
}
