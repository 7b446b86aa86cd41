use std::path::PathBuf;

use chirp_blobs::{BlobPath, BlobStore};
use chirp_card::CardSettings;
use chirp_core::{Post, PostId, UserId};
use chirp_storage::DocumentStore;
use tracing::info;

use crate::error::TuiError;

#[derive(Debug, Clone, clap::Args)]
pub struct SeedArgs {
    /// Post id; a random UUID when omitted.
    #[arg(long)]
    pub id: Option<String>,

    /// Author uid.
    #[arg(long)]
    pub author: String,

    /// Author display name; defaults to `identity.display_name`, then the uid.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub body: String,

    /// Image file to upload as the post's photo.
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

/// Write one post document, uploading its photo first when given.
pub async fn seed<D, B>(
    args: SeedArgs,
    default_name: Option<&str>,
    documents: &D,
    blobs: &B,
    settings: &CardSettings,
) -> Result<Post, TuiError>
where
    D: DocumentStore,
    B: BlobStore,
{
    let id = args
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let author_display_name = args
        .name
        .or_else(|| default_name.map(str::to_string))
        .unwrap_or_else(|| args.author.clone());

    let mut post = Post {
        id: PostId::new(id),
        author_id: UserId::new(args.author),
        author_display_name,
        photo_url: None,
        body: args.body,
    };

    if let Some(photo) = args.photo {
        let bytes = tokio::fs::read(&photo).await?;
        let path = BlobPath::parse(post.photo_key(&settings.photo_prefix))?;
        let handle = blobs.upload(&path, bytes.into()).await?;
        post.photo_url = Some(blobs.url(&handle).await?);
    }

    documents
        .set(&settings.collection, post.id.as_str(), post.to_document())
        .await?;
    info!(post_id = %post.id, author = %post.author_id, photo = post.photo_url.is_some(), "seeded post");

    Ok(post)
}
