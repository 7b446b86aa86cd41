//! A card that shows one post and lets its author edit or delete it.
//!
//! [`TweetCard`] owns the transient edit state and talks to a
//! [`DocumentStore`](chirp_storage::DocumentStore) for the post record and a
//! [`BlobStore`](chirp_blobs::BlobStore) for its photo. Hosts draw the
//! [`CardView`] returned by [`TweetCard::view`].

mod card;
mod error;
mod photo;
mod view;

pub use card::{
    CardSettings, CardState, CommitOutcome, DELETE_CONFIRMATION, DeleteOutcome, EditSession,
    EditToggle, TweetCard,
};
pub use error::CardError;
pub use photo::{PHOTO_TOO_LARGE, PhotoSelection, SelectedFile};
pub use view::{BodyView, CardView, MediaView, OwnerControls, PHOTO_ACCEPT};
