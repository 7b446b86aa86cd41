pub mod config;
pub mod error;
pub mod identity;
pub mod post;
pub mod prompt;

pub use error::PostError;
pub use identity::{IdentityProvider, StaticIdentity};
pub use post::{Fields, Post, PostId, PostPatch, UserId};
pub use prompt::Prompt;
