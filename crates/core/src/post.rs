use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PostError;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

pub const AUTHOR_ID_FIELD: &str = "authorId";
pub const AUTHOR_DISPLAY_NAME_FIELD: &str = "authorDisplayName";
pub const BODY_FIELD: &str = "body";
pub const PHOTO_URL_FIELD: &str = "photoUrl";

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(PostId);
string_id!(UserId);

/// A short text entry with at most one photo, owned by exactly one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub author_display_name: String,
    pub photo_url: Option<String>,
    pub body: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument {
    author_id: UserId,
    author_display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    body: String,
}

impl Post {
    pub fn from_document(id: PostId, fields: &Fields) -> Result<Self, PostError> {
        let document: PostDocument = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|error| PostError::InvalidDocument {
                id: id.to_string(),
                reason: error.to_string(),
            })?;

        Ok(Self {
            id,
            author_id: document.author_id,
            author_display_name: document.author_display_name,
            photo_url: document.photo_url,
            body: document.body,
        })
    }

    pub fn to_document(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            AUTHOR_ID_FIELD.to_string(),
            Value::String(self.author_id.to_string()),
        );
        fields.insert(
            AUTHOR_DISPLAY_NAME_FIELD.to_string(),
            Value::String(self.author_display_name.clone()),
        );
        fields.insert(BODY_FIELD.to_string(), Value::String(self.body.clone()));
        if let Some(url) = &self.photo_url {
            fields.insert(PHOTO_URL_FIELD.to_string(), Value::String(url.clone()));
        }
        fields
    }

    pub fn is_owned_by(&self, uid: Option<&UserId>) -> bool {
        uid == Some(&self.author_id)
    }

    /// Blob key of this post's photo: `{prefix}/{authorId}/{postId}`.
    pub fn photo_key(&self, prefix: &str) -> String {
        format!("{prefix}/{}/{}", self.author_id, self.id)
    }

    pub fn apply(&mut self, patch: &PostPatch) {
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(url) = &patch.photo_url {
            self.photo_url = Some(url.clone());
        }
    }
}

/// Partial update of a post. Members left as `None` are not written, so the
/// stored value stays untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub body: Option<String>,
    pub photo_url: Option<String>,
}

impl PostPatch {
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            photo_url: None,
        }
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        if let Some(body) = &self.body {
            fields.insert(BODY_FIELD.to_string(), Value::String(body.clone()));
        }
        if let Some(url) = &self.photo_url {
            fields.insert(PHOTO_URL_FIELD.to_string(), Value::String(url.clone()));
        }
        fields
    }
}
