use std::sync::atomic::{AtomicU64, Ordering};

use chirp_core::Fields;
use dashmap::DashMap;

use crate::{Document, DocumentError, DocumentStore};

#[derive(Debug, Clone)]
struct Entry {
    sequence: u64,
    fields: Fields,
}

/// Process-local document store. Insertion order stands in for creation time.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<(String, String), Entry>,
    sequence: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(collection: &str, id: &str) -> (String, String) {
    (collection.to_string(), id.to_string())
}

impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DocumentError> {
        Ok(self
            .documents
            .get(&key(collection, id))
            .map(|entry| entry.fields.clone()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        let mut entries: Vec<(u64, Document)> = self
            .documents
            .iter()
            .filter(|item| item.key().0 == collection)
            .map(|item| {
                (
                    item.value().sequence,
                    Document {
                        id: item.key().1.clone(),
                        fields: item.value().fields.clone(),
                    },
                )
            })
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, document)| document).collect())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DocumentError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.documents
            .entry(key(collection, id))
            .and_modify(|entry| entry.fields = fields.clone())
            .or_insert(Entry { sequence, fields });
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentError> {
        match self.documents.get_mut(&key(collection, id)) {
            Some(mut entry) => {
                entry.fields.extend(fields);
                Ok(())
            }
            None => Err(DocumentError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentError> {
        self.documents.remove(&key(collection, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryDocumentStore::new();
        store
            .set("tweets", "t1", fields(json!({"body": "hello", "photoUrl": "http://p"})))
            .await
            .unwrap();

        store
            .update("tweets", "t1", fields(json!({"body": "hello world"})))
            .await
            .unwrap();

        let stored = store.get("tweets", "t1").await.unwrap().unwrap();
        assert_eq!(stored.get("body"), Some(&json!("hello world")));
        assert_eq!(stored.get("photoUrl"), Some(&json!("http://p")));
    }

    #[tokio::test]
    async fn update_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update("tweets", "nope", fields(json!({"body": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { ref id, .. } if id == "nope"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store
            .set("tweets", "t1", fields(json!({"body": "x"})))
            .await
            .unwrap();
        store.delete("tweets", "t1").await.unwrap();
        store.delete("tweets", "t1").await.unwrap();
        assert!(store.get("tweets", "t1").await.unwrap().is_none());
        assert!(store.list("tweets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let store = MemoryDocumentStore::new();
        store
            .set("tweets", "t1", fields(json!({"body": "first"})))
            .await
            .unwrap();
        store
            .set("drafts", "d1", fields(json!({"body": "elsewhere"})))
            .await
            .unwrap();
        store
            .set("tweets", "t2", fields(json!({"body": "second"})))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list("tweets")
            .await
            .unwrap()
            .into_iter()
            .map(|document| document.id)
            .collect();
        assert_eq!(ids, vec!["t2".to_string(), "t1".to_string()]);
    }
}
