use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use chirp_core::Fields;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::{sync::oneshot, task};
use tracing::{debug, info};

use crate::{Document, DocumentError, DocumentStore};

/// SQLite-backed document store.
///
/// Writes are serialised through a dedicated `document_writer` thread so that
/// a partial update (read, merge, write) is atomic with respect to every other
/// write. Reads open their own connection on the blocking pool.
#[derive(Debug)]
pub struct NativeDocumentStore {
    path: PathBuf,
    writer: Sender<WriteCommand>,
}

enum WriteCommand {
    Set {
        collection: String,
        id: String,
        data: String,
        response: oneshot::Sender<Result<(), DocumentError>>,
    },
    Merge {
        collection: String,
        id: String,
        fields: Fields,
        response: oneshot::Sender<Result<(), DocumentError>>,
    },
    Delete {
        collection: String,
        id: String,
        response: oneshot::Sender<Result<(), DocumentError>>,
    },
}

enum WriterState {
    Ready(Connection),
    Failed(String),
}

fn query_failed(error: rusqlite::Error) -> DocumentError {
    DocumentError::QueryFailed(error.to_string())
}

fn open_connection(path: &Path) -> Result<Connection, DocumentError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| DocumentError::ConnectionFailed {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
    }

    Connection::open(path).map_err(|error| DocumentError::ConnectionFailed {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

fn configure_connection(connection: &Connection, path: &Path) -> Result<(), DocumentError> {
    let failed = |error: rusqlite::Error| DocumentError::ConnectionFailed {
        path: path.to_path_buf(),
        reason: error.to_string(),
    };
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .map_err(failed)?;
    connection
        .busy_timeout(Duration::from_secs(5))
        .map_err(failed)?;
    Ok(())
}

fn open_native_connection(path: &Path) -> Result<Connection, DocumentError> {
    let connection = open_connection(path)?;
    configure_connection(&connection, path)?;
    Ok(connection)
}

fn decode(collection: &str, id: &str, raw: &str) -> Result<Fields, DocumentError> {
    serde_json::from_str(raw).map_err(|error| DocumentError::Corrupt {
        collection: collection.to_string(),
        id: id.to_string(),
        reason: error.to_string(),
    })
}

fn encode(fields: &Fields) -> Result<String, DocumentError> {
    serde_json::to_string(fields).map_err(|error| DocumentError::QueryFailed(error.to_string()))
}

fn set_document(
    connection: &Connection,
    collection: &str,
    id: &str,
    data: &str,
) -> Result<(), DocumentError> {
    let now = Utc::now().to_rfc3339();
    connection
        .execute(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![collection, id, data, now],
        )
        .map_err(query_failed)?;
    Ok(())
}

fn merge_document(
    connection: &Connection,
    collection: &str,
    id: &str,
    fields: Fields,
) -> Result<(), DocumentError> {
    let tx = connection.unchecked_transaction().map_err(query_failed)?;

    let existing: Option<String> = tx
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()
        .map_err(query_failed)?;

    let Some(raw) = existing else {
        return Err(DocumentError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    };

    let mut current = decode(collection, id, &raw)?;
    current.extend(fields);
    let data = encode(&current)?;

    tx.execute(
        "UPDATE documents SET data = ?1, updated_at = ?2 WHERE collection = ?3 AND id = ?4",
        params![data, Utc::now().to_rfc3339(), collection, id],
    )
    .map_err(query_failed)?;

    tx.commit().map_err(query_failed)
}

fn delete_document(
    connection: &Connection,
    collection: &str,
    id: &str,
) -> Result<(), DocumentError> {
    let removed = connection
        .execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )
        .map_err(query_failed)?;
    debug!(collection, id, removed, "deleted document");
    Ok(())
}

fn select_document(
    connection: &Connection,
    collection: &str,
    id: &str,
) -> Result<Option<Fields>, DocumentError> {
    let raw: Option<String> = connection
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()
        .map_err(query_failed)?;

    raw.map(|raw| decode(collection, id, &raw)).transpose()
}

fn select_collection(
    connection: &Connection,
    collection: &str,
) -> Result<Vec<Document>, DocumentError> {
    let mut statement = connection
        .prepare(
            "SELECT id, data FROM documents WHERE collection = ?1 \
             ORDER BY created_at DESC, rowid DESC",
        )
        .map_err(query_failed)?;
    let rows = statement
        .query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(query_failed)?;

    let mut output = Vec::new();
    for row in rows {
        let (id, raw) = row.map_err(query_failed)?;
        let fields = decode(collection, &id, &raw)?;
        output.push(Document { id, fields });
    }
    Ok(output)
}

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("../migrations/001_documents.sql"),
}];

fn run_migrations(connection: &Connection) -> Result<(), DocumentError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(|error| DocumentError::MigrationFailed {
            version: 0,
            reason: format!("failed to create _migrations table: {error}"),
        })?;

    for migration in MIGRATIONS {
        let failed = |reason: String| DocumentError::MigrationFailed {
            version: migration.version,
            reason,
        };

        let is_applied: i64 = connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = ?1)",
                params![migration.version],
                |row| row.get(0),
            )
            .map_err(|error| failed(format!("failed to query migration state: {error}")))?;

        if is_applied != 0 {
            continue;
        }

        let tx = connection
            .unchecked_transaction()
            .map_err(|error| failed(format!("failed to begin transaction: {error}")))?;

        tx.execute_batch(migration.sql)
            .map_err(|error| failed(error.to_string()))?;

        tx.execute(
            "INSERT INTO _migrations (version) VALUES (?1)",
            params![migration.version],
        )
        .map_err(|error| failed(format!("failed to record migration: {error}")))?;

        tx.commit()
            .map_err(|error| failed(format!("failed to commit migration: {error}")))?;

        info!(version = migration.version, "applied migration");
    }

    Ok(())
}

fn run_writer(path: PathBuf, receiver: Receiver<WriteCommand>) {
    let state = match open_native_connection(&path) {
        Ok(connection) => WriterState::Ready(connection),
        Err(error) => WriterState::Failed(error.to_string()),
    };

    let unavailable = |reason: &str| DocumentError::ConnectionFailed {
        path: path.clone(),
        reason: reason.to_string(),
    };

    while let Ok(command) = receiver.recv() {
        match command {
            WriteCommand::Set {
                collection,
                id,
                data,
                response,
            } => {
                let result = match &state {
                    WriterState::Ready(connection) => {
                        set_document(connection, &collection, &id, &data)
                    }
                    WriterState::Failed(reason) => Err(unavailable(reason)),
                };
                let _ = response.send(result);
            }
            WriteCommand::Merge {
                collection,
                id,
                fields,
                response,
            } => {
                let result = match &state {
                    WriterState::Ready(connection) => {
                        merge_document(connection, &collection, &id, fields)
                    }
                    WriterState::Failed(reason) => Err(unavailable(reason)),
                };
                let _ = response.send(result);
            }
            WriteCommand::Delete {
                collection,
                id,
                response,
            } => {
                let result = match &state {
                    WriterState::Ready(connection) => {
                        delete_document(connection, &collection, &id)
                    }
                    WriterState::Failed(reason) => Err(unavailable(reason)),
                };
                let _ = response.send(result);
            }
        }
    }
}

impl NativeDocumentStore {
    pub async fn open(path: &Path) -> Result<Self, DocumentError> {
        let path = path.to_path_buf();
        let setup_path = path.clone();

        task::spawn_blocking(move || {
            let connection = open_native_connection(&setup_path)?;
            run_migrations(&connection)?;
            Ok(())
        })
        .await
        .map_err(|error| DocumentError::ConnectionFailed {
            path: path.clone(),
            reason: format!("failed to join storage setup task: {error}"),
        })??;

        let (writer, receiver) = mpsc::channel();
        let writer_path = path.clone();

        thread::Builder::new()
            .name("document_writer".to_string())
            .spawn(move || run_writer(writer_path, receiver))
            .map_err(|error| DocumentError::ConnectionFailed {
                path: path.clone(),
                reason: format!("failed to spawn document_writer thread: {error}"),
            })?;

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<(), DocumentError>>) -> WriteCommand,
    ) -> Result<(), DocumentError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.writer.send(build(response_tx)).map_err(|_| {
            DocumentError::QueryFailed("document writer thread is unavailable".to_string())
        })?;

        response_rx.await.map_err(|_| {
            DocumentError::QueryFailed(
                "document writer thread terminated before responding".to_string(),
            )
        })?
    }

    async fn read<T, F>(&self, f: F) -> Result<T, DocumentError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DocumentError> + Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let connection = open_native_connection(&path)?;
            f(&connection)
        })
        .await
        .map_err(|error| DocumentError::QueryFailed(format!("failed to join query task: {error}")))?
    }
}

impl DocumentStore for NativeDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DocumentError> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.read(move |connection| select_document(connection, &collection, &id))
            .await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        let collection = collection.to_string();
        self.read(move |connection| select_collection(connection, &collection))
            .await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DocumentError> {
        let data = encode(&fields)?;
        self.write(|response| WriteCommand::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            response,
        })
        .await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentError> {
        self.write(|response| WriteCommand::Merge {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
            response,
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentError> {
        self.write(|response| WriteCommand::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
            response,
        })
        .await
    }
}
