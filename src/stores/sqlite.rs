//! SQLite document store with vector search via `sqlite-vec`.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use tokio_rusqlite::{Connection, ffi, params_from_iter};

use crate::types::CorpusError;

use super::{IndexedDocument, RetrievalMatch, SourceFilter, VectorStore};

/// Vector store backed by a SQLite database.
///
/// Documents live in a plain `documents` table keyed by the stable content
/// hash; embeddings live in a `vec0` virtual table joined by rowid. Upserts
/// replace the whole row (content, source, model, vector, timestamp), so
/// re-ingesting identical text is idempotent.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Connection,
    dimensions: usize,
}

impl SqliteDocumentStore {
    /// Opens (or creates) a store at `path` for vectors of `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Storage`] when the database cannot be opened,
    /// the sqlite-vec extension fails to register, or the schema cannot be
    /// created.
    pub async fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self, CorpusError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| CorpusError::Storage(err.to_string()))?;
        Self::init(conn, dimensions).await
    }

    /// Opens an in-memory store, mainly for tests and demos.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`open`](Self::open).
    pub async fn open_in_memory(dimensions: usize) -> Result<Self, CorpusError> {
        register_sqlite_vec()?;
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| CorpusError::Storage(err.to_string()))?;
        Self::init(conn, dimensions).await
    }

    async fn init(conn: Connection, dimensions: usize) -> Result<Self, CorpusError> {
        conn.call(move |conn| -> tokio_rusqlite::Result<()> {
            conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Error)?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    content TEXT NOT NULL,
                    source TEXT NOT NULL,
                    model TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )",
                [],
            )
            .map_err(tokio_rusqlite::Error::Error)?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source)",
                [],
            )
            .map_err(tokio_rusqlite::Error::Error)?;
            conn.execute(
                &format!(
                    "CREATE VIRTUAL TABLE IF NOT EXISTS documents_embeddings \
                     USING vec0(embedding float[{dimensions}])"
                ),
                [],
            )
            .map_err(tokio_rusqlite::Error::Error)?;
            Ok(())
        })
        .await
        .map_err(|err| CorpusError::Storage(err.to_string()))?;

        Ok(Self { conn, dimensions })
    }

    /// Vector length this store was opened with.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Underlying connection, for queries outside the [`VectorStore`]
    /// surface.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Registers the sqlite-vec extension for every connection opened by this
/// process. Safe to call repeatedly; registration happens once.
fn register_sqlite_vec() -> Result<(), CorpusError> {
    use std::sync::Mutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!(
                    "failed to register sqlite-vec extension (code {rc})"
                ))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(CorpusError::Storage)
}

/// Renders the WHERE-clause fragment and bind parameters for a filter.
///
/// Returns an empty string for an unrestricted filter; otherwise a clause
/// beginning with `WHERE`. Parameter order matches placeholder order.
fn filter_sql(filter: &SourceFilter) -> (String, Vec<String>) {
    let mut groups: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if !filter.include.is_empty() {
        let predicates = vec!["d.source LIKE ?"; filter.include.len()].join(" OR ");
        groups.push(format!("({predicates})"));
        params.extend(filter.include.iter().cloned());
    }
    if !filter.exclude.is_empty() {
        let predicates = vec!["d.source NOT LIKE ?"; filter.exclude.len()].join(" AND ");
        groups.push(format!("({predicates})"));
        params.extend(filter.exclude.iter().cloned());
    }

    let mut clauses: Vec<String> = Vec::new();
    match groups.len() {
        0 => {}
        1 => clauses.push(groups.remove(0)),
        _ => clauses.push(format!("({})", groups.join(" OR "))),
    }

    if let Some(entity) = &filter.entity {
        clauses.push("(d.content LIKE ? OR d.source LIKE ?)".to_string());
        let pattern = format!("%{entity}%");
        params.push(pattern.clone());
        params.push(pattern);
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), params)
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteDocumentStore {
    async fn upsert(&self, documents: Vec<IndexedDocument>) -> Result<(), CorpusError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(documents.len());
        let created_at = chrono::Utc::now().to_rfc3339();
        for doc in documents {
            if doc.embedding.len() != self.dimensions {
                return Err(CorpusError::Storage(format!(
                    "document {} has a {}-dimensional embedding, store expects {}",
                    doc.id,
                    doc.embedding.len(),
                    self.dimensions
                )));
            }
            let embedding_json = serde_json::to_string(&doc.embedding)
                .map_err(|err| CorpusError::Storage(err.to_string()))?;
            rows.push((doc, embedding_json, created_at.clone()));
        }

        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                let tx = conn.transaction().map_err(tokio_rusqlite::Error::Error)?;
                for (doc, embedding_json, created_at) in &rows {
                    tx.execute(
                        "INSERT INTO documents (id, content, source, model, created_at) \
                         VALUES (?, ?, ?, ?, ?) \
                         ON CONFLICT(id) DO UPDATE SET \
                             content = excluded.content, \
                             source = excluded.source, \
                             model = excluded.model, \
                             created_at = excluded.created_at",
                        (&doc.id, &doc.content, &doc.source, &doc.model, created_at),
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;

                    let rowid: i64 = tx
                        .query_row("SELECT rowid FROM documents WHERE id = ?", [&doc.id], |row| {
                            row.get(0)
                        })
                        .map_err(tokio_rusqlite::Error::Error)?;

                    tx.execute(
                        "DELETE FROM documents_embeddings WHERE rowid = ?",
                        [rowid],
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;
                    tx.execute(
                        "INSERT INTO documents_embeddings (rowid, embedding) VALUES (?, ?)",
                        (rowid, embedding_json),
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Error)?;
                Ok(())
            })
            .await
            .map_err(|err| CorpusError::Storage(err.to_string()))
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: &SourceFilter,
    ) -> Result<Vec<RetrievalMatch>, CorpusError> {
        if query.len() != self.dimensions {
            return Err(CorpusError::Storage(format!(
                "query vector has {} dimensions, store expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let embedding_json =
            serde_json::to_string(query).map_err(|err| CorpusError::Storage(err.to_string()))?;
        let (where_clause, filter_params) = filter_sql(filter);
        let sql = format!(
            "SELECT d.id, d.content, d.source, \
             vec_distance_cosine(e.embedding, vec_f32(?)) AS distance \
             FROM documents d \
             JOIN documents_embeddings e ON e.rowid = d.rowid \
             {where_clause} \
             ORDER BY distance ASC \
             LIMIT {limit}"
        );

        let mut params = Vec::with_capacity(1 + filter_params.len());
        params.push(embedding_json);
        params.extend(filter_params);

        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<Vec<RetrievalMatch>> {
                let mut stmt = conn.prepare(&sql).map_err(tokio_rusqlite::Error::Error)?;
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), |row| {
                        let distance: f32 = row.get(3)?;
                        Ok(RetrievalMatch {
                            id: row.get(0)?,
                            content: row.get(1)?,
                            similarity: 1.0 - distance,
                            source: row.get(2)?,
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Error)?;

                let mut matches = Vec::new();
                for row in rows {
                    matches.push(row.map_err(tokio_rusqlite::Error::Error)?);
                }
                Ok(matches)
            })
            .await
            .map_err(|err| CorpusError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, CorpusError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::Result<usize> {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Error)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| CorpusError::Storage(err.to_string()))
    }
}
