// src/store/blobs.rs

use crate::db::connection::Database;
use crate::domain::offer::OfferId;
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

/// Metadata of one attachment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub offer_id: OfferId,
    pub file_name: String,
    #[serde(skip)]
    pub object_key: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment storage keyed by offer.
pub trait BlobStore: Send + Sync {
    /// Stores the bytes, then records the metadata. If the second step fails
    /// the blob stays behind until `discard_orphans` runs.
    fn upload(&self, offer_id: OfferId, bytes: &[u8], file_name: &str) -> Result<Document, ServerError>;

    fn list(&self, offer_id: OfferId) -> Result<Vec<Document>, ServerError>;

    fn remove(&self, id: DocumentId) -> Result<(), ServerError>;

    /// Attached-document count per offer. Offers without documents are absent.
    fn count_by_offer(&self) -> Result<HashMap<OfferId, usize>, ServerError>;

    /// Deletes stored blobs that no document record points at. Returns how many.
    fn discard_orphans(&self) -> Result<usize, ServerError>;
}

/// Blobs as files in one directory, metadata in the `documents` table.
pub struct LocalBlobStore {
    db: Database,
    dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(db: Database, dir: impl Into<PathBuf>) -> Result<Self, ServerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { db, dir })
    }

    /// Content hash plus a random suffix, so the same file can be attached twice.
    fn object_key(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        let suffix: u32 = rand::thread_rng().gen();
        format!("{:x}-{suffix:08x}", digest)
    }

    fn document_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        Ok(Document {
            id: DocumentId(row.get(0)?),
            offer_id: OfferId(row.get(1)?),
            file_name: row.get(2)?,
            object_key: row.get(3)?,
            size_bytes: row.get(4)?,
            uploaded_at: row.get(5)?,
        })
    }
}

impl BlobStore for LocalBlobStore {
    fn upload(&self, offer_id: OfferId, bytes: &[u8], file_name: &str) -> Result<Document, ServerError> {
        let key = Self::object_key(bytes);
        let path = self.dir.join(&key);
        fs::write(&path, bytes)?;

        let uploaded_at = Utc::now();
        let size = bytes.len() as i64;
        let recorded = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (offer_id, file_name, object_key, size_bytes, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![offer_id.0, file_name, key, size, uploaded_at],
            )?;
            Ok(DocumentId(conn.last_insert_rowid()))
        });

        match recorded {
            Ok(id) => {
                tracing::info!(offer = %offer_id, file = file_name, "document attached");
                Ok(Document {
                    id,
                    offer_id,
                    file_name: file_name.to_string(),
                    object_key: key,
                    size_bytes: size,
                    uploaded_at,
                })
            }
            Err(err) => {
                tracing::warn!(offer = %offer_id, key = %key, error = %err, "blob stored but not recorded");
                Err(err)
            }
        }
    }

    fn list(&self, offer_id: OfferId) -> Result<Vec<Document>, ServerError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, offer_id, file_name, object_key, size_bytes, uploaded_at
                 FROM documents WHERE offer_id = ?1 ORDER BY uploaded_at, id",
            )?;
            let rows = stmt.query_map(params![offer_id.0], Self::document_from_row)?;

            let mut docs = Vec::new();
            for r in rows {
                docs.push(r?);
            }
            Ok(docs)
        })
    }

    fn remove(&self, id: DocumentId) -> Result<(), ServerError> {
        let key = self.db.with_conn(|conn| {
            let key: Option<String> = conn
                .query_row(
                    "SELECT object_key FROM documents WHERE id = ?1",
                    params![id.0],
                    |r| r.get(0),
                )
                .optional()?;
            let key = key.ok_or(ServerError::NotFound)?;
            conn.execute("DELETE FROM documents WHERE id = ?1", params![id.0])?;
            Ok(key)
        })?;

        match fs::remove_file(self.dir.join(&key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn count_by_offer(&self) -> Result<HashMap<OfferId, usize>, ServerError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT offer_id, COUNT(*) FROM documents GROUP BY offer_id")?;
            let rows = stmt.query_map([], |r| {
                Ok((OfferId(r.get(0)?), r.get::<_, i64>(1)? as usize))
            })?;

            let mut counts = HashMap::new();
            for r in rows {
                let (offer, n) = r?;
                counts.insert(offer, n);
            }
            Ok(counts)
        })
    }

    fn discard_orphans(&self) -> Result<usize, ServerError> {
        let known: HashSet<String> = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT object_key FROM documents")?;
            let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;

            let mut keys = HashSet::new();
            for r in rows {
                keys.insert(r?);
            }
            Ok(keys)
        })?;

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !known.contains(&name) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "discarded orphaned blobs");
        }
        Ok(removed)
    }
}
