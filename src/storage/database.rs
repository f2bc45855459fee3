//! SQLite registry for uploaded document metadata
//!
//! Chunk embeddings live in the in-memory vector index; this registry is the
//! durable record of which documents exist and how they were processed.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{DocumentRecord, DocumentStatus};

/// SQLite-backed document registry
pub struct DocumentDb {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        // WAL mode for better concurrency under simultaneous uploads
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA cache_size=10000;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::database(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                text_length INTEGER NOT NULL,
                chunk_count INTEGER NOT NULL,
                total_pages INTEGER NOT NULL,
                uploaded_at TEXT NOT NULL,
                status TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);
        "#,
        )
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Insert or replace a document record
    pub fn upsert_document(&self, record: &DocumentRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (
                doc_id, filename, text_length, chunk_count, total_pages, uploaded_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(doc_id) DO UPDATE SET
                filename = excluded.filename,
                text_length = excluded.text_length,
                chunk_count = excluded.chunk_count,
                total_pages = excluded.total_pages,
                uploaded_at = excluded.uploaded_at,
                status = excluded.status
            "#,
            params![
                record.doc_id,
                record.filename,
                record.text_length as i64,
                record.chunk_count as i64,
                record.total_pages as i64,
                record.uploaded_at.to_rfc3339(),
                record.status.as_str(),
            ],
        )
        .map_err(|e| Error::database(format!("Failed to upsert document: {}", e)))?;

        Ok(())
    }

    /// Get a document record by id
    pub fn get_document(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM documents WHERE doc_id = ?1")
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let record = stmt
            .query_row(params![doc_id], row_to_document)
            .optional()
            .map_err(|e| Error::database(format!("Failed to get document: {}", e)))?;

        Ok(record)
    }

    /// List all documents, most recently uploaded first
    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM documents ORDER BY uploaded_at DESC")
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let records = stmt
            .query_map([], row_to_document)
            .map_err(|e| Error::database(format!("Failed to list documents: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// Delete a document record, returning whether it existed
    pub fn delete_document(&self, doc_id: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute("DELETE FROM documents WHERE doc_id = ?1", params![doc_id])
            .map_err(|e| Error::database(format!("Failed to delete document: {}", e)))?;

        Ok(count > 0)
    }

    /// Number of registered documents
    pub fn count_documents(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to count documents: {}", e)))?;

        Ok(count as usize)
    }
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
    let doc_id: String = row.get(0)?;
    let filename: String = row.get(1)?;
    let text_length: i64 = row.get(2)?;
    let chunk_count: i64 = row.get(3)?;
    let total_pages: i64 = row.get(4)?;
    let uploaded_at_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;

    Ok(DocumentRecord {
        doc_id,
        filename,
        text_length: text_length as usize,
        chunk_count: chunk_count as u32,
        total_pages: total_pages as u32,
        uploaded_at: DateTime::parse_from_rfc3339(&uploaded_at_str)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        status: DocumentStatus::parse(&status_str),
    })
}
