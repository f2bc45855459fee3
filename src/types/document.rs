//! Document, page and chunk types with positional metadata for citations

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single page of extracted document text
///
/// Pages are contiguous, non-overlapping slices of the full document text,
/// ordered by page number (1-indexed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Raw page text
    pub text: String,
    /// Offset of the first character of this page in the full document text
    pub start_char: usize,
    /// Offset one past the last character of this page
    pub end_char: usize,
}

impl Page {
    /// Create a page from its text and document-absolute offset
    pub fn new(page_number: u32, text: impl Into<String>, start_char: usize) -> Self {
        let text = text.into();
        let end_char = start_char + text.len();
        Self {
            page_number,
            text,
            start_char,
            end_char,
        }
    }
}

/// Inclusive range of paragraph numbers contributing to a chunk
///
/// Rendered as a single number (`"3"`) when one paragraph contributed, or as
/// `"1-2"` when several did. Serialized in the string form since citation
/// rendering downstream depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphRange {
    /// First contributing paragraph (1-indexed)
    pub start: u32,
    /// Last contributing paragraph (inclusive)
    pub end: u32,
}

impl ParagraphRange {
    /// Range covering a single paragraph
    pub fn single(paragraph: u32) -> Self {
        Self {
            start: paragraph,
            end: paragraph,
        }
    }

    /// Range covering `start..=end`
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// True when exactly one paragraph contributed
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ParagraphRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for ParagraphRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((a, b)) => {
                let start = a.trim().parse().map_err(|_| format!("bad range: {}", s))?;
                let end = b.trim().parse().map_err(|_| format!("bad range: {}", s))?;
                Ok(Self { start, end })
            }
            None => {
                let n = s.trim().parse().map_err(|_| format!("bad range: {}", s))?;
                Ok(Self::single(n))
            }
        }
    }
}

impl Serialize for ParagraphRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParagraphRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RangeVisitor;

        impl Visitor<'_> for RangeVisitor {
            type Value = ParagraphRange;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a paragraph number or \"start-end\" range")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                v.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(ParagraphRange::single(v as u32))
            }
        }

        deserializer.deserialize_any(RangeVisitor)
    }
}

/// A chunk of document text, the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique index, monotonically increasing across the document
    pub chunk_index: u32,
    /// Trimmed, non-empty chunk text
    pub text: String,
    /// Owning page number (1-indexed)
    pub page: u32,
    /// First paragraph contributing to the chunk (1-indexed)
    pub paragraph_number: u32,
    /// Inclusive range of contributing paragraphs
    pub paragraph_range: ParagraphRange,
    /// Document-absolute start offset
    pub start_char: usize,
    /// Document-absolute end offset
    pub end_char: usize,
    /// Length of `text` in characters
    pub chunk_length: usize,
}

impl Chunk {
    /// Positional metadata stored beside the embedding
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            page: self.page,
            paragraph_number: self.paragraph_number,
            paragraph_range: self.paragraph_range,
            start_char: self.start_char,
            end_char: self.end_char,
            chunk_length: self.chunk_length,
        }
    }
}

/// Positional metadata carried with every indexed vector record
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning page number (1-indexed)
    pub page: u32,
    /// First contributing paragraph (1-indexed)
    pub paragraph_number: u32,
    /// Inclusive paragraph range
    pub paragraph_range: ParagraphRange,
    /// Document-absolute start offset
    pub start_char: usize,
    /// Document-absolute end offset
    pub end_char: usize,
    /// Chunk text length in characters
    pub chunk_length: usize,
}

/// Processing status of an ingested document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Fully chunked, embedded and indexed
    Processed,
    /// Ingest failed after the record was created
    Failed,
}

impl DocumentStatus {
    /// Stable string form used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }

    /// Parse the database string form
    pub fn parse(s: &str) -> Self {
        match s {
            "failed" => Self::Failed,
            _ => Self::Processed,
        }
    }
}

/// Registry record for an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document id, derived from the ingest timestamp
    pub doc_id: String,
    /// Original filename as uploaded
    pub filename: String,
    /// Length of the full extracted text in characters
    pub text_length: usize,
    /// Number of chunks created
    pub chunk_count: u32,
    /// Total pages in the document
    pub total_pages: u32,
    /// Ingest timestamp
    pub uploaded_at: DateTime<Utc>,
    /// Processing status
    pub status: DocumentStatus,
}

impl DocumentRecord {
    /// Create a record for a freshly ingested document
    pub fn new(filename: String, text_length: usize, chunk_count: u32, total_pages: u32) -> Self {
        let uploaded_at = Utc::now();
        Self {
            doc_id: format!("doc-{}", uploaded_at.timestamp_millis()),
            filename,
            text_length,
            chunk_count,
            total_pages,
            uploaded_at,
            status: DocumentStatus::Processed,
        }
    }
}
