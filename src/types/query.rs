//! Request types for the RAG API

use serde::{Deserialize, Serialize};

/// Request body for POST /api/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Document to answer from
    pub document_id: String,
    /// The question to answer
    pub question: String,
}
