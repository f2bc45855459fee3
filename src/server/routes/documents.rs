//! Document management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentListResponse, DocumentRecord};

/// GET /api/documents - List all documents, newest first
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents = state.db().list_documents()?;
    let total_count = documents.len();
    Ok(Json(DocumentListResponse {
        documents,
        total_count,
    }))
}

/// GET /api/documents/:id - Get one document
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRecord>> {
    let record = state
        .db()
        .get_document(&id)?
        .ok_or_else(|| Error::DocumentNotFound(id))?;
    Ok(Json(record))
}

/// DELETE /api/documents/:id - Delete a document and its indexed chunks
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.pipeline().delete_document(&id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "document_id": id,
    })))
}
