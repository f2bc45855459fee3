//! API routes for the document Q&A server

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document management
        .route("/documents", get(documents::list_documents))
        .route(
            "/documents",
            post(ingest::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document))
        // Question answering
        .route("/ask", post(query::ask))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "PDF question answering with page and paragraph citations",
        "endpoints": {
            "POST /api/documents": "Upload a PDF for indexing",
            "GET /api/documents": "List uploaded documents",
            "GET /api/documents/:id": "Get document details",
            "DELETE /api/documents/:id": "Delete a document and its chunks",
            "POST /api/ask": "Ask a question about one document"
        }
    }))
}
