//! Question answering endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AskRequest, QueryResponse};

/// POST /api/ask - Answer a question about one document
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    tracing::info!(
        "Question for {}: \"{}\"",
        request.document_id,
        request.question
    );

    let outcome = state
        .engine()
        .answer_question(&request.document_id, &request.question)
        .await?;

    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources,
        backend: outcome.backend,
        chunks_retrieved: outcome.chunks_retrieved,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
