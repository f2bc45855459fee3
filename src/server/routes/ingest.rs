//! PDF upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::IngestResponse;

/// POST /api/documents - Upload and index a PDF
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(Error::invalid_input(format!(
                "Unsupported file type for {}: only PDF uploads are accepted",
                filename
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_input(format!("Failed to read upload: {}", e)))?;

        tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

        let document = state.pipeline().ingest_pdf(&filename, &data).await?;
        return Ok(Json(IngestResponse {
            success: true,
            document,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }));
    }

    Err(Error::invalid_input("No file found in upload"))
}
