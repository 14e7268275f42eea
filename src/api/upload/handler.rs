// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::response::UploadResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::storage::UploadStore;
use crate::vision::detect_format;

/// POST /upload - Persist one image and run the processing pipeline
///
/// Accepts a multipart form with a single `file` field. The file is saved
/// unchanged under the shared upload directory, then captioned,
/// segmented, and reconstructed into 3D artifacts.
///
/// # Response
/// - `message`: status text
/// - `result.description`: generated caption
/// - `result.segmented_image`: foreground-only image file name
/// - `result.model_file`: GLB artifact file name
///
/// # Errors
/// - 400 Bad Request: missing file field, empty file, or unsupported format
/// - 500 Internal Server Error: any pipeline stage failed (single message)
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();
    debug!("Upload request received: {}", request_id);

    let fail = |error: ApiError| ApiErrorResponse::new(error, Some(request_id.clone()));

    // 1. Pull the file field out of the multipart form
    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        fail(ApiError::InvalidRequest(format!("Malformed upload: {}", e)))
    })? {
        if field.name() == Some("file") {
            filename = field.file_name().map(|n| n.to_string());
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| {
                        fail(ApiError::InvalidRequest(format!(
                            "Failed to read upload: {}",
                            e
                        )))
                    })?
                    .to_vec(),
            );
            break;
        }
    }

    let bytes = bytes.ok_or_else(|| {
        fail(ApiError::ValidationError {
            field: "file".to_string(),
            message: "file is required".to_string(),
        })
    })?;
    if bytes.is_empty() {
        return Err(fail(ApiError::ValidationError {
            field: "file".to_string(),
            message: "uploaded file is empty".to_string(),
        }));
    }

    // 2. Validate that this looks like a supported image before touching disk
    if detect_format(&bytes).is_err() {
        return Err(fail(ApiError::ValidationError {
            field: "file".to_string(),
            message: "uploaded file is not a supported image format".to_string(),
        }));
    }

    let filename = UploadStore::sanitize_filename(filename.as_deref().unwrap_or(""));

    // 3. Persist the source unchanged (last-writer-wins for equal names)
    state.store.save_upload(&filename, &bytes).map_err(|e| {
        warn!("Failed to persist upload {}: {}", filename, e);
        fail(ApiError::InternalError(format!(
            "Failed to save upload: {}",
            e
        )))
    })?;

    info!(
        "Upload {} saved as {} ({} bytes), starting pipeline",
        request_id,
        filename,
        bytes.len()
    );

    // 4. Run the pipeline; stage identity stays in the logs only
    let result = state.orchestrator.process(&filename).await.map_err(|e| {
        warn!(
            "Pipeline failed for {} at stage '{}' ({}): {}",
            filename,
            e.stage().name(),
            e.kind().name(),
            e
        );
        fail(ApiError::ProcessingFailed(e.to_string()))
    })?;

    Ok(Json(UploadResponse::new(result)))
}
