//! File upload endpoint.

use axum::{
    body::Bytes,
    extract::{Query, State},
};
use serde::Deserialize;

use super::{current_revision, error, success, ApiResult};
use crate::storage::StoredFile;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Original file name; only its extension is kept.
    #[serde(default)]
    pub filename: String,
}

/// POST /api/uploads?filename= - Store the request body as a file.
pub async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ApiResult<StoredFile> {
    let revision_id = current_revision(&state).await;

    match state.storage.put(&params.filename, &body).await {
        Ok(stored) => success(stored, revision_id),
        Err(e) => error(e, revision_id),
    }
}
