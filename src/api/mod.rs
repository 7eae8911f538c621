//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod auth;
mod blog;
mod collections;
mod courses;
mod events;
mod faqs;
mod leads;
mod search;
mod testimonials;
mod uploads;

pub use auth::*;
pub use blog::*;
pub use collections::*;
pub use courses::*;
pub use events::*;
pub use faqs::*;
pub use leads::*;
pub use search::*;
pub use testimonials::*;
pub use uploads::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::store::{Collection, ListQuery};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: crate::errors::AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

async fn current_revision(state: &AppState) -> i64 {
    state.entities.store().revision_id().await.unwrap_or(0)
}

/// Serve a collection scan through the query cache.
async fn cached_list(
    state: &AppState,
    key: QueryKey,
    collection: Collection,
    query: ListQuery,
) -> ApiResult<Value> {
    let revision_id = current_revision(state).await;
    let entities = state.entities.clone();

    let fetched = state
        .cache
        .get_or_fetch(key, revision_id, move || async move {
            let records = entities.list_raw(collection, &query).await?;
            Ok::<_, AppError>(Value::Array(records))
        })
        .await;

    match fetched {
        Ok(payload) => success(payload.as_ref().clone(), revision_id),
        Err(e) => error(e, revision_id),
    }
}
