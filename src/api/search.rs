//! Catalog search endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{current_revision, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{BlogPost, Course};
use crate::search::EntryKind;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    pub q: String,
    /// Restrict hits to courses or blog posts.
    pub kind: Option<EntryKind>,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Number of index matches, across all pages.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub kind: EntryKind,
    pub record: Value,
    pub score: f32,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// Deepest offset a client may page to.
const MAX_SEARCH_OFFSET: usize = 1_000;

/// GET /api/search - Search courses and blog posts.
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = current_revision(&state).await;

    let limit = params.limit.min(MAX_SEARCH_LIMIT);
    let offset = params.offset.min(MAX_SEARCH_OFFSET);

    let page = match state.search.search(&params.q, params.kind, limit, offset) {
        Ok(page) => page,
        Err(e) => return error(e, revision_id),
    };
    let (total, hits) = (page.total, page.hits);

    // Hits whose document has since gone are dropped
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let record = match hit.kind {
            EntryKind::Course => load::<Course>(&state, &hit.id).await,
            EntryKind::Blog => load::<BlogPost>(&state, &hit.id).await,
        };
        match record {
            Ok(Some(record)) => results.push(SearchResultItem {
                kind: hit.kind,
                record,
                score: hit.score,
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!(id = %hit.id, "Failed to load search hit: {}", e),
        }
    }

    success(
        SearchResponse {
            results,
            total,
            limit,
            offset,
        },
        revision_id,
    )
}

async fn load<E: crate::entities::Entity>(
    state: &AppState,
    id: &str,
) -> Result<Option<Value>, AppError> {
    match state.entities.get::<E>(id).await? {
        Some(record) => Ok(Some(serde_json::to_value(record)?)),
        None => Ok(None),
    }
}
