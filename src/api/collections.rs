//! Raw collection endpoints: untyped list and verbatim add.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::{cached_list, current_revision, error, success, ApiResult};
use crate::cache::QueryKey;
use crate::models::{BlogPost, Course, Record};
use crate::store::{Collection, ListQuery};
use crate::AppState;

/// GET /api/collections/:name - Every document of a collection.
pub async fn list_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Value> {
    let collection = match name.parse::<Collection>() {
        Ok(collection) => collection,
        Err(e) => return error(e, current_revision(&state).await),
    };

    let key = QueryKey::new(format!("/api/collections/{}", collection));
    cached_list(&state, key, collection, ListQuery::all()).await
}

/// POST /api/collections/:name - Insert a document exactly as given.
pub async fn add_to_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(record): Json<Value>,
) -> ApiResult<Value> {
    let revision_id = current_revision(&state).await;

    let collection = match name.parse::<Collection>() {
        Ok(collection) => collection,
        Err(e) => return error(e, revision_id),
    };

    match state.entities.add(collection, record).await {
        Ok(added) => {
            index_added(&state, collection, &added).await;
            success(added, current_revision(&state).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Index catalog documents that decode as their entity type.
async fn index_added(state: &AppState, collection: Collection, added: &Value) {
    let indexed = match collection {
        Collection::Courses => match serde_json::from_value::<Record<Course>>(added.clone()) {
            Ok(course) => state.search.index_course(&course).await,
            Err(_) => return,
        },
        Collection::Blog => match serde_json::from_value::<Record<BlogPost>>(added.clone()) {
            Ok(post) => state.search.index_blog_post(&post).await,
            Err(_) => return,
        },
        _ => return,
    };

    if let Err(e) = indexed {
        tracing::warn!(%collection, "Failed to index added document: {}", e);
    }
}
