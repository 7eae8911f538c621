//! Course API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{cached_list, current_revision, error, success, ApiResult};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{Course, CourseLevel, Record};
use crate::search::EntryKind;
use crate::store::{Collection, ListQuery};
use crate::AppState;

/// Catalog filters. At most one may be given.
#[derive(Debug, Default, Deserialize)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
}

/// GET /api/courses - List courses, optionally by category or level.
pub async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> ApiResult<Value> {
    let (query, key_filter) = match (filter.category, filter.level) {
        (Some(_), Some(_)) => {
            return error(
                AppError::BadRequest("Filter by category or level, not both".to_string()),
                current_revision(&state).await,
            )
        }
        (Some(category), None) => (
            ListQuery::where_eq("category", category.clone()),
            json!({ "category": category }),
        ),
        (None, Some(level)) => (
            ListQuery::where_eq("level", level.as_str()),
            json!({ "level": level.as_str() }),
        ),
        (None, None) => (ListQuery::all(), Value::Null),
    };

    let key = QueryKey::new("/api/courses").with_filter(key_filter);
    cached_list(&state, key, Collection::Courses, query).await
}

/// GET /api/courses/:id - Get a single course.
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Record<Course>> {
    let revision_id = current_revision(&state).await;

    match state.entities.get_course(&id).await {
        Ok(Some(course)) => success(course, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Course {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/courses - Create a course.
pub async fn create_course(
    State(state): State<AppState>,
    Json(course): Json<Course>,
) -> ApiResult<Record<Course>> {
    let revision_id = current_revision(&state).await;

    let created = async {
        let id = state.entities.create_course(&course).await?;
        state
            .entities
            .get_course(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", id)))
    }
    .await;

    match created {
        Ok(course) => {
            if let Err(e) = state.search.index_course(&course).await {
                tracing::warn!("Failed to index course: {}", e);
            }

            tracing::info!(course_id = %course.id, title = %course.fields.title, "Course created");
            let new_revision = current_revision(&state).await;
            success(course, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/courses/:id - Merge the given fields into a course.
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> ApiResult<Record<Course>> {
    let revision_id = current_revision(&state).await;

    match state.entities.update_course(&id, patch).await {
        Ok(course) => {
            // Re-index the updated course
            if let Err(e) = state.search.index_course(&course).await {
                tracing::warn!("Failed to re-index course: {}", e);
            }

            let new_revision = current_revision(&state).await;
            success(course, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/courses/:id - Delete a course.
pub async fn delete_course(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = current_revision(&state).await;

    match state.entities.delete_course(&id).await {
        Ok(()) => {
            // Remove from search index
            if let Err(e) = state.search.remove(EntryKind::Course, &id).await {
                tracing::warn!("Failed to remove course from index: {}", e);
            }

            tracing::info!(course_id = %id, "Course deleted");
            let new_revision = current_revision(&state).await;
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
