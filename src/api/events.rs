//! Analytics event capture.

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

use super::{cached_list, current_revision, error, success, ApiResult, CategoryFilter};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, Record};
use crate::store::Collection;
use crate::AppState;

/// POST /api/events - Record a page interaction.
pub async fn track_event(
    State(state): State<AppState>,
    Json(event): Json<AnalyticsEvent>,
) -> ApiResult<Record<AnalyticsEvent>> {
    let revision_id = current_revision(&state).await;

    if event.action.trim().is_empty() {
        return error(
            AppError::Validation("Event action must not be empty".to_string()),
            revision_id,
        );
    }

    let created = async {
        let id = state.entities.create_event(&event).await?;
        state
            .entities
            .get::<AnalyticsEvent>(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }
    .await;

    match created {
        Ok(event) => {
            tracing::debug!(
                action = %event.fields.action,
                category = %event.fields.category,
                label = ?event.fields.label,
                "Event tracked"
            );
            success(event, current_revision(&state).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/events - List tracked events, optionally by category.
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> ApiResult<Value> {
    let (query, key_filter) = filter.split();
    let key = QueryKey::new("/api/events").with_filter(key_filter);
    cached_list(&state, key, Collection::Events, query).await
}
