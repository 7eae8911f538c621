//! Testimonial API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{cached_list, current_revision, error, success, ApiResult};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{Record, Testimonial};
use crate::store::{Collection, ListQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TestimonialFilter {
    pub approved: Option<bool>,
}

/// GET /api/testimonials - List testimonials, optionally only approved ones.
pub async fn list_testimonials(
    State(state): State<AppState>,
    Query(filter): Query<TestimonialFilter>,
) -> ApiResult<Value> {
    let (query, key_filter) = match filter.approved {
        Some(approved) => (
            ListQuery::where_eq("approved", approved),
            json!({ "approved": approved }),
        ),
        None => (ListQuery::all(), Value::Null),
    };

    let key = QueryKey::new("/api/testimonials").with_filter(key_filter);
    cached_list(&state, key, Collection::Testimonials, query).await
}

/// POST /api/testimonials - Create a testimonial.
pub async fn create_testimonial(
    State(state): State<AppState>,
    Json(testimonial): Json<Testimonial>,
) -> ApiResult<Record<Testimonial>> {
    let revision_id = current_revision(&state).await;

    let created = async {
        let id = state.entities.create_testimonial(&testimonial).await?;
        state
            .entities
            .get::<Testimonial>(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Testimonial {} not found", id)))
    }
    .await;

    match created {
        Ok(testimonial) => success(testimonial, current_revision(&state).await),
        Err(e) => error(e, revision_id),
    }
}
