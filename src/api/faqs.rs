//! FAQ API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{cached_list, current_revision, error, success, ApiResult};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{Faq, Record};
use crate::store::{Collection, ListQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub category: Option<String>,
}

impl CategoryFilter {
    /// The store query and cache-key filter for this category.
    pub(super) fn split(self) -> (ListQuery, Value) {
        match self.category {
            Some(category) => (
                ListQuery::where_eq("category", category.clone()),
                json!({ "category": category }),
            ),
            None => (ListQuery::all(), Value::Null),
        }
    }
}

/// GET /api/faqs - List FAQs, optionally by category.
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> ApiResult<Value> {
    let (query, key_filter) = filter.split();
    let key = QueryKey::new("/api/faqs").with_filter(key_filter);
    cached_list(&state, key, Collection::Faqs, query).await
}

/// POST /api/faqs - Create a FAQ entry.
pub async fn create_faq(
    State(state): State<AppState>,
    Json(faq): Json<Faq>,
) -> ApiResult<Record<Faq>> {
    let revision_id = current_revision(&state).await;

    let created = async {
        let id = state.entities.create_faq(&faq).await?;
        state
            .entities
            .get::<Faq>(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("FAQ {} not found", id)))
    }
    .await;

    match created {
        Ok(faq) => success(faq, current_revision(&state).await),
        Err(e) => error(e, revision_id),
    }
}
