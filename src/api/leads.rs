//! Lead capture and follow-up endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{cached_list, current_revision, error, success, ApiResult};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{Lead, LeadStatus, LeadStatusRequest, Record};
use crate::store::{Collection, ListQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
}

/// POST /api/leads - Capture a lead from a contact or enrollment form.
pub async fn create_lead(
    State(state): State<AppState>,
    Json(lead): Json<Lead>,
) -> ApiResult<Record<Lead>> {
    let revision_id = current_revision(&state).await;

    let created = async {
        let id = state.entities.create_lead(&lead).await?;
        state
            .entities
            .get::<Lead>(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }
    .await;

    match created {
        Ok(lead) => {
            tracing::info!(lead_id = %lead.id, course_id = ?lead.fields.course_id, "Lead captured");
            success(lead, current_revision(&state).await)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/leads - List leads, optionally by status.
pub async fn list_leads(
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> ApiResult<Value> {
    let (query, key_filter) = match filter.status {
        Some(status) => (
            ListQuery::where_eq("status", status.as_str()),
            json!({ "status": status.as_str() }),
        ),
        None => (ListQuery::all(), Value::Null),
    };

    let key = QueryKey::new("/api/leads").with_filter(key_filter);
    cached_list(&state, key, Collection::Leads, query).await
}

/// PUT /api/leads/:id/status - Set a lead's follow-up status.
pub async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LeadStatusRequest>,
) -> ApiResult<Record<Lead>> {
    let revision_id = current_revision(&state).await;

    match state.entities.update_lead_status(&id, request.status).await {
        Ok(lead) => {
            tracing::info!(lead_id = %id, status = %request.status, "Lead status updated");
            success(lead, current_revision(&state).await)
        }
        Err(e) => error(e, revision_id),
    }
}
