//! Blog API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

use super::{cached_list, current_revision, error, success, ApiResult, CategoryFilter};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{BlogPost, Record};
use crate::store::{Collection, Direction};
use crate::AppState;

/// GET /api/blog - List blog posts, newest first, optionally by category.
pub async fn list_blog_posts(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> ApiResult<Value> {
    let (query, key_filter) = filter.split();
    let query = query.order_by("createdAt", Direction::Desc);
    let key = QueryKey::new("/api/blog").with_filter(key_filter);
    cached_list(&state, key, Collection::Blog, query).await
}

/// POST /api/blog - Publish a blog post.
pub async fn create_blog_post(
    State(state): State<AppState>,
    Json(post): Json<BlogPost>,
) -> ApiResult<Record<BlogPost>> {
    let revision_id = current_revision(&state).await;

    let created = async {
        let id = state.entities.create_blog_post(&post).await?;
        state
            .entities
            .get::<BlogPost>(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blog post {} not found", id)))
    }
    .await;

    match created {
        Ok(post) => {
            if let Err(e) = state.search.index_blog_post(&post).await {
                tracing::warn!("Failed to index blog post: {}", e);
            }

            tracing::info!(post_id = %post.id, slug = %post.fields.slug, "Blog post published");
            success(post, current_revision(&state).await)
        }
        Err(e) => error(e, revision_id),
    }
}
