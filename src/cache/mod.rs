//! Query-key keyed response cache for list endpoints.
//!
//! A key is the endpoint path plus an optional filter object. Each entry
//! remembers the store revision it was filled at and is served only while
//! that revision is still current, so any write makes every entry stale.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

use crate::errors::AppError;

/// Cache key: endpoint path and canonical filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    path: String,
    filter: Option<String>,
}

impl QueryKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: None,
        }
    }

    /// Attach a filter object. `null` and `{}` count as no filter.
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = match filter {
            Value::Null => None,
            Value::Object(map) if map.is_empty() => None,
            // serde_json maps are ordered by key, so this is canonical
            other => Some(other.to_string()),
        };
        self
    }
}

#[derive(Clone)]
struct CachedQuery {
    revision: i64,
    payload: Arc<Value>,
}

/// Revision-checked cache of query results.
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<QueryKey, CachedQuery>,
}

impl QueryCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Serve `key` from cache if it was filled at `revision`, otherwise run
    /// `fetch` and remember its result. Errors are never cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: QueryKey,
        revision: i64,
        fetch: F,
    ) -> Result<Arc<Value>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, AppError>>,
    {
        if let Some(hit) = self.entries.get(&key).await {
            if hit.revision == revision {
                tracing::trace!(?key, revision, "Query cache hit");
                return Ok(hit.payload);
            }
        }

        let payload = Arc::new(fetch().await?);
        self.entries
            .insert(
                key,
                CachedQuery {
                    revision,
                    payload: payload.clone(),
                },
            )
            .await;
        Ok(payload)
    }
}
