//! Training institute backend
//!
//! Course catalog, testimonials, blog, FAQs, lead capture and page analytics
//! over a SQLite document store, with Tantivy catalog search and an admin gate.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod entities;
pub mod errors;
pub mod models;
pub mod motion;
pub mod search;
pub mod storage;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use auth::AuthService;
use cache::QueryCache;
use config::Config;
use entities::Entities;
use errors::AppError;
use models::Record;
use search::SearchIndex;
use storage::{FileStorage, PUBLIC_PREFIX};
use store::{AccountStore, Collection, DocumentStore, ListQuery};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub entities: Entities,
    pub auth: AuthService,
    pub search: Arc<SearchIndex>,
    pub cache: QueryCache,
    pub storage: FileStorage,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the database, index and upload directory named by `config`,
    /// seed the admin account and build the catalog index.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let pool = store::init_database(&config.db_path).await?;
        let entities = Entities::new(DocumentStore::new(pool.clone()));
        let auth = AuthService::new(AccountStore::new(pool), config.session_ttl_hours)?;
        let search = Arc::new(SearchIndex::open(&config.index_path)?);
        let cache = QueryCache::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        );
        let storage = FileStorage::open(&config.uploads_path, config.max_upload_bytes).await?;

        let state = Self {
            entities,
            auth,
            search,
            cache,
            storage,
            config: Arc::new(config),
        };

        state.seed_admin().await?;
        let purged = state.auth.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "Removed expired sessions");
        }

        tracing::info!("Building catalog index...");
        state.reindex_catalog().await?;

        Ok(state)
    }

    async fn seed_admin(&self) -> Result<(), AppError> {
        let (Some(email), Some(password)) = (
            self.config.admin_email.as_deref(),
            self.config.admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        let user = self
            .auth
            .register(email, password, Some("Administrator"))
            .await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Admin account ready");
        Ok(())
    }

    /// Rebuild the search index from the courses and blog collections.
    /// Documents that do not decode are skipped.
    pub async fn reindex_catalog(&self) -> Result<(), AppError> {
        let courses = self.catalog_records(Collection::Courses).await?;
        let posts = self.catalog_records(Collection::Blog).await?;
        self.search.rebuild(&courses, &posts).await
    }

    async fn catalog_records<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<Record<T>>, AppError> {
        let raw = self
            .entities
            .list_raw(collection, &ListQuery::all())
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|record: Value| {
                let id = record.get("id").and_then(Value::as_str).map(str::to_string);
                match serde_json::from_value(record) {
                    Ok(decoded) => Some(decoded),
                    Err(e) => {
                        tracing::warn!(%collection, ?id, "Skipping undecodable document: {}", e);
                        None
                    }
                }
            })
            .collect())
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/courses", get(api::list_courses))
        .route("/courses/{id}", get(api::get_course))
        .route("/testimonials", get(api::list_testimonials))
        .route("/blog", get(api::list_blog_posts))
        .route("/faqs", get(api::list_faqs))
        .route("/leads", post(api::create_lead))
        .route("/events", post(api::track_event))
        .route("/search", get(api::search_catalog))
        .route("/auth/sign-in", post(api::sign_in))
        .route("/auth/sign-out", post(api::sign_out))
        .route("/auth/me", get(api::current_user));

    let admin_routes = Router::new()
        .route("/courses", post(api::create_course))
        .route(
            "/courses/{id}",
            put(api::update_course).delete(api::delete_course),
        )
        .route("/testimonials", post(api::create_testimonial))
        .route("/blog", post(api::create_blog_post))
        .route("/faqs", post(api::create_faq))
        .route("/leads", get(api::list_leads))
        .route("/events", get(api::list_events))
        .route("/leads/{id}/status", put(api::update_lead_status))
        .route(
            "/collections/{name}",
            get(api::list_collection).post(api::add_to_collection),
        )
        .route("/uploads", post(api::upload_file))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.storage.root()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
