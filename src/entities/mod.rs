//! Entity access layer.
//!
//! Each entity type lives in one collection. Every operation is a single
//! request against the document store; store errors pass through untouched
//! and nothing is validated beyond the store's own rule that a document is a
//! JSON object.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{
    AnalyticsEvent, BlogPost, Course, Faq, Lead, LeadStatus, Record, Testimonial,
};
use crate::store::{Collection, Document, DocumentStore, ListQuery};

/// An entity type stored in a named collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Whether records carry `updatedAt` next to `createdAt`.
    const TRACKS_UPDATES: bool;

    /// Stamp store-bound fields onto a new record before insert.
    fn stamp(fields: &mut Map<String, Value>, now: DateTime<Utc>) {
        let ts = Value::String(timestamp(now));
        if Self::TRACKS_UPDATES {
            fields.insert("updatedAt".to_string(), ts.clone());
        }
        fields.insert("createdAt".to_string(), ts);
    }
}

impl Entity for Course {
    const COLLECTION: Collection = Collection::Courses;
    const TRACKS_UPDATES: bool = true;
}

impl Entity for Testimonial {
    const COLLECTION: Collection = Collection::Testimonials;
    const TRACKS_UPDATES: bool = false;
}

impl Entity for BlogPost {
    const COLLECTION: Collection = Collection::Blog;
    const TRACKS_UPDATES: bool = true;
}

impl Entity for Faq {
    const COLLECTION: Collection = Collection::Faqs;
    const TRACKS_UPDATES: bool = false;
}

impl Entity for Lead {
    const COLLECTION: Collection = Collection::Leads;
    const TRACKS_UPDATES: bool = false;

    /// New leads always start as `new`, whatever the caller sent.
    fn stamp(fields: &mut Map<String, Value>, now: DateTime<Utc>) {
        fields.insert("createdAt".to_string(), Value::String(timestamp(now)));
        fields.insert(
            "status".to_string(),
            Value::String(LeadStatus::New.as_str().to_string()),
        );
    }
}

impl Entity for AnalyticsEvent {
    const COLLECTION: Collection = Collection::Events;
    const TRACKS_UPDATES: bool = false;
}

/// Timestamps are written as RFC 3339 with millisecond precision.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Typed access to the entity collections.
#[derive(Clone)]
pub struct Entities {
    store: DocumentStore,
}

impl Entities {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Stamp timestamps onto `record`, insert it, and return the new id.
    pub async fn create<E: Entity>(&self, record: &E) -> Result<String, AppError> {
        let mut fields = match serde_json::to_value(record)
            .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", E::COLLECTION, e)))?
        {
            Value::Object(map) => map,
            other => {
                return Err(AppError::Internal(format!(
                    "{} record encoded as non-object {}",
                    E::COLLECTION,
                    other
                )))
            }
        };
        E::stamp(&mut fields, Utc::now());
        self.store.insert(E::COLLECTION, Value::Object(fields)).await
    }

    /// Every record of the collection matching `query`, with ids merged in.
    pub async fn list<E: Entity>(&self, query: &ListQuery) -> Result<Vec<Record<E>>, AppError> {
        self.store
            .list(E::COLLECTION, query)
            .await?
            .into_iter()
            .map(decode::<E>)
            .collect()
    }

    /// Like [`Entities::list`], but returns the documents as untyped records.
    pub async fn list_raw(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Value>, AppError> {
        Ok(self
            .store
            .list(collection, query)
            .await?
            .into_iter()
            .map(Document::into_record)
            .collect())
    }

    /// Insert `record` verbatim and return it merged with the new id.
    pub async fn add(&self, collection: Collection, record: Value) -> Result<Value, AppError> {
        let id = self.store.insert(collection, record.clone()).await?;
        let mut merged = Map::new();
        merged.insert("id".to_string(), Value::String(id));
        if let Value::Object(fields) = record {
            merged.extend(fields.into_iter().filter(|(k, _)| k != "id"));
        }
        Ok(Value::Object(merged))
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Result<Option<Record<E>>, AppError> {
        self.store
            .get(E::COLLECTION, id)
            .await?
            .map(decode::<E>)
            .transpose()
    }

    /// Shallow-merge `patch`, stamping `updatedAt` where the entity tracks it.
    /// A patch whose result no longer decodes as `E` is not written.
    async fn update<E: Entity>(
        &self,
        id: &str,
        mut patch: Map<String, Value>,
    ) -> Result<Record<E>, AppError> {
        patch.remove("createdAt");
        if E::TRACKS_UPDATES {
            patch.insert(
                "updatedAt".to_string(),
                Value::String(timestamp(Utc::now())),
            );
        }
        self.store
            .update_checked(E::COLLECTION, id, patch, |merged| {
                decode::<E>(merged.clone()).map_err(|e| {
                    AppError::Validation(format!("Rejected update: {}", e.message()))
                })
            })
            .await
    }

    // ==================== COURSES ====================

    pub async fn create_course(&self, course: &Course) -> Result<String, AppError> {
        self.create(course).await
    }

    pub async fn get_courses(&self, query: &ListQuery) -> Result<Vec<Record<Course>>, AppError> {
        self.list(query).await
    }

    pub async fn add_course(&self, record: Value) -> Result<Value, AppError> {
        self.add(Collection::Courses, record).await
    }

    pub async fn get_course(&self, id: &str) -> Result<Option<Record<Course>>, AppError> {
        self.get(id).await
    }

    /// No concurrency check: two concurrent edits both succeed and the later one wins.
    pub async fn update_course(
        &self,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Record<Course>, AppError> {
        self.update::<Course>(id, patch).await
    }

    pub async fn delete_course(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(Collection::Courses, id).await
    }

    // ==================== TESTIMONIALS ====================

    pub async fn create_testimonial(&self, testimonial: &Testimonial) -> Result<String, AppError> {
        self.create(testimonial).await
    }

    pub async fn get_testimonials(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<Record<Testimonial>>, AppError> {
        self.list(query).await
    }

    pub async fn add_testimonial(&self, record: Value) -> Result<Value, AppError> {
        self.add(Collection::Testimonials, record).await
    }

    // ==================== BLOG ====================

    pub async fn create_blog_post(&self, post: &BlogPost) -> Result<String, AppError> {
        self.create(post).await
    }

    pub async fn get_blog_posts(&self, query: &ListQuery) -> Result<Vec<Record<BlogPost>>, AppError> {
        self.list(query).await
    }

    pub async fn add_blog_post(&self, record: Value) -> Result<Value, AppError> {
        self.add(Collection::Blog, record).await
    }

    // ==================== FAQS ====================

    pub async fn create_faq(&self, faq: &Faq) -> Result<String, AppError> {
        self.create(faq).await
    }

    pub async fn get_faqs(&self, query: &ListQuery) -> Result<Vec<Record<Faq>>, AppError> {
        self.list(query).await
    }

    pub async fn add_faq(&self, record: Value) -> Result<Value, AppError> {
        self.add(Collection::Faqs, record).await
    }

    // ==================== LEADS ====================

    pub async fn create_lead(&self, lead: &Lead) -> Result<String, AppError> {
        self.create(lead).await
    }

    pub async fn get_leads(&self, query: &ListQuery) -> Result<Vec<Record<Lead>>, AppError> {
        self.list(query).await
    }

    pub async fn add_lead(&self, record: Value) -> Result<Value, AppError> {
        self.add(Collection::Leads, record).await
    }

    /// Write any status; the previous value is not consulted.
    pub async fn update_lead_status(
        &self,
        id: &str,
        status: LeadStatus,
    ) -> Result<Record<Lead>, AppError> {
        let mut patch = Map::new();
        patch.insert(
            "status".to_string(),
            Value::String(status.as_str().to_string()),
        );
        self.update::<Lead>(id, patch).await
    }

    // ==================== EVENTS ====================

    pub async fn create_event(&self, event: &AnalyticsEvent) -> Result<String, AppError> {
        self.create(event).await
    }

    pub async fn get_events(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<Record<AnalyticsEvent>>, AppError> {
        self.list(query).await
    }

    pub async fn add_event(&self, record: Value) -> Result<Value, AppError> {
        self.add(Collection::Events, record).await
    }
}

fn decode<E: Entity>(document: Document) -> Result<Record<E>, AppError> {
    let id = document.id.clone();
    serde_json::from_value(document.into_record()).map_err(|e| {
        AppError::Database(format!(
            "Document {} in {} does not decode: {}",
            id,
            E::COLLECTION,
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseLevel;
    use serde_json::json;
    use std::collections::HashSet;
    use tempfile::TempDir;

    async fn open_entities() -> (Entities, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = crate::store::init_database(&temp_dir.path().join("entities.sqlite"))
            .await
            .unwrap();
        (Entities::new(DocumentStore::new(pool)), temp_dir)
    }

    /// Stored timestamps are millisecond precision.
    fn call_time() -> DateTime<Utc> {
        let now = Utc::now();
        DateTime::parse_from_rfc3339(&timestamp(now))
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_create_then_list_every_entity() {
        let (entities, _dir) = open_entities().await;
        let started = call_time();

        let course = Course {
            title: "Full Stack Development".to_string(),
            slug: "full-stack".to_string(),
            level: CourseLevel::Intermediate,
            price: Some(49999.0),
            ..Course::default()
        };
        let id = entities.create_course(&course).await.unwrap();
        let courses = entities.get_courses(&ListQuery::all()).await.unwrap();
        let stored = courses.iter().find(|r| r.id == id).unwrap();
        assert_eq!(stored.fields, course);
        assert!(stored.created_at.unwrap() >= started);
        assert!(stored.updated_at.is_some());

        let testimonial = Testimonial {
            name: "Priya".to_string(),
            course_id: id.clone(),
            content: "Great mentors".to_string(),
            rating: 5.0,
            approved: true,
        };
        let id = entities.create_testimonial(&testimonial).await.unwrap();
        let testimonials = entities.get_testimonials(&ListQuery::all()).await.unwrap();
        let stored = testimonials.iter().find(|r| r.id == id).unwrap();
        assert_eq!(stored.fields, testimonial);
        assert!(stored.created_at.unwrap() >= started);
        assert!(stored.updated_at.is_none());

        let post = BlogPost {
            title: "Why Rust".to_string(),
            slug: "why-rust".to_string(),
            content: "Because.".to_string(),
            category: "engineering".to_string(),
            image_url: None,
        };
        let id = entities.create_blog_post(&post).await.unwrap();
        let posts = entities.get_blog_posts(&ListQuery::all()).await.unwrap();
        assert_eq!(posts.iter().find(|r| r.id == id).unwrap().fields, post);

        let faq = Faq {
            question: "Are classes online?".to_string(),
            answer: "Both online and offline.".to_string(),
            category: "general".to_string(),
        };
        let id = entities.create_faq(&faq).await.unwrap();
        let faqs = entities.get_faqs(&ListQuery::all()).await.unwrap();
        assert_eq!(faqs.iter().find(|r| r.id == id).unwrap().fields, faq);
    }

    #[tokio::test]
    async fn test_create_lead_starts_as_new() {
        let (entities, _dir) = open_entities().await;
        let started = call_time();

        let id = entities
            .create_lead(&Lead {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                status: LeadStatus::Converted,
                ..Lead::default()
            })
            .await
            .unwrap();
        assert!(!id.is_empty());

        let leads = entities.get_leads(&ListQuery::all()).await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, id);
        assert_eq!(leads[0].fields.name, "A");
        assert_eq!(leads[0].fields.email, "a@x.com");
        assert_eq!(leads[0].fields.status, LeadStatus::New);
        assert!(leads[0].created_at.unwrap() >= started);

        let raw = entities
            .list_raw(Collection::Leads, &ListQuery::all())
            .await
            .unwrap();
        assert_eq!(raw[0]["status"], "new");
        assert_eq!(raw[0]["id"], json!(id));
        assert!(raw[0]["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_lead_status_accepts_every_value() {
        let (entities, _dir) = open_entities().await;
        let id = entities
            .create_lead(&Lead {
                name: "B".to_string(),
                email: "b@x.com".to_string(),
                ..Lead::default()
            })
            .await
            .unwrap();

        for status in [
            LeadStatus::Lost,
            LeadStatus::New,
            LeadStatus::Converted,
            LeadStatus::Contacted,
        ] {
            let updated = entities.update_lead_status(&id, status).await.unwrap();
            assert_eq!(updated.fields.status, status);
        }

        for status in LeadStatus::ALL {
            entities
                .add_lead(json!({"name": "C", "email": "c@x.com", "status": status.as_str()}))
                .await
                .unwrap();
        }
        let leads = entities.get_leads(&ListQuery::all()).await.unwrap();
        assert_eq!(leads.len(), 5);
    }

    #[tokio::test]
    async fn test_add_course_does_not_enforce_unique_slug() {
        let (entities, _dir) = open_entities().await;
        let first = entities
            .add_course(json!({"title": "T", "slug": "t"}))
            .await
            .unwrap();
        let second = entities
            .add_course(json!({"title": "T", "slug": "t"}))
            .await
            .unwrap();

        assert_ne!(first["id"], second["id"]);
        assert_eq!(first["slug"], "t");
        assert_eq!(second["title"], "T");

        let raw = entities
            .list_raw(Collection::Courses, &ListQuery::where_eq("slug", "t"))
            .await
            .unwrap();
        assert_eq!(raw.len(), 2);
        // add stores the record verbatim, without timestamps
        assert!(raw[0].get("createdAt").is_none());
    }

    #[tokio::test]
    async fn test_add_returns_record_with_store_id() {
        let (entities, _dir) = open_entities().await;
        let added = entities
            .add_faq(json!({"id": "caller-picked", "question": "Q", "answer": "A"}))
            .await
            .unwrap();

        assert_ne!(added["id"], "caller-picked");
        assert_eq!(added["question"], "Q");

        let err = entities.add_blog_post(json!("just a string")).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let (entities, _dir) = open_entities().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let entities = entities.clone();
                tokio::spawn(async move {
                    entities
                        .create_lead(&Lead {
                            name: format!("Lead {}", i),
                            email: format!("lead{}@x.com", i),
                            ..Lead::default()
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 16);
        assert_eq!(entities.get_leads(&ListQuery::all()).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_update_course_last_write_wins() {
        let (entities, _dir) = open_entities().await;
        let id = entities
            .create_course(&Course {
                title: "Original".to_string(),
                ..Course::default()
            })
            .await
            .unwrap();
        let created = entities.get_course(&id).await.unwrap().unwrap();

        let mut first = Map::new();
        first.insert("title".to_string(), json!("First edit"));
        let mut second = Map::new();
        second.insert("title".to_string(), json!("Second edit"));
        second.insert("createdAt".to_string(), json!("1999-01-01T00:00:00Z"));

        entities.update_course(&id, first).await.unwrap();
        let updated = entities.update_course(&id, second).await.unwrap();

        assert_eq!(updated.fields.title, "Second edit");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        entities.delete_course(&id).await.unwrap();
        assert!(entities.get_course(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_that_does_not_decode_is_rejected() {
        let (entities, _dir) = open_entities().await;
        let id = entities
            .create_course(&Course {
                title: "Cloud Computing".to_string(),
                level: CourseLevel::Beginner,
                ..Course::default()
            })
            .await
            .unwrap();
        let revision = entities.store().revision_id().await.unwrap();

        let mut patch = Map::new();
        patch.insert("level".to_string(), json!("expert"));
        let err = entities.update_course(&id, patch).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let stored = entities.get_course(&id).await.unwrap().unwrap();
        assert_eq!(stored.fields.level, CourseLevel::Beginner);
        assert_eq!(entities.store().revision_id().await.unwrap(), revision);
    }

    #[tokio::test]
    async fn test_status_write_repairs_verbatim_lead() {
        let (entities, _dir) = open_entities().await;
        let added = entities
            .add_lead(json!({"name": "B", "email": "b@x.com", "status": "archived"}))
            .await
            .unwrap();
        let id = added["id"].as_str().unwrap();

        let lead = entities
            .update_lead_status(id, LeadStatus::Contacted)
            .await
            .unwrap();
        assert_eq!(lead.fields.status, LeadStatus::Contacted);

        // a lead that stays undecodable after the write is left alone
        let broken = entities
            .add_lead(json!({"name": 7, "status": "new"}))
            .await
            .unwrap();
        let broken_id = broken["id"].as_str().unwrap();
        let err = entities
            .update_lead_status(broken_id, LeadStatus::Lost)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        let raw = entities
            .store()
            .get(Collection::Leads, broken_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw.data["status"], "new");
    }

    #[tokio::test]
    async fn test_list_of_malformed_document_is_an_error() {
        let (entities, _dir) = open_entities().await;
        entities
            .add_course(json!({"title": "Bad", "level": "expert"}))
            .await
            .unwrap();

        let err = entities.get_courses(&ListQuery::all()).await.unwrap_err();
        assert_eq!(err.error_code(), "DATABASE_ERROR");

        // the raw view still shows it
        let raw = entities
            .list_raw(Collection::Courses, &ListQuery::all())
            .await
            .unwrap();
        assert_eq!(raw.len(), 1);
    }

    #[tokio::test]
    async fn test_events_are_stamped_and_filterable() {
        let (entities, _dir) = open_entities().await;
        let click = AnalyticsEvent {
            action: "cta_click".to_string(),
            category: "engagement".to_string(),
            label: Some("enroll_now".to_string()),
        };
        let id = entities.create_event(&click).await.unwrap();
        entities
            .add_event(json!({"action": "whatsapp_click", "category": "contact"}))
            .await
            .unwrap();

        let all = entities.get_events(&ListQuery::all()).await.unwrap();
        assert_eq!(all.len(), 2);
        let stored = all.iter().find(|r| r.id == id).unwrap();
        assert_eq!(stored.fields, click);
        assert!(stored.created_at.is_some());
        assert!(stored.updated_at.is_none());

        let contact = entities
            .get_events(&ListQuery::where_eq("category", "contact"))
            .await
            .unwrap();
        assert_eq!(contact.len(), 1);
        assert_eq!(contact[0].fields.action, "whatsapp_click");
        assert_eq!(contact[0].fields.label, None);
    }
}
