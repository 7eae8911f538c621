//! Collection-level document operations.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::errors::AppError;

/// The named collections of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Courses,
    Testimonials,
    Blog,
    Faqs,
    Leads,
    Events,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Courses,
        Collection::Testimonials,
        Collection::Blog,
        Collection::Faqs,
        Collection::Leads,
        Collection::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Courses => "courses",
            Collection::Testimonials => "testimonials",
            Collection::Blog => "blog",
            Collection::Faqs => "faqs",
            Collection::Leads => "leads",
            Collection::Events => "events",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("Collection {} not found", s)))
    }
}

/// A stored document: the store-assigned id and the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// The body with the identifier merged in as `id`.
    pub fn into_record(self) -> Value {
        let mut record = Map::with_capacity(self.data.len() + 1);
        record.insert("id".to_string(), Value::String(self.id));
        record.extend(self.data);
        Value::Object(record)
    }
}

/// Sort direction of an order clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Equality clause on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Order clause on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOrder {
    pub field: String,
    pub direction: Direction,
}

/// A collection scan with at most one equality filter and one order clause.
///
/// Without an order clause documents come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: Option<FieldFilter>,
    pub order: Option<FieldOrder>,
}

impl ListQuery {
    /// Scan every document of the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some(FieldFilter {
                field: field.into(),
                value: value.into(),
            }),
            order: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(FieldOrder {
            field: field.into(),
            direction,
        });
        self
    }
}

/// Document store over the shared SQLite pool.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Insert a document and return its newly assigned id.
    ///
    /// The body must be a JSON object. A caller-supplied `id` key is dropped.
    pub async fn insert(&self, collection: Collection, body: Value) -> Result<String, AppError> {
        let mut data = into_object(collection, body)?;
        data.remove("id");

        let id = new_document_id();
        let now = Utc::now().to_rfc3339();
        let encoded = serde_json::to_string(&data)
            .map_err(|e| AppError::Internal(format!("Failed to encode document: {}", e)))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO documents (id, collection, data, written_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(collection.as_str())
            .bind(&encoded)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        bump_revision(&mut tx, &now).await?;
        tx.commit().await?;

        tracing::debug!(%collection, %id, "Inserted document");
        Ok(id)
    }

    /// Get one document by id.
    pub async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// Scan a collection. An empty collection yields an empty vector.
    pub async fn list(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Document>, AppError> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
        if query.filter.is_some() {
            sql.push_str(" AND json_extract(data, ?) IS ?");
        }
        match &query.order {
            Some(order) => {
                sql.push_str(" ORDER BY json_extract(data, ?) ");
                sql.push_str(match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                });
                sql.push_str(", rowid ASC");
            }
            None => sql.push_str(" ORDER BY rowid ASC"),
        }

        let mut q = sqlx::query(&sql).bind(collection.as_str());
        if let Some(filter) = &query.filter {
            q = bind_json(q.bind(field_path(&filter.field)?), &filter.value);
        }
        if let Some(order) = &query.order {
            q = q.bind(field_path(&order.field)?);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(document_from_row).collect()
    }

    /// Shallow-merge `patch` into an existing document. Last write wins.
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Document, AppError> {
        self.update_checked(collection, id, patch, |document| Ok(document.clone()))
            .await
    }

    /// Like [`DocumentStore::update`], but `check` sees the merged document
    /// first. If it fails nothing is written and the revision is unchanged.
    pub async fn update_checked<T, F>(
        &self,
        collection: Collection,
        id: &str,
        mut patch: Map<String, Value>,
        check: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce(&Document) -> Result<T, AppError>,
    {
        patch.remove("id");
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut document = match row.as_ref() {
            Some(row) => document_from_row(row)?,
            None => {
                return Err(AppError::NotFound(format!(
                    "Document {} not found in {}",
                    id, collection
                )))
            }
        };

        document.data.extend(patch);
        // Dropping the transaction on error rolls it back
        let checked = check(&document)?;
        let encoded = serde_json::to_string(&document.data)
            .map_err(|e| AppError::Internal(format!("Failed to encode document: {}", e)))?;

        sqlx::query("UPDATE documents SET data = ?, written_at = ? WHERE collection = ? AND id = ?")
            .bind(&encoded)
            .bind(&now)
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        bump_revision(&mut tx, &now).await?;
        tx.commit().await?;

        Ok(checked)
    }

    /// Delete a document.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Document {} not found in {}",
                id, collection
            )));
        }

        bump_revision(&mut tx, &now).await?;
        tx.commit().await?;
        Ok(())
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

async fn bump_revision(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    now: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Bind a JSON value the way `json_extract` reports it back.
fn bind_json<'q>(q: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => q.bind(i),
            None => q.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => q.bind(s.clone()),
        other => q.bind(other.to_string()),
    }
}

fn field_path(field: &str) -> Result<String, AppError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(AppError::Validation(format!(
            "Invalid field name in query: {:?}",
            field
        )));
    }
    Ok(format!("$.{}", field))
}

fn into_object(collection: Collection, body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(format!(
            "Documents in {} must be JSON objects, got {}",
            collection,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn document_from_row(row: &SqliteRow) -> Result<Document, AppError> {
    let id: String = row.get("id");
    let raw: String = row.get("data");
    let data = serde_json::from_str(&raw)
        .map_err(|e| AppError::Database(format!("Corrupt document {}: {}", id, e)))?;
    Ok(Document { id, data })
}
