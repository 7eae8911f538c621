//! Stored record wrapper shared by every entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity as read back from its collection: the store-assigned id, the
/// entity fields, and the timestamps stamped at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub fields: T,
    /// Absent on records inserted verbatim through `add`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
