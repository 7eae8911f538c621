//! Analytics event model.

use serde::{Deserialize, Serialize};

/// A page interaction reported by the site, such as a call-to-action click.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsEvent {
    pub action: String,
    pub category: String,
    pub label: Option<String>,
}
