//! FAQ model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Faq {
    pub question: String,
    pub answer: String,
    pub category: String,
}
