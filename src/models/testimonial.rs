//! Testimonial model.

use serde::{Deserialize, Serialize};

/// A student testimonial. `course_id` is a weak reference: it is never
/// checked against the courses collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    pub name: String,
    pub course_id: String,
    pub content: String,
    pub rating: f64,
    /// Only approved testimonials are shown on the home page.
    pub approved: bool,
}
