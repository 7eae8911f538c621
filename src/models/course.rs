//! Course model matching the course editor and catalog pages.

use serde::{Deserialize, Serialize};

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }
}

/// One titled section of the curriculum, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurriculumSection {
    pub section_title: String,
    pub items: Vec<String>,
}

/// A scheduled batch of a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Batch {
    pub start_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub mode: String,
    pub instructor: String,
}

/// A fee line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeItem {
    pub label: String,
    pub amount: f64,
    pub notes: String,
}

/// A course in the catalog. Every field is optional on input; nothing is
/// validated before it reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub title: String,
    /// Intended to be unique, not enforced.
    pub slug: String,
    pub description: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub duration: String,
    pub level: CourseLevel,
    pub price: Option<f64>,
    pub category: String,
    pub icon: String,
    pub mode: String,
    pub prerequisites: Option<String>,
    pub overview: Option<String>,
    pub main_image: Option<String>,
    pub logo: Option<String>,
    pub curriculum: Vec<CurriculumSection>,
    pub batches: Vec<Batch>,
    pub fees: Vec<FeeItem>,
    pub career_opportunities: Vec<String>,
    pub tools_and_technologies: Option<String>,
    pub what_you_will_learn: Option<String>,
    pub is_active: bool,
    pub syllabus_url: Option<String>,
}

impl Default for Course {
    fn default() -> Self {
        Self {
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            content: String::new(),
            image_url: None,
            duration: String::new(),
            level: CourseLevel::default(),
            price: None,
            category: String::new(),
            icon: String::new(),
            mode: String::new(),
            prerequisites: None,
            overview: None,
            main_image: None,
            logo: None,
            curriculum: Vec::new(),
            batches: Vec::new(),
            fees: Vec::new(),
            career_opportunities: Vec::new(),
            tools_and_technologies: None,
            what_you_will_learn: None,
            is_active: true,
            syllabus_url: None,
        }
    }
}
