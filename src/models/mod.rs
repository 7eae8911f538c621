//! Data models for the institute website.
//!
//! Field names serialize in camelCase to match the page code that consumes them.

mod blog;
mod course;
mod event;
mod faq;
mod lead;
mod record;
mod testimonial;
mod user;

pub use blog::*;
pub use course::*;
pub use event::*;
pub use faq::*;
pub use lead::*;
pub use record::*;
pub use testimonial::*;
pub use user::*;
