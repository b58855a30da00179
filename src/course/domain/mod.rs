//! Domain model for courses and categories on the host platform.

mod course;
mod error;
mod ids;

pub use course::{ArchiveHandle, Category, Course};
pub use error::CourseDomainError;
pub use ids::{CategoryId, CourseId};
