//! Error types for course domain validation.

use thiserror::Error;

/// Errors returned while constructing course domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CourseDomainError {
    /// The course identifier is zero.
    #[error("invalid course id {0}, expected a positive integer")]
    InvalidCourseId(u64),

    /// The category identifier is zero.
    #[error("invalid category id {0}, expected a positive integer")]
    InvalidCategoryId(u64),
}
