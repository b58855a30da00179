//! Identifier types for host platform courses and categories.

use super::CourseDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive identifier of a course on the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CourseId(u64);

impl CourseId {
    /// Creates a validated course identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CourseDomainError::InvalidCourseId`] when the value is zero.
    pub const fn new(value: u64) -> Result<Self, CourseDomainError> {
        if value == 0 {
            return Err(CourseDomainError::InvalidCourseId(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for CourseId {
    type Error = CourseDomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourseId> for u64 {
    fn from(value: CourseId) -> Self {
        value.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive identifier of a course category on the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CategoryId(u64);

impl CategoryId {
    /// Creates a validated category identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CourseDomainError::InvalidCategoryId`] when the value is
    /// zero.
    pub const fn new(value: u64) -> Result<Self, CourseDomainError> {
        if value == 0 {
            return Err(CourseDomainError::InvalidCategoryId(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for CategoryId {
    type Error = CourseDomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryId> for u64 {
    fn from(value: CategoryId) -> Self {
        value.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
