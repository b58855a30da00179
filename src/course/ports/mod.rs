//! Port contracts for the host platform's course capabilities.

pub mod host;

pub use host::{CourseBackup, CourseHostError, CourseHostResult, CourseRestore};
