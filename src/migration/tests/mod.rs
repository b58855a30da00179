//! Unit tests for the migration context.

mod repository_tests;
