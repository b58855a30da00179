//! Unit tests for the orchestration services.

mod backup_tests;
mod support;
