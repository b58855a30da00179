//! Unit tests for archive storage.

mod shared_disk_tests;
mod web_service_tests;
