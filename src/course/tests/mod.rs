//! Unit tests for the course context.
