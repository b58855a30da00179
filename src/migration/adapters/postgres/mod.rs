//! `PostgreSQL` adapters for migration record persistence.

mod models;
mod repository;
mod schema;

pub use repository::{MigrationPgPool, PostgresMigrationRepository};
