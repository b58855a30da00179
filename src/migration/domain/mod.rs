//! Domain model for migration records.

mod error;
mod filter;
mod ids;
mod record;
mod status;

pub use error::{MigrationDomainError, ParseMigrationActionError, ParseMigrationStatusError};
pub use filter::{MigrationFilter, MigrationReportRow};
pub use ids::MigrationId;
pub use record::{MigrationRecord, PersistedMigrationData};
pub use status::{MigrationAction, MigrationStatus};
