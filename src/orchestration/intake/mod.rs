//! Bulk intake: queue one backup per row of a delimited course list.
//!
//! Rows are processed independently. A failing row never rolls back the
//! rows before it; the summary reports partial success.

mod parser;
mod processor;
mod summary;

pub use parser::{IntakeDelimiter, IntakeFile, IntakeFileError, IntakeRow};
pub use processor::{BulkIntakeProcessor, IntakeError};
pub use summary::{IntakeSummary, SummaryRenderError};
