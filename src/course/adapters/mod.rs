//! Course capability adapters.

pub mod memory;

pub use memory::InMemoryCourseHost;
