//! Storage backend adapters.

pub mod factory;
pub mod memory;
pub mod shared_disk;
pub mod web_service;

pub use factory::storage_from_settings;
pub use memory::InMemoryStorage;
pub use shared_disk::SharedDiskStorage;
pub use web_service::WebServiceStorage;
