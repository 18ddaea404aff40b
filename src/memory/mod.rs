//! Allocation front end and backing containers

pub mod config;
pub mod manager;
pub mod regions;

pub use config::MemoryConfig;
pub use manager::MemoryManager;
pub use regions::{Block, MappedRegion};
