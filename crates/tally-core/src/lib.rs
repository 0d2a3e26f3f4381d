pub mod config;
pub mod enrich;
pub mod error;
pub mod store;
pub mod summary;
pub mod visit;
