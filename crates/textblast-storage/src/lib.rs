//! TextBlast Storage - Data model and repositories
//!
//! This crate provides the persisted data model and the repository layer
//! backing it. Repositories share a single [`store::MemoryStore`]; swapping
//! the backing store is the extension point for durable persistence.

pub mod models;
pub mod repository;
pub mod store;

pub use models::*;
pub use repository::*;
pub use store::{MemoryStore, StoreError};
