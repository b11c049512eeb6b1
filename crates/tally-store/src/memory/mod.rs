//! In-memory reference backend.

pub mod store;

pub use store::MemoryStore;
