//! Session vault implementations.

pub mod json;
pub mod memory;

pub use json::JsonFileVault;
pub use memory::MemoryVault;
