//! Adapters for the Nondh Engine
//!
//! Concrete implementations of the outbound ports.

pub mod memory_store;

pub use memory_store::InMemorySnapshotStore;
