//! # huddle-store
//!
//! Backing-store implementations for Huddle session state. The only
//! in-tree backend is the in-memory [`MemoryKvStore`]; persistence beyond
//! the process lifetime is an explicit non-goal, so the trait boundary in
//! `huddle-core` exists for test seams and future backends, not for
//! durability.

pub mod memory;

pub use memory::MemoryKvStore;
