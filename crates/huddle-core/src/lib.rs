//! # huddle-core
//!
//! Core crate for the Huddle chat relay. Contains configuration schemas,
//! the unified error system, and the `KvStore` backing-store trait.
//!
//! This crate has **no** internal dependencies on other Huddle crates.

pub mod config;
pub mod error;
pub mod result;
pub mod store;

pub use error::AppError;
pub use result::AppResult;
