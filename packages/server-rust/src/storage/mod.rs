//! Persistence for the `Fintrack` server.
//!
//! - [`memory`]: `DashMap`-backed [`Repository`](crate::traits::Repository)
//!   and [`UserDirectory`](crate::traits::UserDirectory) implementations
//! - [`revocations`]: revoked session token ids

pub mod memory;
pub mod revocations;

pub use memory::{MemoryRepository, MemoryUserDirectory};
pub use revocations::TokenRevocations;
