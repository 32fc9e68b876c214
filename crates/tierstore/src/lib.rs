//! # tierstore
//!
//! Secondary-store interface for the TierCache workspace.
//!
//! ## Contents
//! - **`Storage` trait**: the collaborator the cache consults on misses
//! - **`MapStore`**: in-memory reference store for tests and benchmarks
//! - **Error taxonomy**: `NotFound`, `Io`, `Backend`

#![warn(missing_docs)]

mod error;
mod storage;

pub use error::{Error, Result};
pub use storage::{MapStore, Storage};
