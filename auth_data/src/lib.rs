//! Data layer for the credential and session core
//!
//! MongoDB-backed storage for users and issued token pairs.

pub mod entities;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod repositories;

pub use entities::*;
pub use error::*;
pub use repositories::*;
