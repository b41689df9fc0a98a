/// Core Module for sqlseed
///
/// Shared infrastructure: database access and the error type.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{Result, SeedError};
