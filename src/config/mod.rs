//! Configuration module
//!
//! Handles loading and validation of `cvpipeline` configuration files:
//! autorun timings, collaborator endpoints and the résumé dataset path.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
