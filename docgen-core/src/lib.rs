//! Docgen Core - Core data structures and trait definitions
//!
//! This module defines the shared data model, error taxonomy, configuration and
//! runtime utilities used by the repository crawler and the code extractor

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod rate_limit;
pub mod traits;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use rate_limit::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
