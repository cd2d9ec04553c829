//! Infrastructure Layer - External concerns and implementations
//!
//! This module handles external systems: the remote repository over HTTP
//! and the scan database.

pub mod repositories;
pub mod repository_source;
pub mod resilience;

pub use repositories::*;
pub use repository_source::*;
pub use resilience::*;
