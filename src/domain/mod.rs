//! Domain Layer - Core business logic and entities
//!
//! This module contains the scan records, listing entries and the pure
//! services that normalize payloads, select files, and filter findings.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use services::*;
pub use value_objects::*;
