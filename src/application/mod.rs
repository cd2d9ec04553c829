//! Application Layer - Use cases and application services
//!
//! This module orchestrates the business logic and coordinates between
//! the domain and infrastructure layers.

pub mod errors;
pub mod services;
pub mod use_cases;


pub use errors::*;
pub use services::*;
pub use use_cases::*;
