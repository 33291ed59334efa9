//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based wallet provider and the Keyboards contract binding
//! - Tokio runtime bridge for async operations

pub mod ethereum;
pub mod runtime;
