//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Command dispatch and reply formatting
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing

pub mod errors;
pub mod messaging;
pub mod services;
