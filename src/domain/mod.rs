//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (User, Message, Command, quotes)
//! - Traits: Abstractions for infrastructure (Bot, UserStore, QuoteSource)

pub mod entities;
pub mod traits;
