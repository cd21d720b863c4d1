//! Domain traits - Abstractions for infrastructure implementations

pub mod admin;
pub mod bot;
pub mod quotes;
pub mod store;

pub use admin::{AdminPolicy, StaticAdmin};
pub use bot::{Bot, BotInfo};
pub use quotes::QuoteSource;
pub use store::UserStore;
