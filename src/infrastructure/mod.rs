//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Market: CoinGecko price lookup client
//! - Registry: Durable user-id set for broadcasts
//! - Adapters: Platform integrations (Telegram long-poll, webhook, console)

pub mod adapters;
pub mod config;
pub mod market;
pub mod registry;
