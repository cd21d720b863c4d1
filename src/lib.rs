//! kurs-bot - Telegram crypto price and broadcast bot
//!
//! Layering: `domain` holds entities and trait seams, `application` holds
//! the command dispatcher and error taxonomy, `infrastructure` holds the
//! CoinGecko client, the user registry and the transport adapters.

pub mod application;
pub mod domain;
pub mod infrastructure;
