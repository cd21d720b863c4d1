//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod message;
pub mod quote;
pub mod user;

pub use command::{Command, CommandRegistry};
pub use message::{ChatKind, Content, Message};
pub use quote::{MarketStats, PriceTable};
pub use user::{User, UserId};
