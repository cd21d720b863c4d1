//! Platform adapters - interchangeable transports feeding the dispatcher

pub mod console;
pub mod telegram;
pub mod webhook;
