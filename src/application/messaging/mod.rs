//! Message handling - parsing raw transport text into domain messages

pub mod parser;

pub use parser::MessageParser;
