//! Message parser - Parses raw text into structured messages

use crate::domain::entities::{ChatKind, Content, Message, User, UserId};

/// Parses incoming text into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(
        &self,
        chat_id: UserId,
        text: impl Into<String>,
        sender: Option<User>,
        chat_kind: ChatKind,
    ) -> Message {
        let text = text.into();

        if text.starts_with('/') || text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, text, sender, chat_kind);
        }

        Message::new(chat_id, Content::Text(text))
            .with_sender_opt(sender)
            .with_chat_kind(chat_kind)
    }

    /// Parse a command message
    fn parse_command(
        &self,
        chat_id: UserId,
        text: String,
        sender: Option<User>,
        chat_kind: ChatKind,
    ) -> Message {
        let cmd_text = if let Some(stripped) = text.strip_prefix('/') {
            stripped
        } else {
            text.trim_start_matches(&self.command_prefix)
        };

        let parts: Vec<&str> = cmd_text.split_whitespace().collect();
        let raw_name = parts.first().copied().unwrap_or("");
        // In groups Telegram appends the bot mention: "/price@kurs_bot BTC"
        let name = raw_name.split('@').next().unwrap_or("").to_string();
        let args: Vec<String> = parts.iter().skip(1).map(|s| s.to_string()).collect();

        Message::new(chat_id, Content::Command { name, args })
            .with_sender_opt(sender)
            .with_chat_kind(chat_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MessageParser {
        MessageParser::new("/")
    }

    #[test]
    fn parses_command_with_args() {
        let msg = parser().parse(7, "/convert 1 BTC ETH", None, ChatKind::Private);
        match msg.content {
            Content::Command { name, args } => {
                assert_eq!(name, "convert");
                assert_eq!(args, vec!["1", "BTC", "ETH"]);
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn strips_bot_mention_from_command_name() {
        let msg = parser().parse(-100, "/price@kurs_bot BTC", None, ChatKind::Group);
        match msg.content {
            Content::Command { name, args } => {
                assert_eq!(name, "price");
                assert_eq!(args, vec!["BTC"]);
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn bare_prefix_yields_empty_command() {
        let msg = parser().parse(7, "/", None, ChatKind::Private);
        match msg.content {
            Content::Command { name, args } => {
                assert_eq!(name, "");
                assert!(args.is_empty());
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn plain_text_is_not_a_command() {
        let msg = parser().parse(7, "what is btc", None, ChatKind::Private);
        assert!(!msg.content.is_command());
        assert_eq!(msg.content.text(), Some("what is btc"));
    }

    #[test]
    fn keeps_sender_and_chat_kind() {
        let sender = User::new(99).with_username("alice");
        let msg = parser().parse(-5, "/start", Some(sender), ChatKind::Group);
        assert_eq!(msg.sender_id(), 99);
        assert_eq!(msg.chat_kind, ChatKind::Group);
    }
}
