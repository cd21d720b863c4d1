//! Telegram adapter (long-poll transport)

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::application::messaging::MessageParser;
use crate::application::services::CommandService;
use crate::domain::entities::{ChatKind, CommandRegistry, User, UserId};
use crate::domain::traits::{Bot, BotInfo};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Backoff after a failed getUpdates round trip
const POLL_RETRY_SECONDS: u64 = 5;

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
    poll_timeout: i64,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, poll_timeout: i64) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "kurs-bot".to_string(),
                username: "kurs_bot".to_string(),
            },
            poll_timeout,
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            result: BotInfoResponse,
        }

        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let url = self.api_url("getMe");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = BotInfo {
            id: data.result.id.to_string(),
            name: data.result.first_name,
            username: data.result.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using the getUpdates API
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: Vec<Update>,
        }

        let url = self.api_url("getUpdates");
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// The offset to acknowledge everything in `updates`
    pub fn next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Register user-facing commands with Telegram
    pub async fn register_commands(&self, registry: &CommandRegistry) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct BotCommand {
            command: String,
            description: String,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest {
            commands: Vec<BotCommand>,
        }

        let mut commands: Vec<BotCommand> = registry
            .all()
            .filter(|c| !c.admin_only)
            .map(|c| BotCommand {
                command: c.name.clone(),
                description: c.description.clone().unwrap_or_default(),
            })
            .collect();
        commands.sort_by(|a, b| a.command.cmp(&b.command));

        let url = self.api_url("setMyCommands");
        let request = SetMyCommandsRequest { commands };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!(
                "Failed to register commands: {}",
                error
            )));
        }

        tracing::info!("Registered bot commands with Telegram");
        Ok(())
    }

    /// Map a Telegram update onto a domain message
    pub fn to_domain(update: &Update, parser: &MessageParser) -> Option<crate::domain::entities::Message> {
        let msg = update.message.as_ref()?;
        let text = msg.text.clone()?;
        if text.is_empty() {
            return None;
        }

        let sender = msg.from.as_ref().map(|u| {
            let mut user = User::new(u.id);
            if let Some(ref username) = u.username {
                user = user.with_username(username);
            }
            if let Some(ref first) = u.first_name {
                user = user.with_first_name(first);
            }
            user
        });
        let kind = chat_kind(&msg.chat.kind);

        Some(
            parser
                .parse(msg.chat.id, text, sender, kind)
                .with_platform("telegram"),
        )
    }
}

fn chat_kind(kind: &str) -> ChatKind {
    if kind == "private" {
        ChatKind::Private
    } else {
        ChatKind::Group
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, chat_id: UserId, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest {
            chat_id: i64,
            text: String,
        }

        let url = self.api_url("sendMessage");
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Process one update end to end: parse, dispatch, reply. Dispatcher
/// failures degrade to an error reply; delivery failures are logged.
/// Nothing here can take the transport down.
pub async fn handle_update(
    bot: &dyn Bot,
    parser: &MessageParser,
    service: &CommandService,
    update: &Update,
) {
    let Some(message) = TelegramAdapter::to_domain(update, parser) else {
        return;
    };
    let chat_id = message.chat_id;

    let reply = match service.handle(&message, bot).await {
        Ok(Some(reply)) => reply,
        Ok(None) => return,
        Err(e) => format!("Error: {}", e),
    };

    tracing::info!(chat = chat_id, "sending reply ({} chars)", reply.len());
    if let Err(e) = bot.send_message(chat_id, &reply).await {
        tracing::error!(chat = chat_id, "failed to send reply: {}", e);
    }
}

/// Long-poll loop. Poll failures back off and retry; the loop never exits.
pub async fn run_polling(
    bot: Arc<TelegramAdapter>,
    parser: Arc<MessageParser>,
    service: Arc<CommandService>,
) {
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");
    loop {
        match bot.get_updates(offset).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                for update in &updates {
                    handle_update(bot.as_ref(), &parser, &service, update).await;
                }
                if let Some(next) = TelegramAdapter::next_offset(&updates) {
                    offset = next;
                }
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(POLL_RETRY_SECONDS)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Content;

    fn update(chat_id: i64, chat_kind: &str, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(TgMessage {
                message_id: 10,
                from: Some(TgUser {
                    id: 7,
                    username: Some("alice".to_string()),
                    first_name: None,
                }),
                chat: TgChat {
                    id: chat_id,
                    kind: chat_kind.to_string(),
                },
                text: Some(text.to_string()),
            }),
        }
    }

    #[test]
    fn maps_private_command_update() {
        let parser = MessageParser::new("/");
        let msg = TelegramAdapter::to_domain(&update(7, "private", "/price BTC"), &parser).unwrap();

        assert_eq!(msg.chat_id, 7);
        assert_eq!(msg.chat_kind, ChatKind::Private);
        assert_eq!(msg.sender_id(), 7);
        assert!(matches!(msg.content, Content::Command { ref name, .. } if name == "price"));
    }

    #[test]
    fn maps_supergroup_to_group_kind() {
        let parser = MessageParser::new("/");
        let msg =
            TelegramAdapter::to_domain(&update(-100, "supergroup", "hello"), &parser).unwrap();
        assert_eq!(msg.chat_kind, ChatKind::Group);
    }

    #[test]
    fn skips_updates_without_text() {
        let parser = MessageParser::new("/");
        let mut u = update(7, "private", "x");
        u.message.as_mut().unwrap().text = None;
        assert!(TelegramAdapter::to_domain(&u, &parser).is_none());
    }

    #[test]
    fn next_offset_acknowledges_highest_update() {
        let mut a = update(1, "private", "x");
        let mut b = update(1, "private", "y");
        a.update_id = 5;
        b.update_id = 9;
        assert_eq!(TelegramAdapter::next_offset(&[a, b]), Some(10));
        assert_eq!(TelegramAdapter::next_offset(&[]), None);
    }
}
