//! Console adapter for development/testing

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::messaging::MessageParser;
use crate::application::services::CommandService;
use crate::domain::entities::{ChatKind, User, UserId};
use crate::domain::traits::{Bot, BotInfo};

/// Chat id used for the local console session
const CONSOLE_CHAT: UserId = 0;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "kurs-bot".to_string(),
                username: "console".to_string(),
            },
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, _chat_id: UserId, text: &str) -> Result<(), BotError> {
        println!("[BOT] {}", text);
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Read lines from stdin and feed them through the dispatcher.
pub async fn run_console(
    bot: ConsoleAdapter,
    parser: Arc<MessageParser>,
    service: Arc<CommandService>,
) {
    tracing::info!("Console mode; type commands, Ctrl-D to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let message = parser.parse(
                    CONSOLE_CHAT,
                    line,
                    Some(User::new(CONSOLE_CHAT)),
                    ChatKind::Private,
                );
                match service.handle(&message, &bot).await {
                    Ok(Some(reply)) => println!("[BOT] {}", reply),
                    Ok(None) => {}
                    Err(e) => println!("[BOT] Error: {}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("failed to read stdin: {}", e);
                break;
            }
        }
    }
}
