//! Configuration management

use crate::application::errors::ConfigError;
use crate::domain::entities::UserId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub adapters: AdaptersConfig,
    pub admin: AdminConfig,
    pub registry: RegistryConfig,
    pub market: MarketConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
    pub poll_timeout_seconds: i64,
    pub webhook: WebhookConfig,
}

/// Webhook transport; when disabled the long-poll loop is used instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebhookConfig {
    pub enabled: bool,
    pub bind: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdminConfig {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    pub path: PathBuf,
    /// Drop users from the registry when a broadcast delivery to them fails.
    pub prune_unreachable: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MarketConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "kurs-bot".to_string(),
                prefix: "/".to_string(),
            },
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: true,
                    token: None,
                    poll_timeout_seconds: 30,
                    webhook: WebhookConfig {
                        enabled: false,
                        bind: "0.0.0.0:8080".to_string(),
                        path: "/webhook".to_string(),
                    },
                }),
                console: Some(ConsoleConfig { enabled: false }),
            },
            admin: AdminConfig { user_id: None },
            registry: RegistryConfig {
                path: PathBuf::from("users.json"),
                prune_unreachable: false,
            },
            market: MarketConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                timeout_seconds: 10,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if let Some(ref mut tg) = config.adapters.telegram {
                tg.token = Some(token);
                tg.enabled = true;
            }
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            config.bot.prefix = prefix;
        }

        if let Ok(admin) = std::env::var("ADMIN_ID") {
            match admin.parse::<UserId>() {
                Ok(id) => config.admin.user_id = Some(id),
                Err(_) => tracing::warn!("ADMIN_ID is not numeric, ignoring"),
            }
        }

        config
    }

    /// Apply environment overrides on top of a file-loaded config.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if let Some(ref mut tg) = self.adapters.telegram {
                tg.token = Some(token);
            }
        }
        if let Ok(admin) = std::env::var("ADMIN_ID") {
            if let Ok(id) = admin.parse::<UserId>() {
                self.admin.user_id = Some(id);
            }
        }
    }

    /// The bot token, required to run the Telegram transports.
    pub fn require_token(&self) -> Result<String, ConfigError> {
        self.adapters
            .telegram
            .as_ref()
            .and_then(|t| t.token.clone())
            .ok_or_else(|| ConfigError::MissingField("adapters.telegram.token".to_string()))
    }
}
