//! Command dispatch: argument validation, lookups, reply formatting.
//!
//! Stateless per invocation; the only side effect is the user registry.
//! Every failure is converted to a reply string here, so nothing can
//! propagate out and take down a transport loop.

use std::sync::Arc;

use crate::application::errors::{CommandError, LookupError};
use crate::domain::entities::{ChatKind, Command, CommandRegistry, Content, Message, UserId};
use crate::domain::traits::{AdminPolicy, Bot, QuoteSource, UserStore};

/// Quote currencies shown by /price, matching the original bot output.
const PRICE_QUOTES: [&str; 2] = ["usd", "inr"];
/// Common reference currency used by /convert and /stats.
const REFERENCE_QUOTE: &str = "usd";

const ACCESS_DENIED: &str = "🚫 Access denied. This command is for admins only.";
const ADMIN_UNCONFIGURED: &str = "🚫 Admin features are not configured.";
const INVALID_SYMBOL: &str = "🚫 Invalid cryptocurrency symbol. Please check and try again.";
const INVALID_SYMBOLS: &str = "🚫 Invalid cryptocurrency symbols. Please check and try again.";
const INVALID_SYMBOL_OR_CURRENCY: &str =
    "🚫 Invalid cryptocurrency symbol or currency. Please check and try again.";

/// Service for validating and executing commands
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
    quotes: Arc<dyn QuoteSource>,
    users: Arc<dyn UserStore>,
    admin: Arc<dyn AdminPolicy>,
    prune_unreachable: bool,
}

impl CommandService {
    pub fn new(
        prefix: impl Into<String>,
        quotes: Arc<dyn QuoteSource>,
        users: Arc<dyn UserStore>,
        admin: Arc<dyn AdminPolicy>,
        prune_unreachable: bool,
    ) -> Self {
        Self {
            registry: CommandRegistry::new(),
            prefix: prefix.into(),
            quotes,
            users,
            admin,
            prune_unreachable,
        }
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    pub fn register_defaults(&mut self) {
        self.register(
            Command::new("start")
                .with_description("Welcome message and command list")
                .with_aliases(vec!["help".to_string()]),
        );
        self.register(
            Command::new("price")
                .with_description("Current price of a coin")
                .with_usage("/price <crypto_symbol> (e.g., /price BTC)"),
        );
        self.register(
            Command::new("stats")
                .with_description("24h change, high/low and volume")
                .with_aliases(vec!["change".to_string()])
                .with_usage("/stats <crypto_symbol> (e.g., /stats BTC)"),
        );
        self.register(
            Command::new("convert")
                .with_description("Convert between two coins")
                .with_usage("/convert <amount> <from_crypto> <to_crypto> (e.g., /convert 1 BTC ETH)"),
        );
        self.register(
            Command::new("fiat")
                .with_description("Value of a coin in a fiat currency")
                .with_usage("/fiat <amount> <crypto> <currency> (e.g., /fiat 1 BTC INR)"),
        );
        self.register(
            Command::new("broadcast")
                .with_description("Send a message to all registered users")
                .with_usage("/broadcast <message>")
                .admin_only(),
        );
        self.register(
            Command::new("send")
                .with_description("Send a message to a specific chat")
                .with_aliases(vec!["sendgroup".to_string()])
                .with_usage("/send <chat_id> <message>")
                .admin_only(),
        );
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Dispatch a message. `Ok(None)` means no reply should be sent.
    /// The outbound `bot` is only used by the admin delivery commands.
    pub async fn handle(
        &self,
        message: &Message,
        bot: &dyn Bot,
    ) -> Result<Option<String>, CommandError> {
        let Content::Command { name, args } = &message.content else {
            return Ok(None);
        };

        let Some(cmd) = self.registry.find(name) else {
            tracing::debug!(command = %name, "ignoring unknown command");
            return Ok(None);
        };

        if cmd.admin_only {
            if !self.admin.is_configured() {
                return Ok(Some(ADMIN_UNCONFIGURED.to_string()));
            }
            if !self.admin.is_admin(message.sender_id()) {
                tracing::warn!(
                    user = message.sender_id(),
                    command = %cmd.name,
                    "denied admin command"
                );
                return Ok(Some(ACCESS_DENIED.to_string()));
            }
        }

        let reply = match cmd.name.as_str() {
            "start" => self.cmd_start(message).await,
            "price" => Some(self.cmd_price(args).await),
            "stats" => Some(self.cmd_stats(args).await),
            "convert" => Some(self.cmd_convert(args).await),
            "fiat" => Some(self.cmd_fiat(args).await),
            "broadcast" => Some(self.cmd_broadcast(args, bot).await),
            "send" => Some(self.cmd_send(args, bot).await),
            _ => None,
        };

        Ok(reply)
    }

    /// /start and /help: greet and register the caller, private chats only.
    async fn cmd_start(&self, message: &Message) -> Option<String> {
        if message.chat_kind != ChatKind::Private {
            return None;
        }

        match self.users.record_if_new(message.sender_id()).await {
            Ok(true) => tracing::info!(user = message.sender_id(), "registered new user"),
            Ok(false) => {}
            Err(e) => tracing::error!("failed to persist user registry: {}", e),
        }

        Some(self.greeting())
    }

    fn greeting(&self) -> String {
        let mut text = String::from(
            "👋 Welcome to the Crypto Bot!\n\
             I can help with real-time crypto prices and conversions.\n\n\
             Commands:\n",
        );

        let mut commands: Vec<&Command> = self
            .registry
            .all()
            .filter(|c| !c.admin_only && c.name != "start")
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        for cmd in commands {
            match &cmd.usage {
                Some(usage) => text.push_str(&format!("- {}\n", usage)),
                None => text.push_str(&format!("- /{}\n", cmd.name)),
            }
        }

        text.push_str("\nType a command to get started! 🚀");
        text
    }

    async fn cmd_price(&self, args: &[String]) -> String {
        let [symbol] = args else {
            return usage("/price <crypto_symbol> (e.g., /price BTC)");
        };
        let id = symbol.to_lowercase();

        match self.quotes.simple_price(&[id.as_str()], &PRICE_QUOTES).await {
            Ok(table) => {
                let usd = table.price_of(&id, "usd");
                let inr = table.price_of(&id, "inr");
                match (usd, inr) {
                    (Some(usd), Some(inr)) => format!(
                        "💰 {} Price:\nUSD: ${}\nINR: ₹{}",
                        id.to_uppercase(),
                        format_thousands(usd, 2),
                        format_thousands(inr, 2),
                    ),
                    _ => INVALID_SYMBOL.to_string(),
                }
            }
            Err(e) => lookup_reply(e, INVALID_SYMBOL),
        }
    }

    async fn cmd_stats(&self, args: &[String]) -> String {
        let [symbol] = args else {
            return usage("/stats <crypto_symbol> (e.g., /stats BTC)");
        };
        let id = symbol.to_lowercase();

        match self.quotes.market_stats(&id, REFERENCE_QUOTE).await {
            Ok(stats) => {
                let mut text = format!(
                    "📊 {} 24h Stats:\nPrice: ${}",
                    id.to_uppercase(),
                    format_thousands(stats.price, 2),
                );
                if let Some(change) = stats.change_24h {
                    text.push_str(&format!("\nChange: {:+.2}%", change));
                }
                if let Some(high) = stats.high_24h {
                    text.push_str(&format!("\nHigh: ${}", format_thousands(high, 2)));
                }
                if let Some(low) = stats.low_24h {
                    text.push_str(&format!("\nLow: ${}", format_thousands(low, 2)));
                }
                if let Some(volume) = stats.volume_24h {
                    text.push_str(&format!("\nVolume: ${}", format_thousands(volume, 2)));
                }
                text
            }
            Err(e) => lookup_reply(e, INVALID_SYMBOL),
        }
    }

    async fn cmd_convert(&self, args: &[String]) -> String {
        let [amount, from, to] = args else {
            return usage("/convert <amount> <from_crypto> <to_crypto> (e.g., /convert 1 BTC ETH)");
        };
        let Ok(amount) = amount.parse::<f64>() else {
            return usage("/convert <amount> <from_crypto> <to_crypto> (e.g., /convert 1 BTC ETH)");
        };
        let from_id = from.to_lowercase();
        let to_id = to.to_lowercase();

        match self
            .quotes
            .simple_price(&[from_id.as_str(), to_id.as_str()], &[REFERENCE_QUOTE])
            .await
        {
            Ok(table) => {
                let from_price = table.price_of(&from_id, REFERENCE_QUOTE);
                let to_price = table.price_of(&to_id, REFERENCE_QUOTE);
                match (from_price, to_price) {
                    (Some(from_price), Some(to_price)) if to_price != 0.0 => {
                        let equivalent = amount * (from_price / to_price);
                        format!(
                            "🔄 Conversion:\n{} {} = {} {}",
                            amount,
                            from_id.to_uppercase(),
                            format_thousands(equivalent, 4),
                            to_id.to_uppercase(),
                        )
                    }
                    _ => INVALID_SYMBOLS.to_string(),
                }
            }
            Err(LookupError::UnknownSymbol(_)) => INVALID_SYMBOLS.to_string(),
            Err(e) => lookup_reply(e, INVALID_SYMBOLS),
        }
    }

    async fn cmd_fiat(&self, args: &[String]) -> String {
        let [amount, symbol, currency] = args else {
            return usage("/fiat <amount> <crypto> <currency> (e.g., /fiat 1 BTC INR)");
        };
        let Ok(amount) = amount.parse::<f64>() else {
            return usage("/fiat <amount> <crypto> <currency> (e.g., /fiat 1 BTC INR)");
        };
        let id = symbol.to_lowercase();
        let currency = currency.to_lowercase();

        match self.quotes.simple_price(&[id.as_str()], &[currency.as_str()]).await {
            Ok(table) => match table.price_of(&id, &currency) {
                Some(price) => format!(
                    "💵 Conversion:\n{} {} = {} {}",
                    amount,
                    id.to_uppercase(),
                    format_thousands(amount * price, 2),
                    currency.to_uppercase(),
                ),
                None => INVALID_SYMBOL_OR_CURRENCY.to_string(),
            },
            Err(e) => lookup_reply(e, INVALID_SYMBOL_OR_CURRENCY),
        }
    }

    /// Deliver a message to every registered user. Per-recipient outcomes are
    /// independent; one unreachable user never aborts the batch.
    async fn cmd_broadcast(&self, args: &[String], bot: &dyn Bot) -> String {
        if args.is_empty() {
            return usage("/broadcast <message>");
        }
        let text = args.join(" ");

        let mut successful = 0u32;
        let mut failed = 0u32;
        for user_id in self.users.snapshot().await {
            match bot.send_message(user_id, &text).await {
                Ok(()) => successful += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(user = user_id, "broadcast delivery failed: {}", e);
                    if self.prune_unreachable {
                        if let Err(e) = self.users.remove(user_id).await {
                            tracing::error!(user = user_id, "failed to prune user: {}", e);
                        }
                    }
                }
            }
        }

        format!("📢 Broadcast sent to {} users ({} failed).", successful, failed)
    }

    async fn cmd_send(&self, args: &[String], bot: &dyn Bot) -> String {
        if args.len() < 2 {
            return usage("/send <chat_id> <message>");
        }
        let Ok(chat_id) = args[0].parse::<UserId>() else {
            return "❌ Invalid chat ID. It must be a number (e.g., -1001234567890).".to_string();
        };
        let text = args[1..].join(" ");

        match bot.send_message(chat_id, &text).await {
            Ok(()) => format!("📢 Message sent to chat {}.", chat_id),
            Err(e) => format!(
                "❌ Failed to send: {} (Ensure the bot is in the chat with permissions).",
                e
            ),
        }
    }
}

fn usage(text: &str) -> String {
    format!("🚫 Usage: {}", text)
}

/// Map a lookup failure to a user-facing reply. Unknown symbols get the
/// command-specific hint; transport and schema faults share the generic
/// API-error message so internals never leak beyond a short diagnostic.
fn lookup_reply(err: LookupError, unknown_text: &str) -> String {
    match err {
        LookupError::UnknownSymbol(_) => unknown_text.to_string(),
        e => format!("❌ Error fetching data from API: {}. Please try again later.", e),
    }
}

/// Fixed decimal places with thousands separators in the integer part.
fn format_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}
