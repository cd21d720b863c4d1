use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use kurs_bot::application::errors::BotError;
use kurs_bot::application::messaging::MessageParser;
use kurs_bot::application::services::CommandService;
use kurs_bot::domain::traits::{Bot, StaticAdmin, UserStore};
use kurs_bot::infrastructure::adapters::console::{run_console, ConsoleAdapter};
use kurs_bot::infrastructure::adapters::telegram::{run_polling, TelegramAdapter};
use kurs_bot::infrastructure::adapters::webhook::{self, WebhookState};
use kurs_bot::infrastructure::config::Config;
use kurs_bot::infrastructure::market::CoinGeckoClient;
use kurs_bot::infrastructure::registry::FileRegistry;

#[derive(Parser)]
#[command(name = "kurs-bot")]
#[command(about = "Telegram crypto price and broadcast bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_bot(cli.config, cli.token) {
                tracing::error!("Fatal: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("kurs-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: String, token_override: Option<String>) -> Result<(), BotError> {
    // Load config
    let mut config = if std::path::Path::new(&config_path).exists() {
        match Config::load(&config_path) {
            Ok(mut config) => {
                config.apply_env();
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::load_env()
            }
        }
    } else {
        Config::load_env()
    };

    if let Some(token) = token_override {
        if let Some(ref mut tg) = config.adapters.telegram {
            tg.token = Some(token);
        }
    }

    tracing::info!("Starting {}", config.bot.name);

    // Registry: durable broadcast targets, loaded once
    let registry = Arc::new(FileRegistry::open(&config.registry.path)?);

    // Admin policy: single static id; absence degrades admin commands
    if config.admin.user_id.is_none() {
        tracing::warn!("ADMIN_ID not set. Admin commands are disabled.");
    }
    let admin = Arc::new(StaticAdmin::new(config.admin.user_id));

    // Price lookup client with a bounded per-request timeout
    let quotes = Arc::new(CoinGeckoClient::new(
        &config.market.base_url,
        Duration::from_secs(config.market.timeout_seconds),
    )?);

    let mut service = CommandService::new(
        &config.bot.prefix,
        quotes,
        registry.clone(),
        admin,
        config.registry.prune_unreachable,
    );
    service.register_defaults();
    let service = Arc::new(service);
    let parser = Arc::new(MessageParser::new(&config.bot.prefix));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("failed to start runtime: {}", e)))?;

    rt.block_on(async {
        tracing::info!("{} registered users loaded", registry.len().await);

        // Console mode for local development, no token required
        if config
            .adapters
            .console
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
        {
            run_console(ConsoleAdapter::new(), parser, service).await;
            return Ok(());
        }

        let token = config
            .require_token()
            .map_err(|e| BotError::Config(e.to_string()))?;
        let Some(tg_config) = config.adapters.telegram.clone() else {
            return Err(BotError::Config("telegram adapter not configured".to_string()));
        };

        let mut bot = TelegramAdapter::new(token, tg_config.poll_timeout_seconds);
        if let Err(e) = bot.fetch_bot_info().await {
            tracing::warn!("Failed to fetch bot info: {}", e);
        }
        if let Err(e) = bot.register_commands(service.registry()).await {
            tracing::warn!("Failed to register commands: {}", e);
        }
        let bot = Arc::new(bot);
        tracing::info!("Bot started: @{}", bot.bot_info().username);

        if tg_config.webhook.enabled {
            webhook::serve(
                &tg_config.webhook.bind,
                &tg_config.webhook.path,
                WebhookState {
                    bot,
                    parser,
                    service,
                },
            )
            .await
        } else {
            run_polling(bot, parser, service).await;
            Ok(())
        }
    })
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write("config.yaml", yaml) {
                eprintln!("Failed to write config.yaml: {}", e);
            } else {
                println!("Wrote default config to config.yaml");
            }
        }
        Err(e) => eprintln!("Failed to serialize default config: {}", e),
    }
}
