//! Configuration integration tests
//! Run with: cargo test --test config_test

use std::sync::Once;

use kurs_bot::application::errors::ConfigError;
use kurs_bot::infrastructure::config::Config;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

#[test]
fn defaults_are_safe() {
    ensure_init();

    let config = Config::default();
    assert_eq!(config.bot.prefix, "/");
    assert_eq!(config.market.base_url, "https://api.coingecko.com/api/v3");
    assert!(config.market.timeout_seconds > 0);
    // pruning unreachable broadcast recipients must be opt-in
    assert!(!config.registry.prune_unreachable);
    // webhook off by default: long-poll is the default transport
    let telegram = config.adapters.telegram.as_ref().unwrap();
    assert!(!telegram.webhook.enabled);
}

#[test]
fn default_config_round_trips_through_yaml() {
    ensure_init();

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let reparsed: Config = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(reparsed.bot.name, config.bot.name);
    assert_eq!(reparsed.registry.path, config.registry.path);
    assert_eq!(
        reparsed.adapters.telegram.unwrap().poll_timeout_seconds,
        config.adapters.telegram.unwrap().poll_timeout_seconds,
    );
}

#[test]
fn parses_kebab_case_yaml() {
    ensure_init();

    let yaml = r#"
bot:
  name: kurs-bot
  prefix: "/"
adapters:
  telegram:
    enabled: true
    token: "123:abc"
    poll-timeout-seconds: 30
    webhook:
      enabled: true
      bind: "127.0.0.1:9000"
      path: "/hook"
  console:
    enabled: false
admin:
  user-id: 6504720757
registry:
  path: users.json
  prune-unreachable: true
market:
  base-url: "https://api.coingecko.com/api/v3"
  timeout-seconds: 5
"#;

    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.admin.user_id, Some(6504720757));
    assert!(config.registry.prune_unreachable);
    let telegram = config.adapters.telegram.unwrap();
    assert_eq!(telegram.token.as_deref(), Some("123:abc"));
    assert!(telegram.webhook.enabled);
    assert_eq!(telegram.webhook.bind, "127.0.0.1:9000");
}

#[test]
fn missing_token_is_a_missing_field_error() {
    ensure_init();

    let config = Config::default();
    let err = config.require_token().unwrap_err();
    assert!(matches!(err, ConfigError::MissingField(field) if field.contains("token")));
}

#[test]
fn environment_overrides_token_and_admin() {
    ensure_init();

    // Single test mutates the environment to avoid races between tests
    std::env::set_var("BOT_TOKEN", "env-token");
    std::env::set_var("ADMIN_ID", "42");

    let config = Config::load_env();
    assert_eq!(config.require_token().unwrap(), "env-token");
    assert_eq!(config.admin.user_id, Some(42));

    let mut file_config = Config::default();
    file_config.apply_env();
    assert_eq!(file_config.require_token().unwrap(), "env-token");
    assert_eq!(file_config.admin.user_id, Some(42));

    std::env::remove_var("BOT_TOKEN");
    std::env::remove_var("ADMIN_ID");
}
