//! Webhook transport
//!
//! Receives Telegram updates over HTTP instead of long-polling.
//! Functionally interchangeable with the polling loop; selected by config.
//! Processing outcomes never surface as 5xx responses, otherwise Telegram
//! would redeliver the same update in a retry storm.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::application::errors::BotError;
use crate::application::messaging::MessageParser;
use crate::application::services::CommandService;
use crate::infrastructure::adapters::telegram::{handle_update, TelegramAdapter, Update};

/// Shared state for the webhook handlers
#[derive(Clone)]
pub struct WebhookState {
    pub bot: Arc<TelegramAdapter>,
    pub parser: Arc<MessageParser>,
    pub service: Arc<CommandService>,
}

/// Serve the webhook endpoint until the process stops.
pub async fn serve(bind: &str, path: &str, state: WebhookState) -> Result<(), BotError> {
    let app = Router::new()
        .route(path, post(receive_update))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| BotError::Network(format!("failed to bind {}: {}", bind, e)))?;

    tracing::info!("Webhook listening on {}{}", bind, path);
    axum::serve(listener, app)
        .await
        .map_err(|e| BotError::Network(e.to_string()))
}

async fn receive_update(
    State(state): State<WebhookState>,
    Json(update): Json<Update>,
) -> StatusCode {
    handle_update(state.bot.as_ref(), &state.parser, &state.service, &update).await;
    StatusCode::OK
}
