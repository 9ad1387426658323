//! HTTP surface for the bot
//!
//! - `POST /api/conversations` starts a conversation and returns the greeting
//! - `POST /api/conversations/:id/messages` runs one turn
//! - `GET /api/performance` reports the outcome log

use crate::bot::{Bot, BotResponse};
use crate::error::BotError;
use crate::outcome::PerformanceReport;
use crate::types::SessionId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for the routes
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationCreated {
    pub session_id: SessionId,
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
}

type ApiError = (StatusCode, String);

fn api_error(e: BotError) -> ApiError {
    match e {
        BotError::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("Unknown conversation {}", id)),
        BotError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        other => {
            error!(error = %other, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

pub fn create_router(bot: Arc<Bot>) -> Router {
    let state = AppState { bot };

    Router::new()
        .route("/api/conversations", post(create_conversation))
        .route("/api/conversations/:id/messages", post(post_message))
        .route("/api/performance", get(performance))
        .with_state(state)
}

async fn create_conversation(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ConversationCreated>), ApiError> {
    let session_id = state.bot.create_session().await.map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationCreated {
            session_id,
            messages: vec![state.bot.greeting().to_string()],
        }),
    ))
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(message): Json<UserMessage>,
) -> Result<Json<BotResponse>, ApiError> {
    let session_id: SessionId = id.parse().map_err(|e| {
        warn!(id = %id, "Invalid conversation id");
        (StatusCode::BAD_REQUEST, format!("Invalid conversation id: {}", e))
    })?;

    if message.text.trim().is_empty() {
        return Err(api_error(BotError::InvalidInput(
            "Message text must not be empty".to_string(),
        )));
    }

    let response = state
        .bot
        .process_message(session_id, &message.text)
        .await
        .map_err(api_error)?;

    Ok(Json(response))
}

async fn performance(State(state): State<AppState>) -> Result<Json<PerformanceReport>, ApiError> {
    let report = state.bot.performance().await.map_err(api_error)?;
    Ok(Json(report))
}

/// Serve the bot until the process is stopped
pub async fn serve(bot: Arc<Bot>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Listening");

    axum::serve(listener, create_router(bot)).await
}
