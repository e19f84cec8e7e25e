//! Channel messages, used to answer pending prompts.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{success, ApiResult};
use crate::models::InboundMessage;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Delivery {
    /// Prompts the message answered
    pub delivered: usize,
}

/// POST /api/messages - Offer a message to every waiting prompt.
pub async fn receive_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> ApiResult<Delivery> {
    let delivered = state.collector.dispatch(&message);
    if delivered > 0 {
        tracing::debug!(
            channel_id = message.channel_id,
            author_id = message.author_id,
            delivered,
            "Message answered pending prompts"
        );
    }
    success(Delivery { delivered })
}
