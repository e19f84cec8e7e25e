//! Button presses and modal submissions.

use axum::{extract::State, Json};

use super::{accepted, Accepted, ApiResult};
use crate::errors::AppError;
use crate::messaging::{InteractionHandle, Reply};
use crate::models::ComponentInteraction;
use crate::imaging;
use crate::pagination::{self, PageResponse};
use crate::AppState;

/// POST /api/components - Apply a component event in the background.
pub async fn receive_component(
    State(state): State<AppState>,
    Json(event): Json<ComponentInteraction>,
) -> ApiResult<Accepted> {
    if pagination::parse_component_id(&event.custom_id).is_none()
        && imaging::parse_component_id(&event.custom_id).is_none()
    {
        return Err(AppError::BadRequest(format!(
            "Unknown component: {}",
            event.custom_id
        )));
    }

    tokio::spawn(handle_component(state, event));
    accepted()
}

pub async fn handle_component(state: AppState, event: ComponentInteraction) {
    let handle = InteractionHandle {
        id: event.id.clone(),
        token: event.token.clone(),
    };

    let response = if imaging::parse_component_id(&event.custom_id).is_some() {
        state
            .images
            .press(&event.custom_id, event.actor.id)
            .await
            .map(PageResponse::Update)
    } else {
        state
            .paginators
            .handle(&event.custom_id, event.actor.id, event.value.as_deref())
    };

    let sent = match response {
        Ok(PageResponse::Update(reply)) => state.messenger.update(&handle, reply).await,
        Ok(PageResponse::Modal(modal)) => state.messenger.send_modal(&handle, modal).await,
        Err(err) => {
            tracing::debug!(custom_id = %event.custom_id, error = %err, "Component rejected");
            let reply = Reply::text(err.user_message()).ephemeral(true);
            state.messenger.respond(&handle, reply).await
        }
    };

    if let Err(e) = sent {
        tracing::warn!("Failed to answer component {}: {}", event.custom_id, e);
    }
}
