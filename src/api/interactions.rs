//! Slash command events.

use axum::{extract::State, Json};

use super::{accepted, Accepted, ApiResult};
use crate::messaging::CommandContext;
use crate::models::{Command, Interaction};
use crate::AppState;

/// POST /api/interactions - Run a slash command in the background.
pub async fn receive_interaction(
    State(state): State<AppState>,
    Json(interaction): Json<Interaction>,
) -> ApiResult<Accepted> {
    tracing::info!(
        command = interaction.command.name(),
        guild_id = interaction.guild_id,
        user_id = interaction.actor.id,
        "Received interaction"
    );

    tokio::spawn(dispatch_interaction(state, interaction));
    accepted()
}

/// Route a command to its handler. Errors have already been shown to the user.
pub async fn dispatch_interaction(state: AppState, interaction: Interaction) {
    let ctx = CommandContext::from_interaction(&interaction);
    let name = interaction.command.name();

    let failed = match interaction.command {
        command @ Command::Kick { .. } => state.moderation.run(&ctx, command).await.is_err(),
        command if command.is_image() => state.images.run(&ctx, command).await.is_err(),
        command => state.tags.run(&ctx, command).await.is_err(),
    };

    if failed {
        tracing::debug!(command = name, interaction_id = %ctx.interaction.id, "Command finished with an error");
    }
}
