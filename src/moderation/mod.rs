//! Moderation commands.

use std::sync::Arc;

use crate::auth::capability::can_kick;
use crate::db::Repository;
use crate::errors::AppError;
use crate::messaging::{CommandContext, Messenger, Reply};
use crate::models::{Command, Infraction, InfractionKind, NewInfraction, UserRef};

pub struct Moderation {
    repo: Repository,
    messenger: Arc<dyn Messenger>,
    bot_user_id: u64,
    bot_owners: Vec<u64>,
}

impl Moderation {
    pub fn new(
        repo: Repository,
        messenger: Arc<dyn Messenger>,
        bot_user_id: u64,
        bot_owners: Vec<u64>,
    ) -> Self {
        Self {
            repo,
            messenger,
            bot_user_id,
            bot_owners,
        }
    }

    /// Execute a moderation command, answering the user with any error.
    pub async fn run(&self, ctx: &CommandContext, command: Command) -> Result<Infraction, AppError> {
        let result = match &command {
            Command::Kick { member, reason } => self.kick(ctx, member, reason.as_deref()).await,
            other => Err(AppError::BadRequest(format!(
                "{} is not a moderation command",
                other.name()
            ))),
        };

        if let Err(err) = &result {
            tracing::debug!(command = command.name(), guild_id = ctx.guild_id, error = %err, "Moderation command rejected");
            let reply = Reply::text(err.user_message()).ephemeral(true);
            if let Err(send_err) = ctx.reply(self.messenger.as_ref(), reply).await {
                tracing::warn!("Failed to report error for {}: {}", command.name(), send_err);
            }
        }
        result
    }

    /// Remove a member from the guild and log the infraction.
    pub async fn kick(
        &self,
        ctx: &CommandContext,
        member: &UserRef,
        reason: Option<&str>,
    ) -> Result<Infraction, AppError> {
        if member.id == self.bot_user_id {
            return Err(AppError::InvalidInput("I cannot kick myself.".to_string()));
        }
        if member.id == ctx.actor.id {
            return Err(AppError::InvalidInput("You cannot kick yourself.".to_string()));
        }
        if !can_kick(&ctx.actor, &self.bot_owners) {
            return Err(AppError::PermissionDenied(
                "You do not have permission to kick members.".to_string(),
            ));
        }

        self.messenger.kick(ctx.guild_id, member.id, reason).await?;

        let infraction = self
            .repo
            .record_infraction(&NewInfraction {
                guild_id: ctx.guild_id,
                member_id: member.id,
                moderator_id: ctx.actor.id,
                kind: InfractionKind::Kick,
                reason: reason.map(str::to_string),
            })
            .await?;

        tracing::info!(
            guild_id = ctx.guild_id,
            member_id = member.id,
            moderator_id = ctx.actor.id,
            infraction_id = infraction.id,
            "Kicked member"
        );

        ctx.reply(
            self.messenger.as_ref(),
            Reply::text(format!("{} has been kicked.", member.mention())).ephemeral(true),
        )
        .await?;
        Ok(infraction)
    }
}
