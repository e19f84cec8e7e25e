//! Tag command handling.
//!
//! Commands that claim a name (create, rename, restore) hold a [`ReservationGuard`] from
//! the moment the name passes its existence checks until the write finishes, so the guard
//! is released on success, timeout, store failure and task cancellation alike.
//!
//! [`ReservationGuard`]: super::reservation::ReservationGuard

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::auth::capability::{can_manage_tag, is_elevated};
use crate::db::Repository;
use crate::errors::AppError;
use crate::messaging::{CommandContext, Messenger, Reply};
use crate::models::{mention, normalize_name, Command, InboundMessage, NewTag, Tag, UserRef};
use crate::pagination::PaginatorRegistry;
use crate::search::TagSearchIndex;

use super::cache::TagCache;
use super::collector::{PendingReply, ReplyCollector, ReplyFilter};
use super::render::{self, AUTOCOMPLETE_LIMIT, SEARCH_LIMIT};
use super::reservation::ReservationTable;

const TAG_MISSING: &str = "That tag does not exist.";
const TAG_EXISTS: &str = "That tag already exists.";
const NAME_TAKEN: &str = "That tag name is already taken. Please try again.";
const INVALID_NAME: &str = "Invalid tag name. Please try again.";
const EMPTY_CONTENT: &str = "Tag content cannot be empty.";

/// Tunables for [`TagWorkflow`].
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// How long a prompt waits for the user's reply
    pub reply_timeout: Duration,
    /// Users that bypass ownership checks
    pub bot_owners: Vec<u64>,
    pub prefix_cache_size: usize,
    pub query_cache_size: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(300),
            bot_owners: Vec::new(),
            prefix_cache_size: 1000,
            query_cache_size: 1000,
        }
    }
}

/// How a tag command finished.
#[derive(Debug, Clone, PartialEq)]
pub enum TagOutcome {
    Created(Tag),
    Renamed(Tag),
    Edited(Tag),
    Deleted(Tag),
    Restored(Tag),
    Transferred(Tag),
    Claimed(Tag),
    Viewed(Tag),
    Info(Tag),
    Listed { pages: usize },
    Searched(Vec<String>),
    /// The user did not reply before the deadline
    TimedOut,
}

/// Step of a name-claiming command, for tracing.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Checking,
    Reserving,
    AwaitingReply,
    Persisting,
}

fn trace_stage(command: &str, guild_id: u64, tag_name: &str, stage: Stage) {
    tracing::debug!(command, guild_id, name = tag_name, stage = ?stage, "Tag workflow");
}

pub struct TagWorkflow {
    repo: Repository,
    search: Arc<TagSearchIndex>,
    messenger: Arc<dyn Messenger>,
    collector: Arc<ReplyCollector>,
    paginators: Arc<PaginatorRegistry>,
    reservations: ReservationTable,
    cache: TagCache,
    settings: WorkflowSettings,
}

impl TagWorkflow {
    pub fn new(
        repo: Repository,
        search: Arc<TagSearchIndex>,
        messenger: Arc<dyn Messenger>,
        collector: Arc<ReplyCollector>,
        paginators: Arc<PaginatorRegistry>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            repo,
            search,
            messenger,
            collector,
            paginators,
            reservations: ReservationTable::new(),
            cache: TagCache::new(settings.prefix_cache_size, settings.query_cache_size),
            settings,
        }
    }

    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    /// Execute a `tags` command, answering the user with any error.
    pub async fn run(&self, ctx: &CommandContext, command: Command) -> Result<TagOutcome, AppError> {
        let name = command.name();
        let silent = is_silent(&command);

        let result = match command {
            Command::TagsList {
                user,
                starting_page,
                silent,
            } => self.list(ctx, user.as_ref(), starting_page, silent).await,
            Command::TagsSearch { tag, silent } => self.search(ctx, &tag, silent).await,
            Command::TagsView { tag, raw, silent } => self.view(ctx, &tag, raw, silent).await,
            Command::TagsCreate { name } => self.create(ctx, &name).await,
            Command::TagsRename { tag, new_name } => self.rename(ctx, &tag, &new_name).await,
            Command::TagsEdit { tag } => self.edit(ctx, &tag).await,
            Command::TagsDelete { tag, silent } => self.delete(ctx, &tag, silent).await,
            Command::TagsRestore { tag, silent } => self.restore(ctx, &tag, silent).await,
            Command::TagsInfo { tag, silent } => self.info(ctx, &tag, silent).await,
            Command::TagsTransfer { tag, user } => self.transfer(ctx, &tag, &user).await,
            Command::TagsClaim { tag, silent } => self.claim(ctx, &tag, silent).await,
            Command::Kick { .. }
            | Command::ImageFilter { .. }
            | Command::ImageBlend { .. }
            | Command::ImageColors { .. }
            | Command::ImageGrayscale { .. }
            | Command::ImageSolarize { .. } => Err(AppError::BadRequest(format!(
                "{} is not a tag command",
                name
            ))),
        };

        if let Err(err) = &result {
            tracing::debug!(command = name, guild_id = ctx.guild_id, error = %err, "Tag command rejected");
            let reply = Reply::text(err.user_message()).ephemeral(silent);
            if let Err(send_err) = ctx.reply(self.messenger.as_ref(), reply).await {
                tracing::warn!("Failed to report error for {}: {}", name, send_err);
            }
        }
        result
    }

    /// `tags create`: reserve the name, ask for the content, then insert.
    pub async fn create(&self, ctx: &CommandContext, name: &str) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(INVALID_NAME.to_string()));
        }

        trace_stage("create", guild_id, name, Stage::Checking);
        if self.reservations.is_reserved(guild_id, name) {
            return Err(AppError::NameReserved(TAG_EXISTS.to_string()));
        }
        if self.repo.find_active(guild_id, name).await?.is_some() {
            return Err(AppError::AlreadyExists(TAG_EXISTS.to_string()));
        }

        trace_stage("create", guild_id, name, Stage::Reserving);
        let _reservation = self
            .reservations
            .try_reserve(guild_id, name)
            .ok_or_else(|| AppError::NameReserved(TAG_EXISTS.to_string()))?;

        let prompt = format!(
            "Please reply to this message with your tag content within {}.",
            render::describe_window(self.settings.reply_timeout)
        );
        let pending = self.prompt(ctx, Reply::text(prompt)).await?;

        trace_stage("create", guild_id, name, Stage::AwaitingReply);
        let Some(message) = self.await_reply(pending).await? else {
            self.notify_timeout(ctx, "You took too long to provide the tag content.")
                .await;
            return Ok(TagOutcome::TimedOut);
        };
        if message.content.trim().is_empty() {
            return Err(AppError::InvalidInput(EMPTY_CONTENT.to_string()));
        }

        trace_stage("create", guild_id, name, Stage::Persisting);
        let tag = self
            .repo
            .create_tag(&NewTag {
                name: name.to_string(),
                guild_id,
                owner_id: ctx.actor.id,
                content: message.content.clone(),
            })
            .await?;
        self.after_write(guild_id).await;

        tracing::info!(guild_id, tag_id = tag.id, name = %tag.name, "Created tag");
        self.messenger
            .reply_to(
                message.channel_id,
                message.id,
                Reply::text("The tag has successfully been created."),
            )
            .await?;
        Ok(TagOutcome::Created(tag))
    }

    /// `tags rename`: the new name arrives with the command, so there is no prompt.
    pub async fn rename(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        new_name: &str,
    ) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::InvalidInput(INVALID_NAME.to_string()));
        }

        trace_stage("rename", guild_id, new_name, Stage::Checking);
        let tag = self.find_tag(guild_id, tag_name).await?;
        self.ensure_can_manage(ctx, &tag, "rename")?;

        let taken = format!("A tag named {} already exists.", new_name);
        if self.reservations.is_reserved(guild_id, new_name) {
            return Err(AppError::NameReserved(taken));
        }
        if let Some(existing) = self.repo.find_active(guild_id, new_name).await? {
            // Changing only the case of a tag's own name is allowed.
            if existing.id != tag.id {
                return Err(AppError::AlreadyExists(taken));
            }
        }

        trace_stage("rename", guild_id, new_name, Stage::Reserving);
        let _reservation = self
            .reservations
            .try_reserve(guild_id, new_name)
            .ok_or_else(|| AppError::NameReserved(taken.clone()))?;

        trace_stage("rename", guild_id, new_name, Stage::Persisting);
        let renamed = self.repo.rename_tag(&tag, new_name).await?;
        self.after_write(guild_id).await;

        tracing::info!(guild_id, tag_id = tag.id, from = %tag.name, to = %renamed.name, "Renamed tag");
        ctx.reply(
            self.messenger.as_ref(),
            Reply::text("The tag has successfully been renamed."),
        )
        .await?;
        Ok(TagOutcome::Renamed(renamed))
    }

    /// `tags edit`: ask for new content and replace it.
    pub async fn edit(&self, ctx: &CommandContext, tag_name: &str) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        let tag = self.find_tag(guild_id, tag_name).await?;
        self.ensure_can_manage(ctx, &tag, "edit")?;

        let prompt = format!(
            "Please reply to this message with your new tag content within {}.",
            render::describe_window(self.settings.reply_timeout)
        );
        let pending = self.prompt(ctx, Reply::text(prompt)).await?;

        trace_stage("edit", guild_id, &tag.name, Stage::AwaitingReply);
        let Some(message) = self.await_reply(pending).await? else {
            self.notify_timeout(ctx, "You took too long to provide the new tag content.")
                .await;
            return Ok(TagOutcome::TimedOut);
        };
        if message.content.trim().is_empty() {
            return Err(AppError::InvalidInput(EMPTY_CONTENT.to_string()));
        }

        let edited = self.repo.update_content(tag.id, &message.content).await?;
        self.after_write(guild_id).await;

        tracing::info!(guild_id, tag_id = tag.id, "Edited tag");
        self.messenger
            .reply_to(
                message.channel_id,
                message.id,
                Reply::text("The tag has successfully been edited."),
            )
            .await?;
        Ok(TagOutcome::Edited(edited))
    }

    /// `tags delete`: soft delete, keeping at most one deleted row per name.
    pub async fn delete(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        let tag = self.find_tag(guild_id, tag_name).await?;
        self.ensure_can_manage(ctx, &tag, "delete")?;

        self.repo.delete_tag(&tag).await?;
        self.after_write(guild_id).await;

        tracing::info!(guild_id, tag_id = tag.id, name = %tag.name, "Deleted tag");
        ctx.reply(
            self.messenger.as_ref(),
            Reply::text("The tag has successfully been deleted.").ephemeral(silent),
        )
        .await?;
        Ok(TagOutcome::Deleted(Tag {
            deleted: true,
            ..tag
        }))
    }

    /// `tags restore`: bring back a deleted tag, asking for a new name if the old one
    /// is in use.
    pub async fn restore(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        if !is_elevated(&ctx.actor, &self.settings.bot_owners) {
            return Err(AppError::PermissionDenied(
                "You need the Manage Server permission to restore tags.".to_string(),
            ));
        }

        trace_stage("restore", guild_id, tag_name.trim(), Stage::Checking);
        let deleted = self
            .repo
            .find_deleted(guild_id, tag_name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(TAG_MISSING.to_string()))?;

        let collides = self.reservations.is_reserved(guild_id, &deleted.name)
            || self.repo.find_active(guild_id, &deleted.name).await?.is_some();

        if !collides {
            trace_stage("restore", guild_id, &deleted.name, Stage::Reserving);
            let _reservation = self
                .reservations
                .try_reserve(guild_id, &deleted.name)
                .ok_or_else(|| AppError::NameReserved(NAME_TAKEN.to_string()))?;

            trace_stage("restore", guild_id, &deleted.name, Stage::Persisting);
            let restored = self.repo.restore_tag(&deleted, None).await?;
            self.after_write(guild_id).await;

            tracing::info!(guild_id, tag_id = restored.id, name = %restored.name, "Restored tag");
            ctx.reply(
                self.messenger.as_ref(),
                Reply::text(format!("The tag \"{}\" has been restored.", restored.name))
                    .ephemeral(silent),
            )
            .await?;
            return Ok(TagOutcome::Restored(restored));
        }

        let pending = self
            .prompt(
                ctx,
                Reply::text(
                    "A non-deleted tag with that name already exists. Please reply with the new name for the tag.",
                )
                .ephemeral(silent),
            )
            .await?;

        trace_stage("restore", guild_id, &deleted.name, Stage::AwaitingReply);
        let Some(message) = self.await_reply(pending).await? else {
            ctx.reply(
                self.messenger.as_ref(),
                Reply::text("You took too long to respond.").ephemeral(silent),
            )
            .await?;
            return Ok(TagOutcome::TimedOut);
        };

        let new_name = message.content.trim();
        if new_name.is_empty() {
            return Err(AppError::InvalidInput(INVALID_NAME.to_string()));
        }

        trace_stage("restore", guild_id, new_name, Stage::Checking);
        if self.reservations.is_reserved(guild_id, new_name) {
            return Err(AppError::NameReserved(NAME_TAKEN.to_string()));
        }
        if self.repo.find_active(guild_id, new_name).await?.is_some() {
            return Err(AppError::AlreadyExists(NAME_TAKEN.to_string()));
        }

        trace_stage("restore", guild_id, new_name, Stage::Reserving);
        let _reservation = self
            .reservations
            .try_reserve(guild_id, new_name)
            .ok_or_else(|| AppError::NameReserved(NAME_TAKEN.to_string()))?;

        trace_stage("restore", guild_id, new_name, Stage::Persisting);
        let restored = self.repo.restore_tag(&deleted, Some(new_name)).await?;
        self.after_write(guild_id).await;

        tracing::info!(
            guild_id,
            tag_id = restored.id,
            from = %deleted.name,
            to = %restored.name,
            "Restored tag under a new name"
        );
        self.messenger
            .reply_to(
                message.channel_id,
                message.id,
                Reply::text(format!(
                    "The tag \"{}\" has been renamed to {} and restored.",
                    deleted.name, restored.name
                )),
            )
            .await?;
        Ok(TagOutcome::Restored(restored))
    }

    /// `tags transfer`: hand a tag to another (non-bot) user.
    pub async fn transfer(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        user: &UserRef,
    ) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        let tag = self.find_tag(guild_id, tag_name).await?;
        self.ensure_can_manage(ctx, &tag, "transfer")?;
        if user.bot {
            return Err(AppError::InvalidInput(
                "You cannot transfer tags to bots.".to_string(),
            ));
        }

        self.repo.set_owner(tag.id, user.id).await?;
        self.after_write(guild_id).await;

        tracing::info!(guild_id, tag_id = tag.id, from = tag.owner_id, to = user.id, "Transferred tag");
        let reply = Reply::text(format!(
            "The tag has successfully been transferred to {}.",
            user.mention()
        ))
        .content(user.mention());
        ctx.reply(self.messenger.as_ref(), reply).await?;
        Ok(TagOutcome::Transferred(Tag {
            owner_id: user.id,
            ..tag
        }))
    }

    /// `tags claim`: take over a tag whose owner left the guild.
    pub async fn claim(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        let guild_id = ctx.guild_id;
        let tag_name = tag_name.trim();
        let tag = self
            .repo
            .find_active(guild_id, tag_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("A tag named \"{}\" does not exist.", tag_name))
            })?;

        if self
            .messenger
            .fetch_member(guild_id, tag.owner_id)
            .await?
            .is_some()
        {
            return Err(AppError::PermissionDenied(format!(
                "The owner of the tag \"{}\" is still present in the server.",
                tag.name
            )));
        }

        self.repo.set_owner(tag.id, ctx.actor.id).await?;
        self.after_write(guild_id).await;

        tracing::info!(guild_id, tag_id = tag.id, claimant = ctx.actor.id, "Claimed tag");
        ctx.reply(
            self.messenger.as_ref(),
            Reply::text(format!(
                "The tag \"{}\" has successfully been claimed by {}.",
                tag.name, ctx.actor.name
            ))
            .ephemeral(silent),
        )
        .await?;
        Ok(TagOutcome::Claimed(Tag {
            owner_id: ctx.actor.id,
            ..tag
        }))
    }

    /// `tags view`: send the tag and count the use.
    pub async fn view(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        raw: bool,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        let tag = self.find_tag(ctx.guild_id, tag_name).await?;

        ctx.reply(
            self.messenger.as_ref(),
            Reply::embed(render::tag_embed(&tag, raw)).ephemeral(silent),
        )
        .await?;
        self.repo.increment_uses(tag.id).await?;

        Ok(TagOutcome::Viewed(Tag {
            uses: tag.uses + 1,
            ..tag
        }))
    }

    pub async fn info(
        &self,
        ctx: &CommandContext,
        tag_name: &str,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        let tag = self.find_tag(ctx.guild_id, tag_name).await?;

        let owner = match self.messenger.fetch_user(tag.owner_id).await {
            Ok(owner) => owner,
            Err(e) => {
                tracing::warn!("Could not fetch owner {} of tag {}: {}", tag.owner_id, tag.id, e);
                None
            }
        };

        ctx.reply(
            self.messenger.as_ref(),
            Reply::embed(render::info_embed(&tag, owner.as_ref())).ephemeral(silent),
        )
        .await?;
        Ok(TagOutcome::Info(tag))
    }

    /// `tags list`: paginated, restricted to the invoker.
    pub async fn list(
        &self,
        ctx: &CommandContext,
        user: Option<&UserRef>,
        starting_page: i64,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        let tags = self
            .repo
            .list_active(ctx.guild_id, user.map(|u| u.id))
            .await?;
        let pages = render::list_pages(&tags);

        // An empty listing still has its single "no tags" page.
        let page_count = pages.len().max(1) as i64;
        if starting_page < 1 || starting_page > page_count {
            return Err(AppError::InvalidInput("That page does not exist.".to_string()));
        }

        if pages.is_empty() {
            let text = match user {
                Some(user) => format!("{} does not have any tags in this server.", user.name),
                None => "There are no tags in this server.".to_string(),
            };
            ctx.reply(self.messenger.as_ref(), Reply::text(text).ephemeral(silent))
                .await?;
            return Ok(TagOutcome::Listed { pages: 0 });
        }

        let count = pages.len();
        let reply = self.paginators.open(
            pages,
            (starting_page - 1) as usize,
            Some(ctx.actor.id),
        )?;
        ctx.reply(self.messenger.as_ref(), reply.ephemeral(silent))
            .await?;
        Ok(TagOutcome::Listed { pages: count })
    }

    /// `tags search`: typo-tolerant lookup of tag names.
    pub async fn search(
        &self,
        ctx: &CommandContext,
        query: &str,
        silent: bool,
    ) -> Result<TagOutcome, AppError> {
        if self.repo.count_active(ctx.guild_id).await? == 0 {
            ctx.reply(
                self.messenger.as_ref(),
                Reply::default()
                    .content(format!("No tags found for '{}'.", query))
                    .ephemeral(silent),
            )
            .await?;
            return Ok(TagOutcome::Searched(Vec::new()));
        }

        let names = self.search.search(ctx.guild_id, query, SEARCH_LIMIT)?;
        tracing::debug!(guild_id = ctx.guild_id, query, matches = names.len(), "Tag search");

        let reply = if names.is_empty() {
            Reply::default().content(format!("No similar tags found for '{}'.", query))
        } else {
            Reply::embed(render::name_list(&names))
        };
        ctx.reply(self.messenger.as_ref(), reply.ephemeral(silent))
            .await?;
        Ok(TagOutcome::Searched(names))
    }

    /// Tag names in a guild starting with `current`, served from the lookup cache when
    /// possible.
    pub async fn autocomplete(&self, guild_id: u64, current: &str) -> Result<Vec<String>, AppError> {
        let tags = match self.cache.get_by_query(guild_id, current) {
            Some(tags) => tags,
            None => {
                let tags = match self.cache.get_by_prefix(guild_id, current) {
                    Some(tags) => tags,
                    None => {
                        let tags = match self.cache.narrow_from_shorter_prefix(guild_id, current) {
                            Some(tags) => tags,
                            None => {
                                self.repo
                                    .list_by_prefix(guild_id, &normalize_name(current))
                                    .await?
                            }
                        };
                        self.cache.put_by_prefix(guild_id, current, tags.clone());
                        tags
                    }
                };
                self.cache.put_by_query(guild_id, current, tags.clone());
                tags
            }
        };

        Ok(tags
            .into_iter()
            .take(AUTOCOMPLETE_LIMIT)
            .map(|tag| tag.name)
            .collect())
    }

    async fn find_tag(&self, guild_id: u64, name: &str) -> Result<Tag, AppError> {
        self.repo
            .find_active(guild_id, name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(TAG_MISSING.to_string()))
    }

    fn ensure_can_manage(&self, ctx: &CommandContext, tag: &Tag, verb: &str) -> Result<(), AppError> {
        if can_manage_tag(&ctx.actor, tag.owner_id, &self.settings.bot_owners) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "You do not have permission to {} that tag.",
                verb
            )))
        }
    }

    /// Start listening for the invoker's next message, then send `reply` asking for it.
    async fn prompt(&self, ctx: &CommandContext, reply: Reply) -> Result<PendingReply<'_>, AppError> {
        let pending = self.collector.register(ReplyFilter {
            channel_id: ctx.channel_id,
            author_id: ctx.actor.id,
        });
        ctx.reply(self.messenger.as_ref(), reply).await?;
        Ok(pending)
    }

    /// `Ok(None)` when the deadline passes without a reply.
    async fn await_reply(
        &self,
        pending: PendingReply<'_>,
    ) -> Result<Option<InboundMessage>, AppError> {
        let deadline = Instant::now() + self.settings.reply_timeout;

        match pending.wait(deadline).await {
            Ok(message) => Ok(Some(message)),
            Err(AppError::CollectionTimedOut) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn notify_timeout(&self, ctx: &CommandContext, text: &str) {
        tracing::info!(guild_id = ctx.guild_id, user_id = ctx.actor.id, "Tag prompt timed out");
        let reply = Reply::text(text).content(mention(ctx.actor.id));
        if let Err(e) = self.messenger.send(ctx.channel_id, reply).await {
            tracing::warn!("Failed to send timeout notice: {}", e);
        }
    }

    /// Drop cached lookups for the guild and refresh its search entries.
    async fn after_write(&self, guild_id: u64) {
        self.cache.invalidate_guild(guild_id);

        let tags = match self.repo.list_active(guild_id, None).await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!("Could not reload tags of guild {} for indexing: {}", guild_id, e);
                return;
            }
        };
        if let Err(e) = self.search.reindex_guild(guild_id, &tags).await {
            tracing::warn!("Failed to reindex guild {}: {}", guild_id, e);
        }
    }
}

fn is_silent(command: &Command) -> bool {
    match command {
        Command::TagsList { silent, .. }
        | Command::TagsSearch { silent, .. }
        | Command::TagsView { silent, .. }
        | Command::TagsDelete { silent, .. }
        | Command::TagsRestore { silent, .. }
        | Command::TagsInfo { silent, .. }
        | Command::TagsClaim { silent, .. } => *silent,
        Command::TagsCreate { .. }
        | Command::TagsRename { .. }
        | Command::TagsEdit { .. }
        | Command::TagsTransfer { .. }
        | Command::Kick { .. }
        | Command::ImageFilter { .. }
        | Command::ImageBlend { .. }
        | Command::ImageColors { .. }
        | Command::ImageGrayscale { .. }
        | Command::ImageSolarize { .. } => false,
    }
}
