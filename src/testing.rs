//! Shared test doubles.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::messaging::{
    CommandContext, InteractionHandle, Member, Messenger, Modal, Reply, UserProfile,
};
use crate::models::{Actor, GuildPermissions, InboundMessage};
use crate::tags::ReplyCollector;

/// One outbound call captured by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Respond(Reply),
    Followup(Reply),
    Update(Reply),
    EditOriginal(Reply),
    Modal(Modal),
    Channel {
        channel_id: u64,
        reply: Reply,
    },
    ReplyTo {
        channel_id: u64,
        message_id: u64,
        reply: Reply,
    },
    Kick {
        guild_id: u64,
        user_id: u64,
        reason: Option<String>,
    },
}

impl Sent {
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Sent::Respond(reply)
            | Sent::Followup(reply)
            | Sent::Update(reply)
            | Sent::EditOriginal(reply)
            | Sent::Channel { reply, .. }
            | Sent::ReplyTo { reply, .. } => Some(reply),
            Sent::Modal(_) | Sent::Kick { .. } => None,
        }
    }
}

/// In-memory [`Messenger`] that records every call.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    members: Mutex<HashSet<(u64, u64)>>,
    users: Mutex<HashMap<u64, UserProfile>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    early_reply: Mutex<Option<(Arc<ReplyCollector>, InboundMessage)>>,
    early_delivered: Mutex<Option<usize>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, guild_id: u64, user_id: u64) {
        self.members.lock().unwrap().insert((guild_id, user_id));
    }

    pub fn add_user(&self, profile: UserProfile) {
        self.users.lock().unwrap().insert(profile.id, profile);
    }

    /// Serve `data` when `url` is downloaded.
    pub fn add_file(&self, url: &str, data: Vec<u8>) {
        self.files.lock().unwrap().insert(url.to_string(), data);
    }

    /// Deliver `message` to the collector while the next response is being sent, the
    /// way a fast user can answer before the bridge acknowledges the prompt.
    pub fn reply_during_response(&self, collector: Arc<ReplyCollector>, message: InboundMessage) {
        *self.early_reply.lock().unwrap() = Some((collector, message));
    }

    /// How many waiters the early reply resolved, once it has been delivered.
    pub fn early_delivered(&self) -> Option<usize> {
        *self.early_delivered.lock().unwrap()
    }

    fn deliver_early_reply(&self) {
        let pending = self.early_reply.lock().unwrap().take();
        if let Some((collector, message)) = pending {
            *self.early_delivered.lock().unwrap() = Some(collector.dispatch(&message));
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Text of every reply sent so far: embed descriptions, else plain content.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|s| s.reply())
            .filter_map(|r| {
                r.description()
                    .map(str::to_string)
                    .or_else(|| r.content.clone())
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn respond(&self, _interaction: &InteractionHandle, reply: Reply) -> Result<(), AppError> {
        self.record(Sent::Respond(reply));
        self.deliver_early_reply();
        Ok(())
    }

    async fn followup(
        &self,
        _interaction: &InteractionHandle,
        reply: Reply,
    ) -> Result<(), AppError> {
        self.record(Sent::Followup(reply));
        self.deliver_early_reply();
        Ok(())
    }

    async fn update(&self, _interaction: &InteractionHandle, reply: Reply) -> Result<(), AppError> {
        self.record(Sent::Update(reply));
        Ok(())
    }

    async fn edit_original(
        &self,
        _interaction: &InteractionHandle,
        reply: Reply,
    ) -> Result<(), AppError> {
        self.record(Sent::EditOriginal(reply));
        Ok(())
    }

    async fn send_modal(
        &self,
        _interaction: &InteractionHandle,
        modal: Modal,
    ) -> Result<(), AppError> {
        self.record(Sent::Modal(modal));
        Ok(())
    }

    async fn send(&self, channel_id: u64, reply: Reply) -> Result<(), AppError> {
        self.record(Sent::Channel { channel_id, reply });
        Ok(())
    }

    async fn reply_to(
        &self,
        channel_id: u64,
        message_id: u64,
        reply: Reply,
    ) -> Result<(), AppError> {
        self.record(Sent::ReplyTo {
            channel_id,
            message_id,
            reply,
        });
        Ok(())
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, AppError> {
        let present = self.members.lock().unwrap().contains(&(guild_id, user_id));
        Ok(present.then(|| Member {
            id: user_id,
            name: format!("user-{}", user_id),
            bot: false,
        }))
    }

    async fn fetch_user(&self, user_id: u64) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn kick(&self, guild_id: u64, user_id: u64, reason: Option<&str>) -> Result<(), AppError> {
        self.record(Sent::Kick {
            guild_id,
            user_id,
            reason: reason.map(str::to_string),
        });
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Messaging(format!("no file at {}", url)))
    }
}

pub const GUILD: u64 = 100;
pub const CHANNEL: u64 = 200;

pub fn actor(id: u64) -> Actor {
    Actor {
        id,
        name: format!("user-{}", id),
        bot: false,
        permissions: GuildPermissions::default(),
    }
}

pub fn admin(id: u64) -> Actor {
    Actor {
        permissions: GuildPermissions {
            manage_guild: true,
            kick_members: true,
        },
        ..actor(id)
    }
}

pub fn context(actor: Actor) -> CommandContext {
    CommandContext::new(
        InteractionHandle {
            id: format!("interaction-{}", actor.id),
            token: "token".to_string(),
        },
        GUILD,
        CHANNEL,
        actor,
    )
}

/// Wait until at least `n` reply waiters are registered.
pub async fn until_pending(collector: &ReplyCollector, n: usize) {
    for _ in 0..500 {
        if collector.pending() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("reply waiter was never registered");
}
