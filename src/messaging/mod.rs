//! Outbound side of the gateway bridge.
//!
//! Everything the bot says goes through the [`Messenger`] trait. The production
//! implementation is [`HttpMessenger`]; tests plug in a recording fake.

mod http;

pub use http::HttpMessenger;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Actor, Interaction};

/// Embed color used for every bot response.
pub const DARK_THEME: u32 = 0x36393F;

/// A field inside an embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self {
            title: None,
            description: None,
            color: DARK_THEME,
            fields: Vec::new(),
            footer: None,
            thumbnail: None,
        }
    }

    /// Embed carrying only a description.
    pub fn text(description: impl Into<String>) -> Self {
        Self::new().description(description)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }
}

impl Default for Embed {
    fn default() -> Self {
        Self::new()
    }
}

/// A clickable button attached to a message. Shows an emoji, a label, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub custom_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub disabled: bool,
}

impl Button {
    pub fn emoji(custom_id: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            emoji: Some(emoji.into()),
            label: None,
            disabled: false,
        }
    }

    pub fn labeled(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            emoji: None,
            label: Some(label.into()),
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A file attached to a message. Travels base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub filename: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// A message the bot sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileUpload>,
    #[serde(default)]
    pub ephemeral: bool,
}

impl Reply {
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Shorthand for a single dark-theme description embed.
    pub fn text(description: impl Into<String>) -> Self {
        Self::embed(Embed::text(description))
    }

    /// Message carrying a single file and nothing else.
    pub fn file(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            files: vec![FileUpload {
                filename: filename.into(),
                data,
            }],
            ..Self::default()
        }
    }

    pub fn buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// First embed description, if any.
    pub fn description(&self) -> Option<&str> {
        self.embeds.first().and_then(|e| e.description.as_deref())
    }
}

/// A single-input form popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub label: String,
}

/// Guild member as reported by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Identifies an interaction the bridge can answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionHandle {
    pub id: String,
    pub token: String,
}

/// Outbound calls into the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Initial response to an interaction.
    async fn respond(&self, interaction: &InteractionHandle, reply: Reply) -> Result<(), AppError>;

    /// Additional message after the initial response.
    async fn followup(&self, interaction: &InteractionHandle, reply: Reply)
        -> Result<(), AppError>;

    /// Edit the message a component interaction belongs to.
    async fn update(&self, interaction: &InteractionHandle, reply: Reply) -> Result<(), AppError>;

    /// Edit the initial response of a command interaction.
    async fn edit_original(
        &self,
        interaction: &InteractionHandle,
        reply: Reply,
    ) -> Result<(), AppError>;

    async fn send_modal(&self, interaction: &InteractionHandle, modal: Modal)
        -> Result<(), AppError>;

    async fn send(&self, channel_id: u64, reply: Reply) -> Result<(), AppError>;

    async fn reply_to(&self, channel_id: u64, message_id: u64, reply: Reply)
        -> Result<(), AppError>;

    /// `None` when the user is not a member of the guild.
    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, AppError>;

    async fn fetch_user(&self, user_id: u64) -> Result<Option<UserProfile>, AppError>;

    async fn kick(&self, guild_id: u64, user_id: u64, reason: Option<&str>)
        -> Result<(), AppError>;

    /// Raw bytes of an attachment the user uploaded.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// Where a running command is and who invoked it.
#[derive(Debug)]
pub struct CommandContext {
    pub interaction: InteractionHandle,
    pub guild_id: u64,
    pub channel_id: u64,
    pub actor: Actor,
    responded: AtomicBool,
}

impl CommandContext {
    pub fn new(interaction: InteractionHandle, guild_id: u64, channel_id: u64, actor: Actor) -> Self {
        Self {
            interaction,
            guild_id,
            channel_id,
            actor,
            responded: AtomicBool::new(false),
        }
    }

    pub fn from_interaction(interaction: &Interaction) -> Self {
        Self::new(
            InteractionHandle {
                id: interaction.id.clone(),
                token: interaction.token.clone(),
            },
            interaction.guild_id,
            interaction.channel_id,
            interaction.actor.clone(),
        )
    }

    /// Answer the interaction; the first call responds, later calls follow up.
    pub async fn reply(&self, messenger: &dyn Messenger, reply: Reply) -> Result<(), AppError> {
        if self.responded.swap(true, Ordering::SeqCst) {
            messenger.followup(&self.interaction, reply).await
        } else {
            messenger.respond(&self.interaction, reply).await
        }
    }
}
