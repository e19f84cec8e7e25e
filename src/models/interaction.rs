//! Inbound events relayed by the gateway bridge.

use serde::{Deserialize, Serialize};

/// Guild-level permissions of the acting member that the bot cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildPermissions {
    #[serde(default)]
    pub manage_guild: bool,
    #[serde(default)]
    pub kick_members: bool,
}

/// The user invoking a command or pressing a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub permissions: GuildPermissions,
}

/// A user passed as a command option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

impl UserRef {
    pub fn mention(&self) -> String {
        mention(self.id)
    }
}

/// A file uploaded with a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    /// Size in bytes as reported by the platform
    #[serde(default)]
    pub size: u64,
}

/// Render a user mention.
pub fn mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

fn first_page() -> i64 {
    1
}

/// Slash command invocation, tagged by `command`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    TagsList {
        #[serde(default)]
        user: Option<UserRef>,
        #[serde(default = "first_page")]
        starting_page: i64,
        #[serde(default)]
        silent: bool,
    },
    TagsSearch {
        tag: String,
        #[serde(default)]
        silent: bool,
    },
    TagsView {
        tag: String,
        #[serde(default)]
        raw: bool,
        #[serde(default)]
        silent: bool,
    },
    TagsCreate {
        name: String,
    },
    TagsRename {
        tag: String,
        new_name: String,
    },
    TagsEdit {
        tag: String,
    },
    TagsDelete {
        tag: String,
        #[serde(default)]
        silent: bool,
    },
    TagsRestore {
        tag: String,
        #[serde(default)]
        silent: bool,
    },
    TagsInfo {
        tag: String,
        #[serde(default)]
        silent: bool,
    },
    TagsTransfer {
        tag: String,
        user: UserRef,
    },
    TagsClaim {
        tag: String,
        #[serde(default)]
        silent: bool,
    },
    Kick {
        member: UserRef,
        #[serde(default)]
        reason: Option<String>,
    },
    ImageFilter {
        image: Attachment,
    },
    ImageBlend {
        image1: Attachment,
        image2: Attachment,
        alpha: f32,
    },
    ImageColors {
        image: Attachment,
    },
    ImageGrayscale {
        image: Attachment,
    },
    ImageSolarize {
        image: Attachment,
        threshold: i64,
    },
}

impl Command {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::TagsList { .. } => "tags list",
            Command::TagsSearch { .. } => "tags search",
            Command::TagsView { .. } => "tags view",
            Command::TagsCreate { .. } => "tags create",
            Command::TagsRename { .. } => "tags rename",
            Command::TagsEdit { .. } => "tags edit",
            Command::TagsDelete { .. } => "tags delete",
            Command::TagsRestore { .. } => "tags restore",
            Command::TagsInfo { .. } => "tags info",
            Command::TagsTransfer { .. } => "tags transfer",
            Command::TagsClaim { .. } => "tags claim",
            Command::Kick { .. } => "kick",
            Command::ImageFilter { .. } => "image filter",
            Command::ImageBlend { .. } => "image blend",
            Command::ImageColors { .. } => "image colors",
            Command::ImageGrayscale { .. } => "image grayscale",
            Command::ImageSolarize { .. } => "image solarize",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Command::ImageFilter { .. }
                | Command::ImageBlend { .. }
                | Command::ImageColors { .. }
                | Command::ImageGrayscale { .. }
                | Command::ImageSolarize { .. }
        )
    }
}

/// A slash command interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub token: String,
    pub guild_id: u64,
    pub channel_id: u64,
    pub actor: Actor,
    pub command: Command,
}

/// A plain channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: u64,
    #[serde(default)]
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author_id: u64,
    #[serde(default)]
    pub content: String,
}

/// A button press or modal submission on a message the bot sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInteraction {
    pub id: String,
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub actor: Actor,
    pub custom_id: String,
    /// Text entered in a modal, if any
    #[serde(default)]
    pub value: Option<String>,
}
