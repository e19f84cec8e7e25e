//! Tag model stored per guild.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, guild-scoped snippet of user-authored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub guild_id: u64,
    pub owner_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at` until the content or name changes
    pub last_edited_at: DateTime<Utc>,
    pub uses: i64,
    /// Soft-delete flag
    pub deleted: bool,
}

impl Tag {
    /// Whether the tag was ever edited or renamed after creation.
    pub fn was_edited(&self) -> bool {
        self.last_edited_at != self.created_at
    }
}

/// Values needed to insert a new tag.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub guild_id: u64,
    pub owner_id: u64,
    pub content: String,
}

/// Lowercased form used for reservation and cache keys.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
