//! Moderation infraction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of moderation action taken against a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfractionKind {
    Kick,
}

impl InfractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfractionKind::Kick => "kick",
        }
    }
}

/// A logged moderation action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Infraction {
    pub id: i64,
    pub guild_id: u64,
    pub member_id: u64,
    pub moderator_id: u64,
    pub kind: InfractionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values needed to record an infraction.
#[derive(Debug, Clone)]
pub struct NewInfraction {
    pub guild_id: u64,
    pub member_id: u64,
    pub moderator_id: u64,
    pub kind: InfractionKind,
    pub reason: Option<String>,
}
