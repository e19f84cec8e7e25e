//! Capability checks for chat actions.

use crate::models::Actor;

/// Whether the actor holds elevated guild permission or is a bot owner.
pub fn is_elevated(actor: &Actor, bot_owners: &[u64]) -> bool {
    actor.permissions.manage_guild || bot_owners.contains(&actor.id)
}

/// Whether the actor may modify a tag owned by `owner_id`.
pub fn can_manage_tag(actor: &Actor, owner_id: u64, bot_owners: &[u64]) -> bool {
    actor.id == owner_id || is_elevated(actor, bot_owners)
}

/// Whether the actor may remove members from the guild.
pub fn can_kick(actor: &Actor, bot_owners: &[u64]) -> bool {
    actor.permissions.kick_members || bot_owners.contains(&actor.id)
}
