//! Per-guild table of tag names currently being claimed by a running workflow.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::models::normalize_name;

/// In-memory reservation table. Lives for the process lifetime only.
#[derive(Debug, Default)]
pub struct ReservationTable {
    guilds: Mutex<HashMap<u64, HashSet<String>>>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, HashSet<String>>> {
        // The map is left consistent by every critical section, so a poisoned lock is usable.
        self.guilds.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark a name as taken. Reserving twice is a no-op.
    pub fn reserve(&self, guild_id: u64, name: &str) {
        let name = normalize_name(name);
        tracing::debug!(guild_id, name = %name, "Reserving tag name");
        self.lock().entry(guild_id).or_default().insert(name);
    }

    /// Drop a reservation; the guild entry is pruned once empty.
    pub fn release(&self, guild_id: u64, name: &str) {
        let name = normalize_name(name);
        let mut guilds = self.lock();
        let Some(names) = guilds.get_mut(&guild_id) else {
            return;
        };
        names.remove(&name);
        if names.is_empty() {
            guilds.remove(&guild_id);
        }
        tracing::debug!(guild_id, name = %name, "Released tag name");
    }

    pub fn is_reserved(&self, guild_id: u64, name: &str) -> bool {
        let name = normalize_name(name);
        self.lock()
            .get(&guild_id)
            .is_some_and(|names| names.contains(&name))
    }

    /// Atomically reserve a name unless it is already reserved.
    ///
    /// The reservation is released when the returned guard drops.
    pub fn try_reserve(&self, guild_id: u64, name: &str) -> Option<ReservationGuard<'_>> {
        let normalized = normalize_name(name);
        let inserted = self
            .lock()
            .entry(guild_id)
            .or_default()
            .insert(normalized.clone());
        if !inserted {
            return None;
        }
        tracing::debug!(guild_id, name = %normalized, "Reserved tag name");
        Some(ReservationGuard {
            table: self,
            guild_id,
            name: normalized,
        })
    }

    /// Number of guilds with at least one reservation.
    #[cfg(test)]
    pub fn guild_count(&self) -> usize {
        self.lock().len()
    }
}

/// Holds a reservation until dropped.
#[derive(Debug)]
pub struct ReservationGuard<'a> {
    table: &'a ReservationTable,
    guild_id: u64,
    name: String,
}

impl ReservationGuard<'_> {
    /// Normalized name held by this guard.
    #[cfg(test)]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        self.table.release(self.guild_id, &self.name);
    }
}
