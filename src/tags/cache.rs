//! Advisory LRU caches in front of the tag store, used for autocomplete only.
//!
//! Authoritative reads (view, edit, delete, ...) never consult this cache. Writes for a
//! guild drop every cached entry of that guild.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;

use crate::models::{normalize_name, Tag};

type Key = (u64, String);

/// A capacity of zero is bumped to one.
fn bounded(capacity: usize) -> LruCache<Key, Vec<Tag>> {
    LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
}

fn drop_guild(map: &mut LruCache<Key, Vec<Tag>>, guild_id: u64) {
    let doomed: Vec<Key> = map
        .iter()
        .filter(|((guild, _), _)| *guild == guild_id)
        .map(|(key, _)| key.clone())
        .collect();
    for key in doomed {
        map.pop(&key);
    }
}

struct Maps {
    prefixes: LruCache<Key, Vec<Tag>>,
    queries: LruCache<Key, Vec<Tag>>,
}

pub struct TagCache {
    maps: Mutex<Maps>,
}

impl TagCache {
    pub fn new(prefix_capacity: usize, query_capacity: usize) -> Self {
        Self {
            maps: Mutex::new(Maps {
                prefixes: bounded(prefix_capacity),
                queries: bounded(query_capacity),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Maps> {
        self.maps.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_by_prefix(&self, guild_id: u64, prefix: &str) -> Option<Vec<Tag>> {
        self.lock()
            .prefixes
            .get(&(guild_id, normalize_name(prefix)))
            .cloned()
    }

    pub fn put_by_prefix(&self, guild_id: u64, prefix: &str, tags: Vec<Tag>) {
        self.lock()
            .prefixes
            .put((guild_id, normalize_name(prefix)), tags);
    }

    pub fn get_by_query(&self, guild_id: u64, query: &str) -> Option<Vec<Tag>> {
        self.lock()
            .queries
            .get(&(guild_id, normalize_name(query)))
            .cloned()
    }

    pub fn put_by_query(&self, guild_id: u64, query: &str, tags: Vec<Tag>) {
        self.lock()
            .queries
            .put((guild_id, normalize_name(query)), tags);
    }

    /// Answer a prefix from the longest shorter prefix already cached, if any.
    ///
    /// Cached prefix lists are complete, so filtering one down is exact.
    pub fn narrow_from_shorter_prefix(&self, guild_id: u64, prefix: &str) -> Option<Vec<Tag>> {
        let prefix = normalize_name(prefix);
        let mut maps = self.lock();

        let cut_points: Vec<usize> = prefix.char_indices().map(|(i, _)| i).skip(1).collect();
        for end in cut_points.into_iter().rev() {
            let shorter = prefix[..end].to_string();
            if let Some(tags) = maps.prefixes.get(&(guild_id, shorter)) {
                return Some(
                    tags.iter()
                        .filter(|tag| normalize_name(&tag.name).starts_with(&prefix))
                        .cloned()
                        .collect(),
                );
            }
        }
        None
    }

    /// Drop every entry belonging to a guild.
    pub fn invalidate_guild(&self, guild_id: u64) {
        let mut maps = self.lock();
        drop_guild(&mut maps.prefixes, guild_id);
        drop_guild(&mut maps.queries, guild_id);
    }

    /// Number of (prefix, query) entries currently cached.
    #[cfg(test)]
    pub fn len(&self) -> (usize, usize) {
        let maps = self.lock();
        (maps.prefixes.len(), maps.queries.len())
    }
}
