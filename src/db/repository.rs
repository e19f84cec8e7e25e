//! Database repository for tag and infraction operations.
//!
//! Uses prepared statements and transactions for data integrity. Names are compared
//! through the stored `name_key`, built with the same [`normalize_name`] the reservation
//! table and lookup cache use.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{normalize_name, Infraction, InfractionKind, NewInfraction, NewTag, Tag};

const TAG_COLUMNS: &str =
    "id, name, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a tag by ID, deleted or not.
    pub async fn get_tag(&self, id: i64) -> Result<Option<Tag>, AppError> {
        let sql = format!("SELECT {} FROM tags WHERE id = ?", TAG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(tag_from_row))
    }

    /// Get the live tag with this name in a guild.
    pub async fn find_active(&self, guild_id: u64, name: &str) -> Result<Option<Tag>, AppError> {
        let sql = format!(
            "SELECT {} FROM tags WHERE guild_id = ? AND name_key = ? AND deleted = 0",
            TAG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(snowflake(guild_id))
            .bind(normalize_name(name))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(tag_from_row))
    }

    /// Get the most recently created soft-deleted tag with this name in a guild.
    pub async fn find_deleted(&self, guild_id: u64, name: &str) -> Result<Option<Tag>, AppError> {
        let sql = format!(
            "SELECT {} FROM tags WHERE guild_id = ? AND name_key = ? AND deleted = 1 ORDER BY id DESC LIMIT 1",
            TAG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(snowflake(guild_id))
            .bind(normalize_name(name))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(tag_from_row))
    }

    /// List live tags in a guild, optionally only those owned by one user.
    pub async fn list_active(
        &self,
        guild_id: u64,
        owner_id: Option<u64>,
    ) -> Result<Vec<Tag>, AppError> {
        let rows = match owner_id {
            Some(owner_id) => {
                let sql = format!(
                    "SELECT {} FROM tags WHERE guild_id = ? AND owner_id = ? AND deleted = 0 ORDER BY name_key ASC",
                    TAG_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(snowflake(guild_id))
                    .bind(snowflake(owner_id))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM tags WHERE guild_id = ? AND deleted = 0 ORDER BY name_key ASC",
                    TAG_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(snowflake(guild_id))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// List live tags across every guild.
    pub async fn list_all_active(&self) -> Result<Vec<Tag>, AppError> {
        let sql = format!(
            "SELECT {} FROM tags WHERE deleted = 0 ORDER BY guild_id, name_key ASC",
            TAG_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// List live tags whose normalized name starts with the normalized `prefix`.
    pub async fn list_by_prefix(&self, guild_id: u64, prefix: &str) -> Result<Vec<Tag>, AppError> {
        let sql = format!(
            "SELECT {} FROM tags WHERE guild_id = ? AND name_key LIKE ? ESCAPE '\\' AND deleted = 0 ORDER BY name_key ASC",
            TAG_COLUMNS
        );
        let pattern = format!("{}%", escape_like(&normalize_name(prefix)));
        let rows = sqlx::query(&sql)
            .bind(snowflake(guild_id))
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Count live tags in a guild.
    pub async fn count_active(&self, guild_id: u64) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM tags WHERE guild_id = ? AND deleted = 0")
            .bind(snowflake(guild_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Insert a tag unless a live tag with the same name already exists.
    pub async fn create_tag(&self, new_tag: &NewTag) -> Result<Tag, AppError> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT id FROM tags WHERE guild_id = ? AND name_key = ? AND deleted = 0",
        )
        .bind(snowflake(new_tag.guild_id))
        .bind(normalize_name(&new_tag.name))
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(AppError::AlreadyExists("That tag already exists.".to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO tags (name, name_key, guild_id, owner_id, content, created_at, last_edited_at, uses, deleted) VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0)",
        )
        .bind(&new_tag.name)
        .bind(normalize_name(&new_tag.name))
        .bind(snowflake(new_tag.guild_id))
        .bind(snowflake(new_tag.owner_id))
        .bind(&new_tag.content)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: new_tag.name.clone(),
            guild_id: new_tag.guild_id,
            owner_id: new_tag.owner_id,
            content: new_tag.content.clone(),
            created_at: now,
            last_edited_at: now,
            uses: 0,
            deleted: false,
        })
    }

    /// Replace the content of a live tag.
    pub async fn update_content(&self, id: i64, content: &str) -> Result<Tag, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE tags SET content = ?, last_edited_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(content)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(tag_gone());
        }

        self.get_tag(id).await?.ok_or_else(tag_gone)
    }

    /// Rename a live tag unless another live tag already uses the new name.
    pub async fn rename_tag(&self, tag: &Tag, new_name: &str) -> Result<Tag, AppError> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let conflict = sqlx::query(
            "SELECT id FROM tags WHERE guild_id = ? AND name_key = ? AND deleted = 0 AND id != ?",
        )
        .bind(snowflake(tag.guild_id))
        .bind(normalize_name(new_name))
        .bind(tag.id)
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "A tag named {} already exists.",
                new_name
            )));
        }

        let result = sqlx::query(
            "UPDATE tags SET name = ?, name_key = ?, last_edited_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(new_name)
        .bind(normalize_name(new_name))
        .bind(now)
        .bind(tag.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(tag_gone());
        }

        tx.commit().await?;

        Ok(Tag {
            name: new_name.to_string(),
            last_edited_at: now,
            ..tag.clone()
        })
    }

    /// Soft-delete a live tag.
    ///
    /// Older soft-deleted rows with the same name are purged first so at most one
    /// deleted row per name remains. Returns the number of purged rows.
    pub async fn delete_tag(&self, tag: &Tag) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let purged = sqlx::query(
            "DELETE FROM tags WHERE guild_id = ? AND name_key = ? AND deleted = 1",
        )
        .bind(snowflake(tag.guild_id))
        .bind(normalize_name(&tag.name))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let result = sqlx::query("UPDATE tags SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(tag.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(tag_gone());
        }

        tx.commit().await?;

        if purged > 0 {
            tracing::debug!(
                guild_id = tag.guild_id,
                name = %tag.name,
                purged,
                "Purged older deleted tags"
            );
        }

        Ok(purged)
    }

    /// Restore a soft-deleted tag, optionally under a new name.
    pub async fn restore_tag(&self, tag: &Tag, new_name: Option<&str>) -> Result<Tag, AppError> {
        let target_name = new_name.unwrap_or(&tag.name);

        let mut tx = self.pool.begin().await?;

        let conflict = sqlx::query(
            "SELECT id FROM tags WHERE guild_id = ? AND name_key = ? AND deleted = 0",
        )
        .bind(snowflake(tag.guild_id))
        .bind(normalize_name(target_name))
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            return Err(AppError::AlreadyExists(
                "That tag name is already taken. Please try again.".to_string(),
            ));
        }

        let last_edited_at = match new_name {
            Some(_) => Utc::now(),
            None => tag.last_edited_at,
        };

        let result = sqlx::query(
            "UPDATE tags SET name = ?, name_key = ?, last_edited_at = ?, deleted = 0 WHERE id = ? AND deleted = 1",
        )
        .bind(target_name)
        .bind(normalize_name(target_name))
        .bind(last_edited_at)
        .bind(tag.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(tag_gone());
        }

        tx.commit().await?;

        Ok(Tag {
            name: target_name.to_string(),
            last_edited_at,
            deleted: false,
            ..tag.clone()
        })
    }

    /// Hand a live tag to a new owner.
    pub async fn set_owner(&self, id: i64, owner_id: u64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE tags SET owner_id = ? WHERE id = ? AND deleted = 0")
            .bind(snowflake(owner_id))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(tag_gone());
        }
        Ok(())
    }

    /// Bump the view counter of a tag.
    pub async fn increment_uses(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE tags SET uses = uses + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a moderation action.
    pub async fn record_infraction(
        &self,
        infraction: &NewInfraction,
    ) -> Result<Infraction, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO infractions (guild_id, member_id, moderator_id, type, reason, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(snowflake(infraction.guild_id))
        .bind(snowflake(infraction.member_id))
        .bind(snowflake(infraction.moderator_id))
        .bind(infraction.kind.as_str())
        .bind(&infraction.reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Infraction {
            id: result.last_insert_rowid(),
            guild_id: infraction.guild_id,
            member_id: infraction.member_id,
            moderator_id: infraction.moderator_id,
            kind: infraction.kind,
            reason: infraction.reason.clone(),
            created_at: now,
        })
    }

    /// List infractions recorded against a member, oldest first.
    #[cfg(test)]
    pub async fn list_infractions(
        &self,
        guild_id: u64,
        member_id: u64,
    ) -> Result<Vec<Infraction>, AppError> {
        let rows = sqlx::query(
            "SELECT id, guild_id, member_id, moderator_id, type, reason, created_at FROM infractions WHERE guild_id = ? AND member_id = ? ORDER BY id ASC",
        )
        .bind(snowflake(guild_id))
        .bind(snowflake(member_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(infraction_from_row).collect())
    }
}

// Helper functions for row conversion

/// Snowflakes fit in 63 bits, so they round-trip through SQLite's signed integers.
fn snowflake(id: u64) -> i64 {
    id as i64
}

fn tag_gone() -> AppError {
    AppError::NotFound("That tag no longer exists.".to_string())
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn tag_from_row(row: &sqlx::sqlite::SqliteRow) -> Tag {
    let guild_id: i64 = row.get("guild_id");
    let owner_id: i64 = row.get("owner_id");
    let created_at: DateTime<Utc> = row.get("created_at");
    let last_edited_at: DateTime<Utc> = row.get("last_edited_at");
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        guild_id: guild_id as u64,
        owner_id: owner_id as u64,
        content: row.get("content"),
        created_at,
        last_edited_at,
        uses: row.get("uses"),
        deleted: row.get("deleted"),
    }
}

fn infraction_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Infraction> {
    let guild_id: i64 = row.get("guild_id");
    let member_id: i64 = row.get("member_id");
    let moderator_id: i64 = row.get("moderator_id");
    let kind: String = row.get("type");
    let kind = match kind.as_str() {
        "kick" => InfractionKind::Kick,
        other => {
            tracing::warn!("Skipping infraction with unknown type {:?}", other);
            return None;
        }
    };
    Some(Infraction {
        id: row.get("id"),
        guild_id: guild_id as u64,
        member_id: member_id as u64,
        moderator_id: moderator_id as u64,
        kind,
        reason: row.get("reason"),
        created_at: row.get("created_at"),
    })
}
