//! Embeds shown by the tag commands.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::messaging::{Embed, UserProfile};
use crate::models::{mention, Tag};

/// Tags listed per page.
pub const TAGS_PER_PAGE: usize = 15;

/// Suggestions returned from autocomplete.
pub const AUTOCOMPLETE_LIMIT: usize = 25;

/// Similar names shown by `tags search`.
pub const SEARCH_LIMIT: usize = 15;

/// Backslash-escape characters the chat client treats as markdown.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '~' | '`' | '|' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Chat timestamp markup rendered in the reader's locale.
pub fn timestamp(at: DateTime<Utc>) -> String {
    format!("<t:{}:f>", at.timestamp())
}

/// "5 minutes", "30 seconds", "1 minute".
pub fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", secs)
    }
}

/// One embed per chunk of [`TAGS_PER_PAGE`] tags. Empty input yields no pages.
pub fn list_pages(tags: &[Tag]) -> Vec<Embed> {
    let chunks: Vec<&[Tag]> = tags.chunks(TAGS_PER_PAGE).collect();
    let total = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let lines: Vec<String> = chunk
                .iter()
                .map(|tag| format!("• **{}** (Uses: {})", tag.name, tag.uses))
                .collect();
            Embed::text(lines.join("\n")).footer(format!("Page {} / {}", i + 1, total))
        })
        .collect()
}

/// Bullet list of tag names.
pub fn name_list(names: &[String]) -> Embed {
    let lines: Vec<String> = names.iter().map(|name| format!("• **{}**", name)).collect();
    Embed::text(lines.join("\n"))
}

/// The tag itself, as shown by `tags view`.
pub fn tag_embed(tag: &Tag, raw: bool) -> Embed {
    let content = if raw {
        escape_markdown(&tag.content)
    } else {
        tag.content.clone()
    };
    Embed::new().title(&tag.name).description(content)
}

pub fn info_embed(tag: &Tag, owner: Option<&UserProfile>) -> Embed {
    let mut embed = Embed::new()
        .title(format!("Info for tag \"{}\"", tag.name))
        .field("Owner", mention(tag.owner_id), true)
        .field("Created At", timestamp(tag.created_at), false);

    if tag.was_edited() {
        embed = embed.field("Updated At", timestamp(tag.last_edited_at), false);
    }
    embed = embed.field("Uses", tag.uses.to_string(), false);

    if let Some(url) = owner.and_then(|o| o.avatar_url.as_deref()) {
        embed = embed.thumbnail(url);
    }
    embed
}
