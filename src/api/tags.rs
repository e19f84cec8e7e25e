//! Tag lookups for the bridge.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    pub guild_id: u64,
    /// What the user has typed so far
    #[serde(default)]
    pub query: String,
}

/// GET /api/tags/autocomplete - Tag names starting with the typed text.
pub async fn autocomplete_tags(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteQuery>,
) -> ApiResult<Vec<String>> {
    let names = state
        .tags
        .autocomplete(params.guild_id, &params.query)
        .await?;
    success(names)
}
