//! Leaf
//!
//! Guild tag and moderation bot core. A gateway bridge relays chat events over HTTP;
//! tags live in SQLite with a Tantivy index for fuzzy name search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod imaging;
mod messaging;
mod models;
mod moderation;
mod pagination;
mod search;
mod tags;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use imaging::{ImageCommands, FILTER_VIEW_TIMEOUT};
use messaging::{HttpMessenger, Messenger};
use moderation::Moderation;
use pagination::PaginatorRegistry;
use search::TagSearchIndex;
use tags::{ReplyCollector, TagWorkflow, WorkflowSettings};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub messenger: Arc<dyn Messenger>,
    pub collector: Arc<ReplyCollector>,
    pub paginators: Arc<PaginatorRegistry>,
    pub tags: Arc<TagWorkflow>,
    pub images: Arc<ImageCommands>,
    pub moderation: Arc<Moderation>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the command handlers around a store, an index and a messenger.
    pub fn build(
        config: Config,
        repo: Repository,
        search: Arc<TagSearchIndex>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let collector = Arc::new(ReplyCollector::new());
        let paginators = Arc::new(PaginatorRegistry::new(config.paginator_capacity));

        let tags = Arc::new(TagWorkflow::new(
            repo.clone(),
            search,
            messenger.clone(),
            collector.clone(),
            paginators.clone(),
            WorkflowSettings {
                reply_timeout: config.reply_timeout,
                bot_owners: config.owner_ids.clone(),
                prefix_cache_size: config.tag_cache_size,
                query_cache_size: config.autocomplete_cache_size,
            },
        ));

        let images = Arc::new(ImageCommands::new(
            messenger.clone(),
            paginators.clone(),
            config.paginator_capacity,
            FILTER_VIEW_TIMEOUT,
        ));

        let moderation = Arc::new(Moderation::new(
            repo,
            messenger.clone(),
            config.bot_user_id,
            config.owner_ids.clone(),
        ));

        Self {
            messenger,
            collector,
            paginators,
            tags,
            images,
            moderation,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Leaf");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Gateway bridge: {}", config.gateway_url);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (LEAF_API_PSK). Authentication is disabled!");
    }
    if config.bot_user_id == 0 {
        tracing::warn!("LEAF_BOT_USER_ID is not set; kick cannot recognise the bot itself");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Repository::new(pool);

    // Initialize search index
    let search = Arc::new(TagSearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let live_tags = repo.list_all_active().await?;
    search.rebuild(&live_tags).await?;

    let messenger: Arc<dyn Messenger> = Arc::new(HttpMessenger::new(
        &config.gateway_url,
        config.gateway_key.clone(),
    )?);

    let bind_addr = config.bind_addr;
    let state = AppState::build(config, repo, search, messenger);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // Bridge routes
    let api_routes = Router::new()
        .route("/interactions", post(api::receive_interaction))
        .route("/messages", post(api::receive_message))
        .route("/components", post(api::receive_component))
        .route("/tags/autocomplete", get(api::autocomplete_tags))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;
