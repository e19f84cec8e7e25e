//! Configuration module for the Leaf bot.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key the gateway bridge must present on inbound calls
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy tag-name index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Base URL of the gateway bridge REST API
    pub gateway_url: String,
    /// Key sent to the gateway bridge on outbound calls
    pub gateway_key: Option<String>,
    /// User id of the bot account itself
    pub bot_user_id: u64,
    /// Users allowed to override tag ownership checks
    pub owner_ids: Vec<u64>,
    /// How long interactive prompts wait for a reply
    pub reply_timeout: Duration,
    /// Capacity of the prefix -> tags cache
    pub tag_cache_size: usize,
    /// Capacity of the autocomplete query -> tags cache
    pub autocomplete_cache_size: usize,
    /// Number of paginated views kept alive at once
    pub paginator_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("LEAF_API_PSK").ok();

        let db_path = env::var("LEAF_DB_PATH")
            .unwrap_or_else(|_| "./data/leaf.sqlite".to_string())
            .into();

        let index_path = env::var("LEAF_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = parse_var("LEAF_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("LEAF_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = match env::var("LEAF_LOG_FORMAT") {
            Ok(raw) => parse_log_format(&raw)?,
            Err(_) => false,
        };

        let gateway_url = env::var("LEAF_GATEWAY_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8090".to_string())
            .trim_end_matches('/')
            .to_string();

        let gateway_key = env::var("LEAF_GATEWAY_KEY").ok();

        let bot_user_id = parse_var("LEAF_BOT_USER_ID", "0")?;

        let owner_ids = match env::var("LEAF_OWNER_IDS") {
            Ok(raw) => parse_id_list(&raw)?,
            Err(_) => Vec::new(),
        };

        let reply_timeout = Duration::from_secs(parse_var("LEAF_REPLY_TIMEOUT_SECS", "300")?);
        let tag_cache_size = parse_var("LEAF_TAG_CACHE_SIZE", "1000")?;
        let autocomplete_cache_size = parse_var("LEAF_AUTOCOMPLETE_CACHE_SIZE", "1000")?;
        let paginator_capacity = parse_var("LEAF_PAGINATOR_CAPACITY", "500")?;

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_json,
            gateway_url,
            gateway_key,
            bot_user_id,
            owner_ids,
            reply_timeout,
            tag_cache_size,
            autocomplete_cache_size,
            paginator_capacity,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid {} value: {:?}", name, raw)))
}

/// `json` selects JSON lines; `text` (or `pretty`) the default formatter.
fn parse_log_format(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(true),
        "text" | "pretty" | "" => Ok(false),
        other => Err(AppError::Config(format!(
            "Invalid LEAF_LOG_FORMAT value: {:?}",
            other
        ))),
    }
}

/// Parse a comma separated list of snowflakes, ignoring blank entries.
fn parse_id_list(raw: &str) -> Result<Vec<u64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::Config(format!("Invalid user id in LEAF_OWNER_IDS: {}", s)))
        })
        .collect()
}
