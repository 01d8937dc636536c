//! Configuration module for the slide library backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

/// Which drive adapter backs the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveKind {
    /// A folder on the local file system
    Local,
    /// A Graph-style HTTP drive
    Graph,
}

impl FromStr for DriveKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(DriveKind::Local),
            "graph" => Ok(DriveKind::Graph),
            other => Err(AppError::Validation(format!("Unknown drive kind: {}", other))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    pub drive: DriveKind,
    /// Root directory of the local drive
    pub drive_root: PathBuf,
    /// Base URL of the Graph-style drive API
    pub graph_url: String,
    /// Bearer token handed out on sign-in; minted locally when absent
    pub access_token: Option<String>,
    pub token_ttl_secs: i64,
    /// Folder holding slides.json and tags.json
    pub app_folder: String,
    /// Sort tags.json after appending new tags
    pub sort_tags: bool,
    pub account_name: String,
    pub account_username: String,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SLIDES_API_PSK").ok().filter(|s| !s.is_empty());

        let bind_addr = env::var("SLIDES_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid SLIDES_BIND_ADDR: {}", e)))?;

        let log_level = env::var("SLIDES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("SLIDES_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let drive = env::var("SLIDES_DRIVE")
            .ok()
            .map(|s| {
                s.parse().unwrap_or_else(|e| {
                    tracing::warn!("{}; falling back to the local drive", e);
                    DriveKind::Local
                })
            })
            .unwrap_or(DriveKind::Local);

        let drive_root = env::var("SLIDES_DRIVE_ROOT")
            .unwrap_or_else(|_| "./data/drive".to_string())
            .into();

        let graph_url = env::var("SLIDES_GRAPH_URL")
            .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".to_string())
            .trim_end_matches('/')
            .to_string();

        let access_token = env::var("SLIDES_ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let app_folder = env::var("SLIDES_APP_FOLDER")
            .ok()
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "myapp".to_string());

        Ok(Self {
            api_psk,
            bind_addr,
            log_level,
            log_format,
            drive,
            drive_root,
            graph_url,
            access_token,
            token_ttl_secs: parse_or("SLIDES_TOKEN_TTL_SECS", 3600),
            app_folder,
            sort_tags: parse_or("SLIDES_SORT_TAGS", false),
            account_name: env::var("SLIDES_ACCOUNT_NAME")
                .unwrap_or_else(|_| "Local User".to_string()),
            account_username: env::var("SLIDES_ACCOUNT_USERNAME")
                .unwrap_or_else(|_| "local@localhost".to_string()),
            http_timeout_secs: parse_or("SLIDES_HTTP_TIMEOUT_SECS", 30),
        })
    }
}

/// Parse an optional variable, warning and using `default` when it is malformed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const KEYS: &[&str] = &[
        "SLIDES_API_PSK",
        "SLIDES_BIND_ADDR",
        "SLIDES_LOG_LEVEL",
        "SLIDES_LOG_FORMAT",
        "SLIDES_DRIVE",
        "SLIDES_DRIVE_ROOT",
        "SLIDES_GRAPH_URL",
        "SLIDES_ACCESS_TOKEN",
        "SLIDES_TOKEN_TTL_SECS",
        "SLIDES_APP_FOLDER",
        "SLIDES_SORT_TAGS",
        "SLIDES_HTTP_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.drive, DriveKind::Local);
        assert_eq!(config.drive_root, PathBuf::from("./data/drive"));
        assert_eq!(config.app_folder, "myapp");
        assert_eq!(config.token_ttl_secs, 3600);
        assert!(!config.sort_tags);
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SLIDES_DRIVE", "Graph");
        env::set_var("SLIDES_GRAPH_URL", "http://127.0.0.1:9000/v1.0/");
        env::set_var("SLIDES_APP_FOLDER", "/decks/");
        env::set_var("SLIDES_SORT_TAGS", "true");
        env::set_var("SLIDES_TOKEN_TTL_SECS", "not-a-number");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.drive, DriveKind::Graph);
        assert_eq!(config.graph_url, "http://127.0.0.1:9000/v1.0");
        assert_eq!(config.app_folder, "decks");
        assert!(config.sort_tags);
        assert_eq!(config.token_ttl_secs, 3600);
    }

    #[test]
    fn test_invalid_bind_addr_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SLIDES_BIND_ADDR", "nowhere");

        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
