//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use yatube_core::pagination::PaginationConfig;
use yatube_infra::JwtConfig;
use yatube_infra::database::DatabaseConfig;

#[cfg(feature = "rate-limit")]
use yatube_infra::RateLimitConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub pagination: PaginationConfig,
    /// Directory uploaded images are written to.
    pub media_root: String,
    /// Public URL prefix under which `media_root` is served.
    pub media_url: String,
    pub jwt: JwtConfig,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            pagination: PaginationConfig::default(),
            media_root: "media".to_string(),
            media_url: "/media/".to_string(),
            jwt: JwtConfig::default(),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| {
            let base = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(base.max_connections),
                min_connections: parsed("DB_MIN_CONNECTIONS").unwrap_or(base.min_connections),
                ..base
            }
        });

        let pagination = PaginationConfig {
            default_limit: parsed("PAGE_SIZE").unwrap_or(defaults.pagination.default_limit),
            max_limit: parsed("MAX_PAGE_SIZE").unwrap_or(defaults.pagination.max_limit),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            database,
            pagination,
            media_root: env::var("MEDIA_ROOT").unwrap_or(defaults.media_root),
            media_url: env::var("MEDIA_URL").unwrap_or(defaults.media_url),
            jwt: JwtConfig::from_env(),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
