//! Application state - shared across all handlers.

use std::sync::Arc;

use yatube_core::pagination::PaginationConfig;
use yatube_core::ports::{ImageStore, PasswordService, TokenService, UserRepository};
use yatube_core::{Repositories, Services};
use yatube_infra::{Argon2PasswordService, FileSystemImageStore, InMemoryStore, JwtTokenService};

#[cfg(feature = "postgres")]
use yatube_infra::{DatabaseConnections, postgres_repositories};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub images: Arc<dyn ImageStore>,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Build the application state, connecting to PostgreSQL when configured.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        tracing::info!("Application state initialized");
        Self::from_repositories(config, repos)
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::from_repositories(config, Arc::new(InMemoryStore::new()).into_repositories())
    }

    pub fn from_repositories(config: &AppConfig, repos: Repositories) -> Self {
        let images: Arc<dyn ImageStore> = Arc::new(FileSystemImageStore::new(
            &config.media_root,
            config.media_url.clone(),
        ));

        Self {
            services: Services::new(&repos, images.clone()),
            users: repos.users,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            images,
            pagination: config.pagination,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryStore::new()).into_repositories();
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => postgres_repositories(connections.main),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryStore::new()).into_repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory store");
        Arc::new(InMemoryStore::new()).into_repositories()
    }
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use super::*;
    use yatube_infra::DatabaseConfig;

    #[actix_rt::test]
    async fn test_minimal_build_ignores_database_url() {
        let config = AppConfig {
            database: Some(DatabaseConfig::new("postgres://unreachable:1/yatube")),
            ..AppConfig::default()
        };

        let state = AppState::new(&config).await;

        assert!(state.users.find_by_username("nobody").await.unwrap().is_none());
    }
}
