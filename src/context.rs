/// Application context and dependency injection
use crate::{
    clock::{Clock, SystemClock},
    config::ServerConfig,
    db,
    emergency::{EmergencyAccessManager, SqliteTokenStore},
    error::{ApiError, ApiResult},
    family::FamilyManager,
    health::HealthRecordManager,
    rate_limit::RateLimiter,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub clock: Arc<dyn Clock>,
    pub family_manager: Arc<FamilyManager>,
    pub health_manager: Arc<HealthRecordManager>,
    pub emergency_manager: Arc<EmergencyAccessManager>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directory if it doesn't exist
        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory)
                .await
                .map_err(|e| {
                    ApiError::Internal(format!(
                        "Failed to create directory {:?}: {}",
                        config.storage.data_directory, e
                    ))
                })?;
        }

        // Initialize database
        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        Ok(Self::from_parts(config, pool, Arc::new(SystemClock)))
    }

    /// Wire services over an already migrated pool and a chosen clock
    pub fn from_parts(config: ServerConfig, db: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let family_manager = Arc::new(FamilyManager::new(db.clone()));
        let health_manager = Arc::new(HealthRecordManager::new(db.clone()));

        let emergency_manager = Arc::new(EmergencyAccessManager::new(
            Arc::new(SqliteTokenStore::new(db.clone())),
            Arc::clone(&family_manager),
            Arc::clone(&health_manager),
            Arc::clone(&clock),
            config.service.public_url.clone(),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config: Arc::new(config),
            db,
            clock,
            family_manager,
            health_manager,
            emergency_manager,
            rate_limiter,
        }
    }

    /// Get service bind address
    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
