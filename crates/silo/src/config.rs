//! Warehouse connection settings.
//!
//! Loaded from the process environment; a `.env` file in the working
//! directory is honored if present.

const DEFAULT_POOL_SIZE: usize = 16;

/// Connection settings for the warehouse.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection URL (`DATABASE_URL`).
    pub database_url: String,
    /// Upper bound on concurrently held execution handles
    /// (`SILO_POOL_SIZE`, default 16).
    pub pool_size: usize,
}

impl Config {
    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let pool_size = match std::env::var("SILO_POOL_SIZE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidPoolSize(raw))?,
            Err(_) => DEFAULT_POOL_SIZE,
        };

        Ok(Self {
            database_url,
            pool_size,
        })
    }

    /// Build a bounded connection pool from these settings.
    #[cfg(feature = "deadpool")]
    pub fn create_pool(&self) -> Result<deadpool_postgres::Pool, crate::Error> {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.url = Some(self.database_url.clone());
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.pool_size));
        cfg.create_pool(
            Some(deadpool_postgres::Runtime::Tokio1),
            tokio_postgres::NoTls,
        )
        .map_err(|e| crate::Error::Pool(e.to_string()))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// DATABASE_URL is not set
    MissingDatabaseUrl,
    /// SILO_POOL_SIZE is not a positive integer
    InvalidPoolSize(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL is not set in the environment")
            }
            ConfigError::InvalidPoolSize(raw) => {
                write!(f, "SILO_POOL_SIZE is not a positive integer: {}", raw)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
