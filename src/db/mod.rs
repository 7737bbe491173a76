mod error;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;
mod static_configs;

#[cfg(all(test, any(feature = "database-sqlite", feature = "database-postgres")))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;
pub use static_configs::StaticTenantConfigStore;

use crate::config::DatabaseConfig;

/// PostgreSQL pool configuration with optional read replica.
#[cfg(feature = "database-postgres")]
pub struct PgPoolPair {
    /// Primary pool for writes.
    pub write: sqlx::PgPool,
    /// Optional read replica pool. If None, reads use the write pool.
    pub read: Option<sqlx::PgPool>,
}

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    saml_configurations: Arc<dyn SamlConfigurationRepo>,
    tenant_store: Arc<dyn TenantConfigStore>,
    frontend_users: Arc<dyn FrontendUserRepo>,
}

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "database-postgres")]
    Postgres(PgPoolPair),
    #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
    _None(std::convert::Infallible),
}

/// Database pool supporting both SQLite and PostgreSQL.
///
/// Repositories are cached at construction time.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let configs = Arc::new(sqlite::SqliteSamlConfigurationRepo::new(pool.clone()));
        let repos = CachedRepos {
            saml_configurations: configs.clone(),
            tenant_store: configs,
            frontend_users: Arc::new(sqlite::SqliteFrontendUserRepo::new(pool.clone())),
        };

        Self {
            inner: PoolStorage::Sqlite(pool),
            repos,
        }
    }

    /// Create a DbPool from existing PostgreSQL pools.
    #[cfg(feature = "database-postgres")]
    pub fn from_postgres(write_pool: sqlx::PgPool, read_pool: Option<sqlx::PgPool>) -> Self {
        let configs = Arc::new(postgres::PostgresSamlConfigurationRepo::new(
            write_pool.clone(),
            read_pool.clone(),
        ));
        let repos = CachedRepos {
            saml_configurations: configs.clone(),
            tenant_store: configs,
            frontend_users: Arc::new(postgres::PostgresFrontendUserRepo::new(
                write_pool.clone(),
                read_pool.clone(),
            )),
        };

        Self {
            inner: PoolStorage::Postgres(PgPoolPair {
                write: write_pool,
                read: read_pool,
            }),
            repos,
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.pool_size)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .foreign_keys(true)
                            .journal_mode(cfg.journal.into())
                            .busy_timeout(cfg.busy_timeout()),
                    )
                    .await?;

                tracing::debug!(path = %cfg.path, pool_size = cfg.pool_size, "Opened SQLite database");
                Ok(Self::from_sqlite(pool))
            }
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => {
                let connect = |url: &str| {
                    let url = url.to_string();
                    async move {
                        let options = url
                            .parse::<sqlx::postgres::PgConnectOptions>()?
                            .ssl_mode(cfg.ssl_mode.into());
                        sqlx::postgres::PgPoolOptions::new()
                            .max_connections(cfg.pool_size)
                            .acquire_timeout(cfg.connect_timeout())
                            .connect_with(options)
                            .await
                    }
                };

                let write_pool = connect(&cfg.url).await?;

                let read_pool = if let Some(read_url) = &cfg.read_url {
                    tracing::info!("Configuring read replica pool");
                    Some(connect(read_url).await?)
                } else {
                    None
                };

                Ok(Self::from_postgres(write_pool, read_pool))
            }
        }
    }

    /// Run database migrations using sqlx's migration runner.
    /// Migrations always run on the primary (write) pool.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pools) => {
                tracing::info!("Running PostgreSQL migrations");
                sqlx::migrate!("./migrations_sqlx/postgres")
                    .run(&pools.write)
                    .await?;
                tracing::info!("PostgreSQL migrations completed successfully");
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    /// Tenant SAML configuration repository
    pub fn saml_configurations(&self) -> Arc<dyn SamlConfigurationRepo> {
        Arc::clone(&self.repos.saml_configurations)
    }

    /// Hostname lookup over the tenant configuration repository
    pub fn tenant_store(&self) -> Arc<dyn TenantConfigStore> {
        Arc::clone(&self.repos.tenant_store)
    }

    /// Frontend user repository
    pub fn frontend_users(&self) -> Arc<dyn FrontendUserRepo> {
        Arc::clone(&self.repos.frontend_users)
    }

    /// Run a trivial query on every pool.
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pools) => {
                sqlx::query("SELECT 1").execute(&pools.write).await?;
                if let Some(read) = &pools.read {
                    sqlx::query("SELECT 1").execute(read).await?;
                }
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }
}
