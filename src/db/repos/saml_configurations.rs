use async_trait::async_trait;

use crate::{
    db::error::DbResult,
    models::{CreateSamlTenantConfig, SamlTenantConfig},
};

/// Read-only lookup of tenant SAML configurations by request host.
///
/// This is all the configuration resolver needs; it is implemented by the
/// SQL repositories and by the static store built from the config file.
#[async_trait]
pub trait TenantConfigStore: Send + Sync {
    /// Find the configuration serving `hostname` (exact match).
    async fn find_by_hostname(&self, hostname: &str) -> DbResult<Option<SamlTenantConfig>>;
}

/// Repository for tenant SAML configurations.
///
/// Each configuration owns a set of hostnames. A hostname belongs to at most
/// one configuration.
#[async_trait]
pub trait SamlConfigurationRepo: TenantConfigStore {
    /// Create a configuration and claim its hostnames.
    ///
    /// # Errors
    /// Returns `DbError::Conflict` if any hostname is already claimed.
    async fn create(&self, input: CreateSamlTenantConfig) -> DbResult<SamlTenantConfig>;

    async fn get_by_id(&self, id: i64) -> DbResult<Option<SamlTenantConfig>>;

    /// List all configurations ordered by ID.
    async fn list(&self) -> DbResult<Vec<SamlTenantConfig>>;

    /// Delete a configuration together with its hostnames.
    async fn delete(&self, id: i64) -> DbResult<()>;
}
