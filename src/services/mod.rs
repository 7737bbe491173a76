mod configuration;
mod frontend_users;
mod saml_settings;
mod tenants;

use std::sync::Arc;

pub use configuration::{ConfigurationResolver, SamlConfigError};
pub use frontend_users::FrontendUserService;
pub use saml_settings::SamlSettingsService;
pub use tenants::{TenantService, TenantSummary};

use crate::db::{DbPool, StaticTenantConfigStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub configurations: ConfigurationResolver,
    pub saml_settings: SamlSettingsService,
    /// Absent when running without a database.
    pub frontend_users: Option<FrontendUserService>,
    /// Absent when running without a database.
    pub tenants: Option<TenantService>,
}

impl Services {
    /// Services backed by the database.
    pub fn new(db: Arc<DbPool>) -> Self {
        let configurations = ConfigurationResolver::new(db.tenant_store());
        Self {
            saml_settings: SamlSettingsService::new(configurations.clone()),
            configurations,
            frontend_users: Some(FrontendUserService::new(db.frontend_users())),
            tenants: Some(TenantService::new(db.saml_configurations())),
        }
    }

    /// Services serving tenants declared in the config file. Users cannot be
    /// saved and tenants cannot be managed.
    pub fn with_static_tenants(store: StaticTenantConfigStore) -> Self {
        let configurations = ConfigurationResolver::new(Arc::new(store));
        Self {
            saml_settings: SamlSettingsService::new(configurations.clone()),
            configurations,
            frontend_users: None,
            tenants: None,
        }
    }
}
