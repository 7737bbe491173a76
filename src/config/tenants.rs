use std::path::Path;

use serde::Deserialize;

use super::{ConfigError, expand_env_vars, validate_tenants};
use crate::models::CreateSamlTenantConfig;

/// Tenant records to load into the database.
///
/// Same `[[tenants]]` entries as the main config file, without any other
/// section:
///
/// ```toml
/// [[tenants]]
/// hostnames = ["shop.example.com"]
/// name = "https://shop.example.com/saml"
/// sp_acs_page = "40"
/// sp_sls_page = "41"
/// url = "https://idp.example.com/sso"
/// idp_entity_id = "https://idp.example.com"
/// idp_certificate = "${SHOP_IDP_CERT}"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantsFile {
    #[serde(default)]
    pub tenants: Vec<CreateSamlTenantConfig>,
}

impl TenantsFile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let file: TenantsFile = toml::from_str(&expand_env_vars(contents)?)?;
        validate_tenants(&file.tenants)?;
        Ok(file)
    }
}
