use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    db::{error::DbResult, repos::TenantConfigStore},
    models::{CreateSamlTenantConfig, SamlTenantConfig},
};

/// Tenant configurations declared in the configuration file.
///
/// Used when no database is configured. Records get sequential IDs in
/// declaration order, starting at 1.
#[derive(Debug, Default)]
pub struct StaticTenantConfigStore {
    configs: Vec<SamlTenantConfig>,
    by_hostname: HashMap<String, usize>,
}

impl StaticTenantConfigStore {
    /// Build the store. Hostname uniqueness is checked by config validation;
    /// if a hostname repeats anyway the first declaration wins.
    pub fn new(tenants: &[CreateSamlTenantConfig]) -> Self {
        let now = chrono::Utc::now();
        let mut configs = Vec::with_capacity(tenants.len());
        let mut by_hostname = HashMap::new();

        for (index, tenant) in tenants.iter().enumerate() {
            for hostname in &tenant.hostnames {
                by_hostname.entry(hostname.clone()).or_insert(index);
            }
            configs.push(SamlTenantConfig::from_input(
                index as i64 + 1,
                tenant.clone(),
                now,
            ));
        }

        Self {
            configs,
            by_hostname,
        }
    }

    pub fn list(&self) -> &[SamlTenantConfig] {
        &self.configs
    }
}

#[async_trait]
impl TenantConfigStore for StaticTenantConfigStore {
    async fn find_by_hostname(&self, hostname: &str) -> DbResult<Option<SamlTenantConfig>> {
        Ok(self
            .by_hostname
            .get(hostname)
            .and_then(|&index| self.configs.get(index))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DebugFlag;

    fn tenant(name: &str, hostnames: &[&str]) -> CreateSamlTenantConfig {
        CreateSamlTenantConfig {
            hostnames: hostnames.iter().map(|h| h.to_string()).collect(),
            name: name.to_string(),
            sp_acs_page: "10".to_string(),
            sp_sls_page: "11".to_string(),
            url: "https://idp.example/sso".to_string(),
            idp_entity_id: "https://idp.example".to_string(),
            certificate: String::new(),
            cert_key: String::new(),
            idp_certificate: "IDPCERT".to_string(),
            idp_certificate_2: None,
            idp_certificate_3: None,
            name_id_format: None,
            idp_sso_binding: None,
            requested_authn_context: None,
            debug: DebugFlag::DISABLED,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_exact_hostname() {
        let store = StaticTenantConfigStore::new(&[
            tenant("sp1", &["a.example", "www.a.example"]),
            tenant("sp2", &["b.example"]),
        ]);

        let found = store.find_by_hostname("www.a.example").await.unwrap().unwrap();
        assert_eq!(found.name, "sp1");
        assert_eq!(found.id, 1);

        let found = store.find_by_hostname("b.example").await.unwrap().unwrap();
        assert_eq!(found.id, 2);

        assert!(store.find_by_hostname("B.EXAMPLE").await.unwrap().is_none());
        assert!(store.find_by_hostname("a.example:8080").await.unwrap().is_none());
        assert!(store.find_by_hostname("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_declaration_wins() {
        let store = StaticTenantConfigStore::new(&[
            tenant("first", &["dup.example"]),
            tenant("second", &["dup.example"]),
        ]);

        let found = store.find_by_hostname("dup.example").await.unwrap().unwrap();
        assert_eq!(found.name, "first");
        assert_eq!(store.list().len(), 2);
    }
}
