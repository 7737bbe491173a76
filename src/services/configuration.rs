use std::sync::Arc;

use crate::{
    db::{DbError, TenantConfigStore},
    models::SamlTenantConfig,
    saml::RequestContext,
};

/// Errors resolving the SAML configuration of a tenant.
#[derive(Debug, thiserror::Error)]
pub enum SamlConfigError {
    #[error("no saml configuration found for domain {host}")]
    ConfigNotFound { host: String },

    #[error("no host given and none available from the current request")]
    MissingHost,

    #[error(transparent)]
    Storage(#[from] DbError),
}

/// Looks up the tenant configuration serving a host.
///
/// Every call reads the store; nothing is cached.
#[derive(Clone)]
pub struct ConfigurationResolver {
    store: Arc<dyn TenantConfigStore>,
}

impl ConfigurationResolver {
    pub fn new(store: Arc<dyn TenantConfigStore>) -> Self {
        Self { store }
    }

    /// Resolve the configuration for `host`, or for the host of `request` when
    /// `host` is `None`.
    ///
    /// Hostnames are compared exactly as given, port included.
    pub async fn resolve(
        &self,
        host: Option<&str>,
        request: Option<&dyn RequestContext>,
    ) -> Result<SamlTenantConfig, SamlConfigError> {
        let host = match host {
            Some(host) => host.to_string(),
            None => request
                .and_then(|r| r.host())
                .ok_or(SamlConfigError::MissingHost)?,
        };

        match self.store.find_by_hostname(&host).await? {
            Some(config) => {
                tracing::debug!(host = %host, tenant_id = config.id, "Resolved SAML configuration");
                Ok(config)
            }
            None => {
                tracing::warn!(host = %host, "No SAML configuration for host");
                Err(SamlConfigError::ConfigNotFound { host })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use http::{HeaderMap, HeaderValue, header::HOST};

    use super::*;
    use crate::{
        db::{DbResult, StaticTenantConfigStore},
        models::{CreateSamlTenantConfig, DebugFlag},
    };

    fn resolver() -> ConfigurationResolver {
        let tenant = CreateSamlTenantConfig {
            hostnames: vec!["sp.example.com".to_string()],
            name: "sp1".to_string(),
            sp_acs_page: "123".to_string(),
            sp_sls_page: "124".to_string(),
            url: "https://idp.example/sso".to_string(),
            idp_entity_id: "idp1".to_string(),
            certificate: String::new(),
            cert_key: String::new(),
            idp_certificate: "MIIB...".to_string(),
            idp_certificate_2: None,
            idp_certificate_3: None,
            name_id_format: None,
            idp_sso_binding: None,
            requested_authn_context: None,
            debug: DebugFlag::ENABLED,
        };
        ConfigurationResolver::new(Arc::new(StaticTenantConfigStore::new(&[tenant])))
    }

    #[tokio::test]
    async fn test_resolve_explicit_host() {
        let config = resolver().resolve(Some("sp.example.com"), None).await.unwrap();
        assert_eq!(config.name, "sp1");
    }

    #[tokio::test]
    async fn test_explicit_host_wins_over_request() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("other.example.com"));

        let config = resolver()
            .resolve(Some("sp.example.com"), Some(&headers))
            .await
            .unwrap();
        assert_eq!(config.name, "sp1");
    }

    #[tokio::test]
    async fn test_resolve_from_request_host() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("sp.example.com"));

        let config = resolver().resolve(None, Some(&headers)).await.unwrap();
        assert_eq!(config.name, "sp1");
    }

    #[tokio::test]
    async fn test_unknown_host_carries_host() {
        for host in ["unknown.example.com", "sp.example.com:8080", ""] {
            let err = resolver().resolve(Some(host), None).await.unwrap_err();
            match err {
                SamlConfigError::ConfigNotFound { host: missing } => assert_eq!(missing, host),
                other => panic!("expected ConfigNotFound, got {other:?}"),
            }
        }

        let err = resolver()
            .resolve(Some("unknown.example.com"), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no saml configuration found for domain unknown.example.com"
        );
    }

    #[tokio::test]
    async fn test_missing_host() {
        let err = resolver().resolve(None, None).await.unwrap_err();
        assert!(matches!(err, SamlConfigError::MissingHost));

        let headers = HeaderMap::new();
        let err = resolver().resolve(None, Some(&headers)).await.unwrap_err();
        assert!(matches!(err, SamlConfigError::MissingHost));
    }

    struct FailingStore;

    #[async_trait]
    impl TenantConfigStore for FailingStore {
        async fn find_by_hostname(&self, _hostname: &str) -> DbResult<Option<SamlTenantConfig>> {
            Err(DbError::Internal("connection lost".into()))
        }
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let resolver = ConfigurationResolver::new(Arc::new(FailingStore));
        let err = resolver.resolve(Some("sp.example.com"), None).await.unwrap_err();
        assert!(matches!(err, SamlConfigError::Storage(DbError::Internal(_))));
        assert_eq!(err.to_string(), "Internal error: connection lost");
    }
}
