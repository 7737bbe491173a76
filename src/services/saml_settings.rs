use super::{ConfigurationResolver, SamlConfigError};
use crate::saml::{EndpointResolver, RequestContext, SamlSettings, synthesize};

/// Resolves a tenant and builds its SAML settings in one step.
#[derive(Clone)]
pub struct SamlSettingsService {
    resolver: ConfigurationResolver,
}

impl SamlSettingsService {
    pub fn new(resolver: ConfigurationResolver) -> Self {
        Self { resolver }
    }

    /// Settings for `host` (or the request host), built fresh on every call.
    ///
    /// `endpoints` is request-scoped: pass it when absolute callback URLs can
    /// be built for the current site.
    pub async fn settings(
        &self,
        host: Option<&str>,
        request: Option<&dyn RequestContext>,
        endpoints: Option<&dyn EndpointResolver>,
    ) -> Result<SamlSettings, SamlConfigError> {
        let config = self.resolver.resolve(host, request).await?;
        Ok(synthesize(&config, endpoints))
    }
}
