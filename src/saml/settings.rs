use serde::{Serialize, Serializer};

use super::{
    BINDING_HTTP_REDIRECT, DIGEST_SHA256, LOGOUT_CALLBACK_PARAM, NAMEID_FORMAT_EMAIL,
    SIGNATURE_RSA_SHA256,
    endpoints::{EndpointResolver, unresolved},
};
use crate::models::SamlTenantConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Settings Document
// ─────────────────────────────────────────────────────────────────────────────

/// Complete SAML settings for one tenant.
///
/// Serializes to the key layout expected by the SAML toolkit. Optional keys
/// are omitted rather than written as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamlSettings {
    pub strict: bool,
    pub debug: bool,
    pub sp: SpSettings,
    pub idp: IdpSettings,
    pub security: SecuritySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpSettings {
    pub entity_id: String,
    pub assertion_consumer_service: ServiceEndpoint,
    pub single_logout_service: ServiceEndpoint,
    #[serde(rename = "NameIDFormat")]
    pub name_id_format: String,
    #[serde(rename = "x509cert", skip_serializing_if = "Option::is_none")]
    pub x509cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpSettings {
    pub entity_id: String,
    pub single_sign_on_service: SingleSignOnService,
    #[serde(rename = "x509certMulti")]
    pub x509cert_multi: X509CertMulti,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_logout_service: Option<ServiceEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEndpoint {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSignOnService {
    pub url: String,
    pub binding: String,
}

/// IdP certificates by use. Several signing certificates allow key rollover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct X509CertMulti {
    pub signing: Vec<String>,
    pub encryption: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    pub sign_metadata: bool,
    pub name_id_encrypted: bool,
    pub authn_requests_signed: bool,
    pub logout_request_signed: bool,
    pub logout_response_signed: bool,
    pub want_messages_signed: bool,
    pub want_assertions_signed: bool,
    pub want_assertions_encrypted: bool,
    pub signature_algorithm: String,
    pub digest_algorithm: String,
    pub lowercase_urlencoding: bool,
    pub requested_authn_context: RequestedAuthnContext,
    pub relax_destination_validation: bool,
    pub allow_repeat_attribute_name: bool,
    pub want_name_id: bool,
}

impl Default for SecuritySettings {
    /// The fixed policy every tenant gets.
    fn default() -> Self {
        Self {
            sign_metadata: false,
            name_id_encrypted: false,
            authn_requests_signed: true,
            logout_request_signed: true,
            logout_response_signed: true,
            want_messages_signed: false,
            want_assertions_signed: false,
            want_assertions_encrypted: false,
            signature_algorithm: SIGNATURE_RSA_SHA256.to_string(),
            digest_algorithm: DIGEST_SHA256.to_string(),
            lowercase_urlencoding: false,
            requested_authn_context: RequestedAuthnContext::Disabled,
            relax_destination_validation: true,
            allow_repeat_attribute_name: true,
            want_name_id: false,
        }
    }
}

/// Authentication context classes to request, serialized as `false` when
/// none are requested and never as an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestedAuthnContext {
    #[default]
    Disabled,
    Classes(Vec<String>),
}

impl RequestedAuthnContext {
    /// Parse a comma-separated class list. Blank entries are dropped.
    pub fn from_list(list: Option<&str>) -> Self {
        let classes: Vec<String> = list
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(String::from)
            .collect();

        if classes.is_empty() {
            Self::Disabled
        } else {
            Self::Classes(classes)
        }
    }
}

impl Serialize for RequestedAuthnContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::Classes(classes) => classes.serialize(serializer),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthesis
// ─────────────────────────────────────────────────────────────────────────────

/// Build the settings document for a tenant.
///
/// With an endpoint resolver, the ACS and SLS page references become absolute
/// URLs and the logout marker is added as a query parameter. Without one, the
/// references are used as they are and the marker is appended as `&type=701002`.
pub fn synthesize(
    config: &SamlTenantConfig,
    endpoints: Option<&dyn EndpointResolver>,
) -> SamlSettings {
    let (acs_url, sls_url) = match endpoints {
        Some(resolver) => (
            resolver.resolve(&config.sp_acs_page, None, true),
            resolver.resolve(&config.sp_sls_page, Some(LOGOUT_CALLBACK_PARAM), true),
        ),
        None => (
            config.sp_acs_page.clone(),
            unresolved(&config.sp_sls_page, Some(LOGOUT_CALLBACK_PARAM)),
        ),
    };

    let mut signing = vec![config.idp_certificate.clone()];
    signing.extend(
        [&config.idp_certificate_2, &config.idp_certificate_3]
            .into_iter()
            .filter_map(|cert| non_empty(cert.as_deref())),
    );

    let settings = SamlSettings {
        strict: true,
        debug: config.debug.is_enabled(),
        sp: SpSettings {
            entity_id: config.name.clone(),
            assertion_consumer_service: ServiceEndpoint { url: acs_url },
            single_logout_service: ServiceEndpoint { url: sls_url },
            name_id_format: non_empty(config.name_id_format.as_deref())
                .unwrap_or_else(|| NAMEID_FORMAT_EMAIL.to_string()),
            x509cert: non_empty(Some(config.certificate.as_str())),
            private_key: non_empty(Some(config.cert_key.as_str())),
        },
        idp: IdpSettings {
            entity_id: config.idp_entity_id.clone(),
            single_sign_on_service: SingleSignOnService {
                url: config.url.clone(),
                binding: non_empty(config.idp_sso_binding.as_deref())
                    .unwrap_or_else(|| BINDING_HTTP_REDIRECT.to_string()),
            },
            x509cert_multi: X509CertMulti {
                signing,
                encryption: vec![config.idp_certificate.clone()],
            },
            // One IdP endpoint serves both sign-on and logout
            single_logout_service: non_empty(Some(config.url.as_str()))
                .map(|url| ServiceEndpoint { url }),
        },
        security: SecuritySettings {
            requested_authn_context: RequestedAuthnContext::from_list(
                config.requested_authn_context.as_deref(),
            ),
            ..SecuritySettings::default()
        },
    };

    tracing::debug!(
        tenant_id = config.id,
        sp_entity_id = %settings.sp.entity_id,
        acs_url = %settings.sp.assertion_consumer_service.url,
        sls_url = %settings.sp.single_logout_service.url,
        signing_certs = settings.idp.x509cert_multi.signing.len(),
        sp_signs = settings.sp.private_key.is_some(),
        "Synthesized SAML settings"
    );

    settings
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}
