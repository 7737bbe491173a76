//! SAML settings synthesis.
//!
//! Turns a tenant's [`SamlTenantConfig`](crate::models::SamlTenantConfig) into the
//! complete settings document consumed by a SAML toolkit (php-saml / python3-saml
//! key layout). Protocol processing itself is out of scope.

mod endpoints;
mod request;
mod settings;

pub use endpoints::{EndpointResolver, PageLinkBuilder, PageLinkError};
pub use request::RequestContext;
pub use settings::*;

/// Default NameID format requested from the IdP.
pub const NAMEID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";

/// Default binding for the IdP single sign-on service.
pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";

pub const SIGNATURE_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

pub const DIGEST_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// Query parameter marking a callback as the single logout endpoint.
pub const LOGOUT_CALLBACK_PARAM: &str = "type=701002";
