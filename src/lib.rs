//! Per-host SAML service provider settings and federated frontend user
//! persistence.
//!
//! A tenant's sparse SAML record is looked up by hostname
//! ([`services::ConfigurationResolver`]) and expanded into a complete settings
//! document ([`saml::synthesize`]). Users provisioned through the federation
//! are written to the `fe_users` table ([`services::FrontendUserService`]).

pub mod config;
pub mod db;
pub mod models;
#[cfg(feature = "cli")]
pub mod observability;
pub mod saml;
pub mod services;
