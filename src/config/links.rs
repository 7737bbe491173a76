use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::saml::PageLinkBuilder;

/// Callback link building.
///
/// Without a base URL, ACS/SLS page references are handed to the SAML
/// settings unresolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinksConfig {
    /// Site base URL, e.g. `https://www.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl LinksConfig {
    /// Link builder for the configured base URL, if any.
    pub fn page_links(&self) -> Result<Option<PageLinkBuilder>, ConfigError> {
        self.base_url
            .as_deref()
            .map(PageLinkBuilder::new)
            .transpose()
            .map_err(|e| ConfigError::Validation(format!("links.base_url: {e}")))
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.page_links().map(|_| ())
    }
}
