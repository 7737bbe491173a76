mod frontend_users;
mod saml_configurations;

pub use frontend_users::SqliteFrontendUserRepo;
pub use saml_configurations::SqliteSamlConfigurationRepo;
