mod frontend_users;
mod saml_configurations;

pub use frontend_users::PostgresFrontendUserRepo;
pub use saml_configurations::PostgresSamlConfigurationRepo;
