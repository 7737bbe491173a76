mod frontend_user;
mod saml_configuration;

pub use frontend_user::*;
pub use saml_configuration::*;
