mod frontend_users;
mod saml_configurations;

pub use frontend_users::*;
pub use saml_configurations::*;
