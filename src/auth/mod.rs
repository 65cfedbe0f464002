mod middleware;
mod password;
mod token;

pub use middleware::{AuthError, RequireAdmin, RequireUser, validate_token};
pub use password::{hash_password, verify_password};
pub use token::{BearerToken, TokenIssuer};
