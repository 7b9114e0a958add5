//! Authentication module for Rentwear
//!
//! Bearer JWTs identify the caller. Accounts and login live outside this
//! service; tokens are verified here and can be issued for tools and tests.

mod jwt;

pub use jwt::{generate_access_token, verify_token, Claims, JwtError};

/// Shared signing key for token verification
#[derive(Clone)]
pub struct AuthKeys {
    jwt_secret: String,
}

impl AuthKeys {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }
}
