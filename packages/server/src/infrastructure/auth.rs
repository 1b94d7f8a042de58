//! Token-table `AuthVerifier` implementation.
//!
//! Stands in for the external credential verifier in development and tests:
//! a token is valid only if it appears in the table. The gateway never
//! attaches an identity from an unverified token, so any token not known
//! here is rejected outright.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{AuthError, AuthVerifier, UserId};

pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

impl Default for StaticTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
