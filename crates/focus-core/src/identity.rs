//! Identity boundary for reconciliation.
//!
//! The engine only needs to know who is signed in. Absence of an identity is
//! an expected answer (`Ok(None)`), distinct from a provider that could not
//! be reached (`Err`).

use std::fmt;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// The authenticated user that scopes every remote read and write
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub access_token: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Supplies the current identity, if any
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Result<Option<Identity>>;
}

/// Resolve the current identity or fail with [`Error::NotSignedIn`].
pub async fn require_identity(provider: &dyn IdentityProvider) -> Result<Identity> {
    provider
        .current_identity()
        .await?
        .ok_or(Error::NotSignedIn)
}

/// Provider with a fixed answer, for tests and token-in-environment setups
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identity: Option<Identity>,
}

impl StaticIdentityProvider {
    pub const fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub const fn signed_out() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        Ok(self.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_identity_is_not_signed_in() {
        let error = require_identity(&StaticIdentityProvider::signed_out())
            .await
            .unwrap_err();
        assert!(error.is_not_signed_in());
    }

    #[tokio::test]
    async fn present_identity_is_returned() {
        let provider = StaticIdentityProvider::signed_in(Identity::new("user-1", "token"));
        let identity = require_identity(&provider).await.unwrap();
        assert_eq!(identity.user_id, "user-1");
    }

    #[test]
    fn identity_debug_redacts_token() {
        let rendered = format!("{:?}", Identity::new("user-1", "secret-token"));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
