//! Secondary federated sign-in provider.
//!
//! Only consulted when no primary access token is stored at the moment a
//! request is built.

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedUser {
    pub uid: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait FederatedIdentity: Send + Sync {
    /// The currently signed-in identity, if any.
    async fn current_user(&self) -> Option<FederatedUser>;

    /// Mint a fresh identity token for the current user.
    async fn fresh_id_token(&self) -> Result<String>;
}

/// A provider backed by a token obtained out of band (e.g. passed on the
/// command line).
pub struct StaticIdentity {
    user: FederatedUser,
    token: String,
}

impl StaticIdentity {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: FederatedUser {
                uid: uid.into(),
                email: None,
            },
            token: token.into(),
        }
    }
}

#[async_trait]
impl FederatedIdentity for StaticIdentity {
    async fn current_user(&self) -> Option<FederatedUser> {
        Some(self.user.clone())
    }

    async fn fresh_id_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            anyhow::bail!("identity token for '{}' is empty", self.user.uid);
        }
        Ok(self.token.clone())
    }
}
