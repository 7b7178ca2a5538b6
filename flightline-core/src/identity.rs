use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::StoreError;

/// The acting member. The booking screen takes a resolved identity at
/// construction; there is no ambient current-user lookup and no fallback
/// member when resolution fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
}

impl Identity {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Resolves the currently authenticated member.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Result<Identity, StoreError>;
}

/// In-process provider used by the development service and tests.
pub struct FixedIdentityProvider {
    identity: Identity,
}

impl FixedIdentityProvider {
    pub fn new(id: Uuid) -> Self {
        Self {
            identity: Identity::new(id),
        }
    }
}

#[async_trait]
impl IdentityProvider for FixedIdentityProvider {
    async fn current_identity(&self) -> Result<Identity, StoreError> {
        Ok(self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_provider_returns_configured_identity() {
        let id = Uuid::new_v4();
        let provider = FixedIdentityProvider::new(id);

        let identity = provider.current_identity().await.unwrap();
        assert_eq!(identity.id, id);
    }
}
