//! services/api/src/adapters/tokens.rs
//!
//! An `IdentityService` backed by the statically configured `AUTH_TOKENS` table.

use async_trait::async_trait;
use misinfo_core::ports::{IdentityService, PortError, PortResult};
use std::collections::HashMap;
use uuid::Uuid;

pub struct StaticTokenIdentity {
    owners: HashMap<String, Uuid>,
}

impl StaticTokenIdentity {
    pub fn new(tokens: impl IntoIterator<Item = (String, Uuid)>) -> Self {
        Self {
            owners: tokens.into_iter().collect(),
        }
    }
}

#[async_trait]
impl IdentityService for StaticTokenIdentity {
    async fn resolve_owner(&self, token: &str) -> PortResult<Uuid> {
        self.owners.get(token).copied().ok_or(PortError::Unauthorized)
    }
}
