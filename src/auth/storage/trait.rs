//! Credential store trait

use async_trait::async_trait;

use crate::auth::{
    errors::StoreError,
    types::{Identity, NewIdentityRecord},
};

/// Credential store.
///
/// Lookups return the identity with its role and permissions populated, or
/// `StoreError::NotFound`. Any other error is an infrastructure failure.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Identity, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError>;

    /// Persist a new identity and return it with its assigned ID
    async fn create(&self, record: NewIdentityRecord) -> Result<Identity, StoreError>;
}
