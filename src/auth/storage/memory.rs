//! In-memory credential store (development and tests)

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{r#trait::CredentialStore, seed};
use crate::auth::{
    errors::StoreError,
    types::{Identity, NewIdentityRecord, Permission, Role},
};

#[derive(Default)]
struct IdentityTable {
    next_id: u64,
    /// id -> identity, stored without its role
    by_id: HashMap<u64, Identity>,
    /// username -> id
    usernames: HashMap<String, u64>,
    /// email -> id
    emails: HashMap<String, u64>,
}

/// In-memory store
///
/// Roles live in their own table and are joined onto identities at lookup
/// time, so role edits are visible to every later lookup.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    identities: Arc<RwLock<IdentityTable>>,
    roles: Arc<RwLock<HashMap<u64, Role>>>,
}

impl MemoryStorage {
    /// Empty store without any roles
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the `admin` and `user` roles
    pub fn with_default_roles() -> Self {
        let roles = seed::default_roles()
            .into_iter()
            .map(|role| (role.id, role))
            .collect();

        Self {
            identities: Arc::default(),
            roles: Arc::new(RwLock::new(roles)),
        }
    }

    /// Insert or replace a role
    pub async fn insert_role(&self, role: Role) {
        info!(role_id = role.id, name = %role.name, "role stored");
        self.roles.write().await.insert(role.id, role);
    }

    pub async fn find_role(&self, role_id: u64) -> Result<Role, StoreError> {
        self.roles
            .read()
            .await
            .get(&role_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Add a permission to a role unless the (resource, action) pair is already granted
    pub async fn grant_permission(&self, role_id: u64, permission: Permission) -> Result<(), StoreError> {
        let mut roles = self.roles.write().await;
        let role = roles.get_mut(&role_id).ok_or(StoreError::NotFound)?;
        if !role
            .permissions
            .iter()
            .any(|p| p.matches(&permission.resource, &permission.action))
        {
            info!(role_id, resource = %permission.resource, action = %permission.action, "permission granted");
            role.permissions.push(permission);
        }
        Ok(())
    }

    /// Remove the (resource, action) grant from a role
    pub async fn revoke_permission(&self, role_id: u64, resource: &str, action: &str) -> Result<(), StoreError> {
        let mut roles = self.roles.write().await;
        let role = roles.get_mut(&role_id).ok_or(StoreError::NotFound)?;
        role.permissions.retain(|p| !p.matches(resource, action));
        info!(role_id, resource, action, "permission revoked");
        Ok(())
    }

    /// Move an identity to another existing role
    pub async fn assign_role(&self, user_id: u64, role_id: u64) -> Result<(), StoreError> {
        if !self.roles.read().await.contains_key(&role_id) {
            return Err(StoreError::NotFound);
        }
        let mut table = self.identities.write().await;
        let identity = table.by_id.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        identity.role_id = role_id;
        info!(user_id, role_id, "role assigned");
        Ok(())
    }

    pub async fn delete_identity(&self, user_id: u64) -> Result<(), StoreError> {
        let mut table = self.identities.write().await;
        let identity = table.by_id.remove(&user_id).ok_or(StoreError::NotFound)?;
        table.usernames.remove(&identity.username);
        table.emails.remove(&identity.email);
        info!(user_id, "identity deleted");
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.identities.read().await.by_id.len()
    }

    async fn with_role(&self, mut identity: Identity) -> Identity {
        identity.role = self.roles.read().await.get(&identity.role_id).cloned();
        identity
    }

    async fn lookup(&self, index: impl FnOnce(&IdentityTable) -> Option<u64>) -> Result<Identity, StoreError> {
        let identity = {
            let table = self.identities.read().await;
            index(&table)
                .and_then(|id| table.by_id.get(&id))
                .cloned()
                .ok_or(StoreError::NotFound)?
        };
        Ok(self.with_role(identity).await)
    }
}

#[async_trait]
impl CredentialStore for MemoryStorage {
    async fn find_by_id(&self, id: u64) -> Result<Identity, StoreError> {
        debug!(id, "lookup by id");
        self.lookup(|table| table.by_id.contains_key(&id).then_some(id)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        self.lookup(|table| table.usernames.get(username).copied()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        self.lookup(|table| table.emails.get(email).copied()).await
    }

    async fn create(&self, record: NewIdentityRecord) -> Result<Identity, StoreError> {
        if !self.roles.read().await.contains_key(&record.role_id) {
            return Err(StoreError::Conflict(format!("role {} does not exist", record.role_id)));
        }

        let identity = {
            let mut table = self.identities.write().await;
            if table.usernames.contains_key(&record.username) {
                return Err(StoreError::Conflict("username already exists".to_string()));
            }
            if table.emails.contains_key(&record.email) {
                return Err(StoreError::Conflict("email already exists".to_string()));
            }

            table.next_id += 1;
            let identity = Identity {
                id: table.next_id,
                username: record.username,
                email: record.email,
                password_hash: record.password_hash.into_inner(),
                first_name: record.first_name,
                last_name: record.last_name,
                role_id: record.role_id,
                role: None,
            };
            table.usernames.insert(identity.username.clone(), identity.id);
            table.emails.insert(identity.email.clone(), identity.id);
            table.by_id.insert(identity.id, identity.clone());
            identity
        };

        info!(user_id = identity.id, "identity created");
        Ok(self.with_role(identity).await)
    }
}
