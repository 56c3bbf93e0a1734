//! Authentication type definitions

use serde::{Deserialize, Serialize};

use crate::auth::core::password_service::PasswordDigest;

/// A single grant: `action` may be performed on `resource`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub id: u64,
    /// Unique label, e.g. `create_blog`
    pub name: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub description: String,
}

impl Permission {
    pub fn new(id: u64, name: &str, resource: &str, action: &str, description: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            description: description.to_string(),
        }
    }

    /// Exact, case-sensitive match on the (resource, action) key
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

/// Named bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

/// A registered user as loaded from the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub email: String,
    /// Stored bcrypt hash, never serialized out
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    pub role_id: u64,
    /// Populated by the store on every lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Registration candidate carrying a plaintext password
#[derive(Debug, Clone, Default)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// `None` falls back to the configured default role
    pub role_id: Option<u64>,
}

/// What the store persists on create. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewIdentityRecord {
    pub username: String,
    pub email: String,
    pub password_hash: PasswordDigest,
    pub first_name: String,
    pub last_name: String,
    pub role_id: u64,
}

/// Claims embedded in an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: u64,
    pub username: String,
    pub role_id: u64,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Absolute expiry, unix seconds
    pub exp: i64,
}

impl TokenClaims {
    pub fn for_identity(identity: &Identity, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            user_id: identity.id,
            username: identity.username.clone(),
            role_id: identity.role_id,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        }
    }
}

/// The identity resolved for the current request by the bearer middleware
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role_id: Option<u64>,
}

impl From<RegisterRequest> for NewIdentity {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role_id: req.role_id,
        }
    }
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
