//! Authentication service (facade)
//!
//! Composes the credential store, password hasher, token codec and
//! permission evaluator into the register / login / validate / authorize
//! use cases consumed by the HTTP layer. Holds no mutable state.

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    clock::{Clock, SystemClock},
    config::AuthConfig,
    core::{extract_bearer, PasswordDigest, PasswordService, PermissionService, TokenService},
    errors::{AuthError, StoreError},
    storage::CredentialStore,
    types::{Identity, NewIdentity, NewIdentityRecord},
};

/// Authentication service
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    tokens: TokenService,
    permissions: PermissionService,
    clock: Arc<dyn Clock>,
    default_role_id: u64,
    /// Verified against on unknown usernames so both login failures cost one bcrypt check
    dummy_hash: PasswordDigest,
}

impl AuthService {
    /// Create the service on the system clock
    ///
    /// # Errors
    /// `AuthError::Config` if the signing secret or TTL is unusable
    pub fn new(store: Arc<dyn CredentialStore>, config: &AuthConfig) -> Result<Self, AuthError> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn CredentialStore>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let tokens = TokenService::new(&config.resolve_secret(), config.token_ttl_secs())?;
        let passwords = PasswordService::new(config.bcrypt_cost);
        let dummy_hash = passwords.hash("timing-equalizer")?;

        Ok(Self {
            store,
            passwords,
            tokens,
            permissions: PermissionService::new(),
            clock,
            default_role_id: config.default_role_id,
            dummy_hash,
        })
    }

    /// Token lifetime (seconds)
    pub fn token_ttl_secs(&self) -> i64 {
        self.tokens.ttl_secs()
    }

    /// Register a new identity.
    ///
    /// Duplicate checks run before any hashing or store write. A lookup error
    /// other than `NotFound` aborts registration unchanged. A `Conflict` from
    /// `create` (a concurrent registration won) is reported as the duplicate
    /// field when one can be identified.
    pub async fn register(&self, candidate: NewIdentity) -> Result<Identity, AuthError> {
        match self.store.find_by_username(&candidate.username).await {
            Ok(_) => return Err(AuthError::DuplicateUsername),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        match self.store.find_by_email(&candidate.email).await {
            Ok(_) => return Err(AuthError::DuplicateEmail),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let role_id = candidate
            .role_id
            .filter(|id| *id != 0)
            .unwrap_or(self.default_role_id);

        let password_hash = self.hash_password(candidate.password).await?;

        let record = NewIdentityRecord {
            username: candidate.username.clone(),
            email: candidate.email.clone(),
            password_hash,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            role_id,
        };
        let identity = match self.store.create(record).await {
            Ok(identity) => identity,
            Err(StoreError::Conflict(reason)) => {
                return Err(self
                    .classify_conflict(&candidate.username, &candidate.email, reason)
                    .await)
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = identity.id, role_id, "user registered");
        Ok(identity)
    }

    /// Authenticate and issue a signed access token.
    ///
    /// Unknown username and wrong password are the same `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let identity = match self.store.find_by_username(username).await {
            Ok(identity) => Some(identity),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let stored_hash = identity
            .as_ref()
            .map(|i| i.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.as_str().to_string());

        let password_ok = match self.verify_password(stored_hash, password.to_string()).await {
            Ok(ok) => ok,
            Err(AuthError::Verification(e)) => {
                warn!(error = %e, "stored password hash is unreadable");
                false
            }
            Err(e) => return Err(e),
        };

        let identity = match identity {
            Some(identity) if password_ok => identity,
            _ => {
                warn!("login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(&identity, self.clock.now())?;
        info!(user_id = identity.id, "login succeeded");
        Ok(token)
    }

    /// Resolve a token to a freshly loaded identity
    pub async fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.tokens.decode(token, self.clock.now()).map_err(|e| {
            warn!(error = %e, "token rejected");
            e
        })?;

        match self.store.find_by_id(claims.user_id).await {
            Ok(identity) => Ok(identity),
            Err(StoreError::NotFound) => {
                warn!(user_id = claims.user_id, "token refers to a missing user");
                Err(AuthError::IdentityNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `ExtractBearer` followed by `ValidateToken`
    pub async fn authenticate_header(&self, header: &str) -> Result<Identity, AuthError> {
        let token = extract_bearer(header)?;
        self.validate_token(token).await
    }

    pub fn check_permission(&self, identity: Option<&Identity>, resource: &str, action: &str) -> bool {
        self.permissions.has_permission(identity, resource, action)
    }

    /// Load an identity by ID; store errors pass through unchanged
    pub async fn get_user_by_id(&self, id: u64) -> Result<Identity, AuthError> {
        Ok(self.store.find_by_id(id).await?)
    }

    async fn classify_conflict(&self, username: &str, email: &str, reason: String) -> AuthError {
        if self.store.find_by_username(username).await.is_ok() {
            return AuthError::DuplicateUsername;
        }
        if self.store.find_by_email(email).await.is_ok() {
            return AuthError::DuplicateEmail;
        }
        StoreError::Conflict(reason).into()
    }

    // bcrypt is CPU-bound; a blocking task also runs to completion if the
    // request future is dropped.
    async fn hash_password(&self, password: String) -> Result<PasswordDigest, AuthError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, hash: String, password: String) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.verify(&hash, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?
    }
}
