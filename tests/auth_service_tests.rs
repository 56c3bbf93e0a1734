//! AuthService integration tests
//!
//! Covers the register / login / validate / permission flows end to end over
//! the in-memory store, plus store-error propagation through a scripted store.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use userblog_auth::auth::{
    storage::seed::{ADMIN_ROLE_ID, USER_ROLE_ID},
    AuthConfig, AuthError, AuthService, CredentialStore, FixedClock, Identity, MemoryStorage,
    NewIdentity, Permission, StoreError, MIN_BCRYPT_COST,
};
use userblog_auth::auth::types::NewIdentityRecord;

const NOW: i64 = 1_700_000_000;

// ============================================================================
// Helpers
// ============================================================================

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some("integration-test-signing-key".to_string()),
        bcrypt_cost: MIN_BCRYPT_COST,
        ..AuthConfig::default()
    }
}

struct Harness {
    service: AuthService,
    storage: MemoryStorage,
    clock: Arc<FixedClock>,
}

fn harness() -> Harness {
    let storage = MemoryStorage::with_default_roles();
    let clock = Arc::new(FixedClock::new(NOW));
    let service =
        AuthService::with_clock(Arc::new(storage.clone()), &test_config(), clock.clone()).unwrap();
    Harness { service, storage, clock }
}

fn candidate(username: &str, password: &str) -> NewIdentity {
    NewIdentity {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: password.to_string(),
        ..NewIdentity::default()
    }
}

/// Store whose lookups follow a script and which counts create calls
#[derive(Default)]
struct ScriptedStore {
    username_lookup: Mutex<Option<Result<Identity, StoreError>>>,
    email_lookup: Mutex<Option<Result<Identity, StoreError>>>,
    id_lookup: Mutex<Option<Result<Identity, StoreError>>>,
    creates: AtomicUsize,
}

impl ScriptedStore {
    fn scripted(slot: &Mutex<Option<Result<Identity, StoreError>>>) -> Result<Identity, StoreError> {
        slot.lock().unwrap().clone().unwrap_or(Err(StoreError::NotFound))
    }
}

#[async_trait]
impl CredentialStore for ScriptedStore {
    async fn find_by_id(&self, _id: u64) -> Result<Identity, StoreError> {
        Self::scripted(&self.id_lookup)
    }

    async fn find_by_username(&self, _username: &str) -> Result<Identity, StoreError> {
        Self::scripted(&self.username_lookup)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Identity, StoreError> {
        Self::scripted(&self.email_lookup)
    }

    async fn create(&self, _record: NewIdentityRecord) -> Result<Identity, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("create should not be reached".to_string()))
    }
}

/// Memory store whose next `blind_lookups` username/email lookups miss,
/// as if a concurrent registration committed right after them
struct LateWriterStore {
    inner: MemoryStorage,
    blind_lookups: AtomicUsize,
}

impl LateWriterStore {
    fn blind(&self) -> bool {
        self.blind_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl CredentialStore for LateWriterStore {
    async fn find_by_id(&self, id: u64) -> Result<Identity, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        if self.blind() {
            return Err(StoreError::NotFound);
        }
        self.inner.find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        if self.blind() {
            return Err(StoreError::NotFound);
        }
        self.inner.find_by_email(email).await
    }

    async fn create(&self, record: NewIdentityRecord) -> Result<Identity, StoreError> {
        self.inner.create(record).await
    }
}

fn existing_identity() -> Identity {
    Identity {
        id: 5,
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: bcrypt::hash("correct-horse", MIN_BCRYPT_COST).unwrap(),
        first_name: String::new(),
        last_name: String::new(),
        role_id: USER_ROLE_ID,
        role: None,
    }
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_register_login_validate_authorize() {
    let h = harness();

    let registered = h.service.register(candidate("bob", "secret123")).await.unwrap();
    assert_eq!(registered.role_id, USER_ROLE_ID);
    assert_eq!(registered.role.as_ref().unwrap().name, "user");

    let token = h.service.login("bob", "secret123").await.unwrap();
    assert!(!token.is_empty());

    let identity = h.service.validate_token(&token).await.unwrap();
    assert_eq!(identity.username, "bob");
    assert_eq!(identity.id, registered.id);

    assert!(!h.service.check_permission(Some(&identity), "blog", "create"));
    assert!(h.service.check_permission(Some(&identity), "blog", "read"));
    assert!(!h.service.check_permission(None, "blog", "read"));
}

#[tokio::test]
async fn test_register_with_explicit_role() {
    let h = harness();
    let mut admin = candidate("root", "secret123");
    admin.role_id = Some(ADMIN_ROLE_ID);

    let identity = h.service.register(admin).await.unwrap();
    assert_eq!(identity.role_id, ADMIN_ROLE_ID);
    assert!(h.service.check_permission(Some(&identity), "user", "delete"));
}

#[tokio::test]
async fn test_password_never_stored_in_plaintext() {
    let h = harness();
    h.service.register(candidate("bob", "secret123")).await.unwrap();

    let stored = h.storage.find_by_username("bob").await.unwrap();
    assert!(!stored.password_hash.contains("secret123"));
    assert!(stored.password_hash.starts_with("$2"));
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = harness();
    h.service.register(candidate("alice", "rightpass")).await.unwrap();

    let wrong_password = h.service.login("alice", "wrongpass").await.unwrap_err();
    let unknown_user = h.service.login("nosuchuser", "anything").await.unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert_eq!(wrong_password.status_code(), unknown_user.status_code());
}

#[tokio::test]
async fn test_login_store_failure_propagates() {
    let store = Arc::new(ScriptedStore::default());
    *store.username_lookup.lock().unwrap() = Some(Err(StoreError::Unavailable("db down".into())));
    let service = AuthService::new(store, &test_config()).unwrap();

    let err = service.login("alice", "x").await.unwrap_err();
    assert!(matches!(err, AuthError::Store(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_login_with_corrupt_stored_hash() {
    let store = Arc::new(ScriptedStore::default());
    let mut identity = existing_identity();
    identity.password_hash = "corrupted".to_string();
    *store.username_lookup.lock().unwrap() = Some(Ok(identity));
    let service = AuthService::new(store, &test_config()).unwrap();

    assert!(matches!(
        service.login("alice", "correct-horse").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_login_against_external_store() {
    let store = Arc::new(ScriptedStore::default());
    *store.username_lookup.lock().unwrap() = Some(Ok(existing_identity()));
    *store.id_lookup.lock().unwrap() = Some(Ok(existing_identity()));
    let service = AuthService::new(store, &test_config()).unwrap();

    let token = service.login("alice", "correct-horse").await.unwrap();
    let identity = service.validate_token(&token).await.unwrap();
    assert_eq!(identity.id, 5);
}

// ============================================================================
// Register
// ============================================================================

#[tokio::test]
async fn test_duplicate_username_stops_before_create() {
    let store = Arc::new(ScriptedStore::default());
    *store.username_lookup.lock().unwrap() = Some(Ok(existing_identity()));
    let service = AuthService::new(store.clone(), &test_config()).unwrap();

    let err = service.register(candidate("alice", "pw123456")).await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUsername));
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_duplicate_email_stops_before_create() {
    let store = Arc::new(ScriptedStore::default());
    *store.email_lookup.lock().unwrap() = Some(Ok(existing_identity()));
    let service = AuthService::new(store.clone(), &test_config()).unwrap();

    let err = service.register(candidate("newname", "pw123456")).await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateEmail));
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_register_lookup_failure_aborts() {
    let store = Arc::new(ScriptedStore::default());
    *store.email_lookup.lock().unwrap() = Some(Err(StoreError::Unavailable("timeout".into())));
    let service = AuthService::new(store.clone(), &test_config()).unwrap();

    let err = service.register(candidate("bob", "pw123456")).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(StoreError::Unavailable(ref m)) if m == "timeout"));
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_register_create_failure_propagates() {
    let store = Arc::new(ScriptedStore::default());
    let service = AuthService::new(store.clone(), &test_config()).unwrap();

    let err = service.register(candidate("bob", "pw123456")).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(StoreError::Unavailable(_))));
    assert_eq!(store.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lost_registration_race_reports_duplicate_field() {
    let store = Arc::new(LateWriterStore {
        inner: MemoryStorage::with_default_roles(),
        blind_lookups: AtomicUsize::new(0),
    });
    let service = AuthService::new(store.clone(), &test_config()).unwrap();
    service.register(candidate("alice", "secret123")).await.unwrap();

    store.blind_lookups.store(2, Ordering::SeqCst);
    let mut same_username = candidate("alice", "secret123");
    same_username.email = "alice2@example.com".to_string();
    assert!(matches!(
        service.register(same_username).await,
        Err(AuthError::DuplicateUsername)
    ));

    store.blind_lookups.store(2, Ordering::SeqCst);
    let mut same_email = candidate("alicia", "secret123");
    same_email.email = "alice@example.com".to_string();
    assert!(matches!(
        service.register(same_email).await,
        Err(AuthError::DuplicateEmail)
    ));

    // Conflicts unrelated to either field pass through
    let mut unknown_role = candidate("carol", "secret123");
    unknown_role.role_id = Some(99);
    assert!(matches!(
        service.register(unknown_role).await,
        Err(AuthError::Store(StoreError::Conflict(_)))
    ));
}

// ============================================================================
// Token validation
// ============================================================================

#[tokio::test]
async fn test_expired_token() {
    let h = harness();
    h.service.register(candidate("bob", "secret123")).await.unwrap();
    let token = h.service.login("bob", "secret123").await.unwrap();

    h.clock.advance(24 * 3600);
    assert!(matches!(
        h.service.validate_token(&token).await,
        Err(AuthError::TokenExpired)
    ));
}

#[tokio::test]
async fn test_token_from_other_deployment() {
    let h = harness();
    h.service.register(candidate("bob", "secret123")).await.unwrap();

    let other_config = AuthConfig {
        jwt_secret: Some("another-deployment-key".to_string()),
        ..test_config()
    };
    let other = AuthService::with_clock(
        Arc::new(h.storage.clone()),
        &other_config,
        h.clock.clone(),
    )
    .unwrap();
    let foreign = other.login("bob", "secret123").await.unwrap();

    assert!(matches!(
        h.service.validate_token(&foreign).await,
        Err(AuthError::InvalidSignature)
    ));
    assert!(matches!(
        h.service.validate_token("not.a.token").await,
        Err(AuthError::MalformedToken)
    ));
}

#[tokio::test]
async fn test_deleted_identity_invalidates_token() {
    let h = harness();
    let bob = h.service.register(candidate("bob", "secret123")).await.unwrap();
    let token = h.service.login("bob", "secret123").await.unwrap();

    h.storage.delete_identity(bob.id).await.unwrap();
    assert!(matches!(
        h.service.validate_token(&token).await,
        Err(AuthError::IdentityNotFound)
    ));
}

#[tokio::test]
async fn test_role_changes_apply_to_existing_tokens() {
    let h = harness();
    let bob = h.service.register(candidate("bob", "secret123")).await.unwrap();
    let token = h.service.login("bob", "secret123").await.unwrap();

    let before = h.service.validate_token(&token).await.unwrap();
    assert!(!h.service.check_permission(Some(&before), "blog", "create"));

    h.storage
        .grant_permission(
            USER_ROLE_ID,
            Permission::new(1, "create_blog", "blog", "create", "Can create blog posts"),
        )
        .await
        .unwrap();
    let granted = h.service.validate_token(&token).await.unwrap();
    assert!(h.service.check_permission(Some(&granted), "blog", "create"));

    h.storage.revoke_permission(USER_ROLE_ID, "blog", "read").await.unwrap();
    let revoked = h.service.validate_token(&token).await.unwrap();
    assert!(!h.service.check_permission(Some(&revoked), "blog", "read"));

    h.storage.assign_role(bob.id, ADMIN_ROLE_ID).await.unwrap();
    let promoted = h.service.validate_token(&token).await.unwrap();
    assert!(h.service.check_permission(Some(&promoted), "user", "delete"));
}

#[tokio::test]
async fn test_validate_store_failure_propagates() {
    let store = Arc::new(ScriptedStore::default());
    *store.username_lookup.lock().unwrap() = Some(Ok(existing_identity()));
    *store.id_lookup.lock().unwrap() = Some(Err(StoreError::Unavailable("replica lag".into())));
    let service = AuthService::new(store, &test_config()).unwrap();

    let token = service.login("alice", "correct-horse").await.unwrap();
    assert!(matches!(
        service.validate_token(&token).await,
        Err(AuthError::Store(StoreError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_authenticate_header() {
    let h = harness();
    h.service.register(candidate("bob", "secret123")).await.unwrap();
    let token = h.service.login("bob", "secret123").await.unwrap();

    let identity = h
        .service
        .authenticate_header(&format!("Bearer {}", token))
        .await
        .unwrap();
    assert_eq!(identity.username, "bob");

    assert!(matches!(
        h.service.authenticate_header("").await,
        Err(AuthError::MissingHeader)
    ));
    assert!(matches!(
        h.service.authenticate_header(&format!("Token {}", token)).await,
        Err(AuthError::MalformedHeader)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins() {
    let h = harness();
    h.service.register(candidate("bob", "secret123")).await.unwrap();
    let service = Arc::new(h.service);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let password = if i % 2 == 0 { "secret123" } else { "wrong" };
                service.login("bob", password).await.is_ok()
            })
        })
        .collect();

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 4);
}
