//! User authentication and authorization
//!
//! ## Layout
//!
//! ```text
//! auth/
//! ├── types.rs          # identities, roles, permissions, claims, DTOs
//! ├── errors.rs         # AuthError / StoreError
//! ├── config.rs         # AuthConfig
//! ├── clock.rs          # injectable wall clock
//! ├── service.rs        # AuthService (facade)
//! ├── core/             # hasher, token codec, permission evaluator
//! ├── storage/          # CredentialStore contract + in-memory backend
//! └── api/              # axum routes, handlers and guards
//! ```
//!
//! Layering is API → service → storage; the service depends on the store
//! only through the `CredentialStore` trait.

pub mod api;
pub mod clock;
pub mod config;
pub mod core;
pub mod errors;
pub mod service;
pub mod storage;
pub mod types;

pub use api::create_auth_routes;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AuthConfig;
pub use self::core::{MAX_PASSWORD_BYTES, MIN_BCRYPT_COST};
pub use errors::{AuthError, StoreError};
pub use service::AuthService;
pub use storage::{CredentialStore, MemoryStorage};
pub use types::{AuthenticatedUser, Identity, NewIdentity, Permission, Role, TokenClaims};
