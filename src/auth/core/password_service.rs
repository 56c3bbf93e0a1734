//! Password hashing service

use std::fmt;

use crate::auth::errors::AuthError;

/// Lowest cost bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;

/// bcrypt only reads this many bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// A salted bcrypt hash produced by [`PasswordService::hash`].
///
/// Only this module can mint one, so a store that accepts a `PasswordDigest`
/// can never be handed a plaintext password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

/// Password hashing service (bcrypt)
#[derive(Debug, Clone)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    /// Create a hasher with the given bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected rather than
    /// truncated.
    pub fn hash(&self, password: &str) -> Result<PasswordDigest, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        bcrypt::hash(password, self.cost)
            .map(PasswordDigest)
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only a malformed hash is an error. A
    /// password too long to have been hashed never matches.
    pub fn verify(&self, hash: &str, password: &str) -> Result<bool, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        bcrypt::verify(password, hash).map_err(|e| AuthError::Verification(e.to_string()))
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
