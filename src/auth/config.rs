//! Authentication configuration

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Default token lifetime in hours
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;

/// ID of the seeded "user" role
pub const DEFAULT_ROLE_ID: u64 = 2;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret. `None` means one is generated at startup.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime (hours)
    pub token_ttl_hours: u64,

    /// Role assigned when registration names none
    pub default_role_id: u64,

    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            default_role_id: DEFAULT_ROLE_ID,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AuthConfig {
    /// Apply `JWT_SECRET`, `TOKEN_EXPIRY`, `DEFAULT_ROLE_ID` and `BCRYPT_COST`
    pub fn apply_env(&mut self) {
        if let Some(secret) = std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()) {
            self.jwt_secret = Some(secret);
        }
        if let Ok(raw) = std::env::var("TOKEN_EXPIRY") {
            self.token_ttl_hours = parse_ttl_hours(&raw);
        }
        if let Some(id) = std::env::var("DEFAULT_ROLE_ID")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.default_role_id = id;
        }
        if let Some(cost) = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.bcrypt_cost = cost;
        }
    }

    /// Token lifetime in seconds
    pub fn token_ttl_secs(&self) -> i64 {
        (self.token_ttl_hours as i64).saturating_mul(3600)
    }

    /// The configured secret, or a fresh random one if none was configured
    pub fn resolve_secret(&self) -> String {
        match &self.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!(
                    "JWT_SECRET not configured; using a random secret, issued tokens will not survive a restart"
                );
                generate_secret()
            }
        }
    }
}

/// Hours from a raw `TOKEN_EXPIRY` value; anything unparseable or zero means 24
pub fn parse_ttl_hours(raw: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(hours) if hours > 0 => hours,
        _ => DEFAULT_TOKEN_TTL_HOURS,
    }
}

/// 32 random bytes, base64url encoded
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
