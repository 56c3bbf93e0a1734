//! Token management service
//!
//! Access tokens are compact HS256 JWTs (`header.payload.signature`) whose
//! payload is the flat [`TokenClaims`] map. Expiry is decided here against
//! the caller's clock, not by the JWT library.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use zeroize::Zeroizing;

use crate::auth::{
    errors::AuthError,
    types::{Identity, TokenClaims},
};

/// Authorization scheme accepted by [`extract_bearer`]
pub const BEARER_SCHEME: &str = "Bearer";

/// Upper bound on token lifetime (100 years)
pub const MAX_TOKEN_TTL_SECS: i64 = 100 * 365 * 24 * 3600;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Token management service
pub struct TokenService {
    secret: Zeroizing<Vec<u8>>,
    /// Token lifetime (seconds)
    ttl_secs: i64,
}

impl TokenService {
    /// Create a codec for `secret`. An empty secret or a TTL outside
    /// `1..=MAX_TOKEN_TTL_SECS` is rejected.
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Config("JWT secret must not be empty".to_string()));
        }
        if ttl_secs <= 0 {
            return Err(AuthError::Config("token TTL must be positive".to_string()));
        }
        if ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AuthError::Config(format!(
                "token TTL must be at most {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }

        Ok(Self {
            secret: Zeroizing::new(secret.as_bytes().to_vec()),
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `identity` valid from `now` until `now + ttl`
    pub fn issue(&self, identity: &Identity, now: i64) -> Result<String, AuthError> {
        let claims = TokenClaims::for_identity(identity, now, self.ttl_secs);
        self.encode_claims(&claims)
    }

    /// Sign an explicit claims set
    pub fn encode_claims(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify structure, algorithm, signature and expiry, in that order
    pub fn decode(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError> {
        check_header(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
            _ => AuthError::MalformedToken,
        })?;

        if now >= data.claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }
}

/// Pre-flight check on the JOSE header so that foreign or `none` algorithms
/// surface as a signature failure rather than a parse failure.
fn check_header(token: &str) -> Result<(), AuthError> {
    let mut segments = token.split('.');
    let header = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => return Err(AuthError::MalformedToken),
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|_| AuthError::MalformedToken)?;
    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .ok_or(AuthError::MalformedToken)?;

    match alg {
        "HS256" | "HS384" | "HS512" => Ok(()),
        _ => Err(AuthError::InvalidSignature),
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The value must split on single spaces into exactly `Bearer` and the token.
pub fn extract_bearer(header: &str) -> Result<&str, AuthError> {
    if header.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}
