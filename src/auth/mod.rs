pub mod password;

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{CredentialHasher, PasswordError};

/// Retired keys kept for verification after a rotation
const MAX_RETIRED_KEYS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id
    pub id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// The employee a token is issued for
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signed with unknown key: {0}")]
    UnknownKey(String),

    #[error("Token expired")]
    Expired,
}

/// HMAC secret identified by the `kid` it is published under
#[derive(Clone)]
pub struct SigningKey {
    id: String,
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn new(id: impl Into<String>, secret: impl AsRef<[u8]>) -> Result<Self, JwtError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            id: id.into(),
            secret: secret.to_vec(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// The active signing key plus the most recently retired ones
#[derive(Debug, Clone)]
pub struct KeyRing {
    active: SigningKey,
    retired: VecDeque<SigningKey>,
}

impl KeyRing {
    pub fn new(active: SigningKey) -> Self {
        Self {
            active,
            retired: VecDeque::new(),
        }
    }

    /// `retired` is ordered newest first; anything past the retention limit is dropped
    pub fn with_retired(active: SigningKey, retired: Vec<SigningKey>) -> Self {
        let mut retired: VecDeque<SigningKey> = retired.into();
        retired.truncate(MAX_RETIRED_KEYS);
        Self { active, retired }
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        let active = SigningKey::new(&security.jwt_key_id, &security.jwt_secret)?;
        let retired = security
            .jwt_previous_secrets
            .iter()
            .map(|(id, secret)| SigningKey::new(id, secret))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_retired(active, retired))
    }

    pub fn active(&self) -> &SigningKey {
        &self.active
    }

    fn rotate(&mut self, key: SigningKey) {
        let previous = std::mem::replace(&mut self.active, key);
        self.retired.push_front(previous);
        self.retired.truncate(MAX_RETIRED_KEYS);
    }

    fn find(&self, id: &str) -> Option<&SigningKey> {
        std::iter::once(&self.active)
            .chain(self.retired.iter())
            .find(|key| key.id == id)
    }
}

/// Signs and verifies HS256 session tokens
#[derive(Debug)]
pub struct TokenIssuer {
    keys: RwLock<KeyRing>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: KeyRing, ttl: Duration) -> Self {
        Self {
            keys: RwLock::new(keys),
            ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Ok(Self::new(
            KeyRing::from_config(security)?,
            Duration::hours(security.jwt_expiry_hours as i64),
        ))
    }

    pub fn issue(&self, identity: Identity) -> Result<String, JwtError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: Identity, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims {
            id: identity.id,
            tenant_id: identity.tenant_id,
            email: identity.email,
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(keys.active.id.clone());

        encode(&header, &claims, &EncodingKey::from_secret(&keys.active.secret))
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks the signature under the key named by `kid`, then rejects tokens
    /// whose `exp` lies strictly before `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let header = decode_header(token).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| JwtError::InvalidToken("missing key id".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the supplied clock below
        validation.validate_exp = false;

        let claims = {
            let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
            let key = keys.find(&kid).ok_or(JwtError::UnknownKey(kid.clone()))?;
            decode::<Claims>(token, &DecodingKey::from_secret(&key.secret), &validation)
                .map_err(|e| JwtError::InvalidToken(e.to_string()))?
                .claims
        };

        if now.timestamp() > claims.exp {
            return Err(JwtError::Expired);
        }
        Ok(claims)
    }

    /// Make `key` the signing key; the old one keeps verifying until evicted
    pub fn rotate(&self, key: SigningKey) {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(kid = %key.id, retired = %keys.active.id, "Rotated JWT signing key");
        keys.rotate(key);
    }

    pub fn active_key_id(&self) -> String {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .id
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> SigningKey {
        SigningKey::new(id, format!("secret-{}", id)).unwrap()
    }

    fn ada() -> Identity {
        Identity {
            id: 7,
            tenant_id: 3,
            email: "a@acme.com".to_string(),
            role: "Super Admin".to_string(),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(KeyRing::new(key("k1")), Duration::hours(24))
    }

    #[test]
    fn token_carries_identity() {
        let issuer = issuer();
        let token = issuer.issue(ada()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.tenant_id, 3);
        assert_eq!(claims.email, "a@acme.com");
        assert_eq!(claims.role, "Super Admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn jti_is_unique() {
        let issuer = issuer();
        let a = issuer.verify(&issuer.issue(ada()).unwrap()).unwrap();
        let b = issuer.verify(&issuer.issue(ada()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn expires_strictly_after_ttl() {
        let issuer = issuer();
        let issued = Utc::now();
        let token = issuer.issue_at(ada(), issued).unwrap();

        assert!(issuer.verify_at(&token, issued + Duration::hours(24)).is_ok());
        let late = issued + Duration::hours(24) + Duration::seconds(1);
        assert!(matches!(issuer.verify_at(&token, late), Err(JwtError::Expired)));
    }

    #[test]
    fn rejects_foreign_signature() {
        let other = TokenIssuer::new(
            KeyRing::new(SigningKey::new("k1", "another-secret").unwrap()),
            Duration::hours(24),
        );
        let token = other.issue(ada()).unwrap();
        assert!(matches!(issuer().verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(issuer().verify("not.a.token"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rotation_keeps_previous_keys_until_evicted() {
        let issuer = issuer();
        let first = issuer.issue(ada()).unwrap();

        issuer.rotate(key("k2"));
        assert_eq!(issuer.active_key_id(), "k2");
        assert!(issuer.verify(&first).is_ok());
        let second = issuer.issue(ada()).unwrap();
        assert!(issuer.verify(&second).is_ok());

        for id in ["k3", "k4", "k5"] {
            issuer.rotate(key(id));
        }
        // k1 fell off the retired list
        assert!(matches!(issuer.verify(&first), Err(JwtError::UnknownKey(kid)) if kid == "k1"));
        assert!(issuer.verify(&second).is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(SigningKey::new("k1", ""), Err(JwtError::InvalidSecret)));
    }
}
