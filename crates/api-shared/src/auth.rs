//! Session tokens and admin credentials.
//!
//! A token is `<claims>.<signature>` where `claims` is base64url (no padding) JSON
//! `{"sub", "role", "exp"}` and `signature` is hex HMAC-SHA256 over the encoded claims.
//! Tokens are scoped to one [`Role`]; a doctor token is rejected where a patient token is
//! expected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use docplus_core::credentials::{hash_password, verify_password};
use docplus_core::EmailAddress;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("not authorised, login again")]
    Missing,
    #[error("malformed session token")]
    Malformed,
    #[error("invalid session token")]
    BadSignature,
    #[error("session expired, login again")]
    Expired,
    #[error("session token is not valid for this area")]
    WrongRole,
    #[error("token service misconfigured: {0}")]
    Misconfigured(String),
}

/// Issues and verifies HMAC-signed session tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_hours: i64) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::Misconfigured("token secret must not be empty".into()));
        }
        if ttl_hours <= 0 {
            return Err(AuthError::Misconfigured("token lifetime must be positive".into()));
        }

        Ok(Self {
            secret,
            ttl: Duration::hours(ttl_hours),
        })
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Misconfigured(e.to_string()))
    }

    pub fn issue(&self, role: Role, subject: &str) -> Result<String, AuthError> {
        self.issue_at(role, subject, Utc::now())
    }

    pub fn issue_at(
        &self,
        role: Role,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            exp: (now + self.ttl).timestamp(),
        };
        let json =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Misconfigured(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    pub fn verify(&self, token: &str, expected: Role) -> Result<Claims, AuthError> {
        self.verify_at(token, expected, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        expected: Role,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        if claims.role != expected {
            return Err(AuthError::WrongRole);
        }

        Ok(claims)
    }
}

/// The single admin account, configured at startup.
///
/// Only an argon2 hash of the configured password is kept.
#[derive(Clone)]
pub struct AdminCredentials {
    email: EmailAddress,
    password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AdminCredentials {
    pub fn new(email: EmailAddress, password: String) -> Result<Self, AuthError> {
        let password_hash = hash_password(&password)
            .map_err(|e| AuthError::Misconfigured(format!("admin password: {e}")))?;
        Ok(Self {
            email,
            password_hash,
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn matches(&self, email: &str, password: &str) -> bool {
        let email_ok = EmailAddress::parse(email).is_ok_and(|email| email == self.email);
        // Always verify so a wrong email costs the same as a wrong password.
        let password_ok = verify_password(password, &self.password_hash);
        email_ok && password_ok
    }
}
