use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Claims carried by tokens from the identity provider.
///
/// Only `sub` and `exp` are required; the provider may add more, which are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: Option<String>, ttl: Duration) -> Result<Self, AuthError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or(AuthError::LifetimeOutOfRange)?;

        Ok(Self {
            sub: user_id.to_string(),
            email,
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Token lifetime is out of range")]
    LifetimeOutOfRange,

    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("Token has expired")]
    Expired,

    #[error("Could not validate credentials: {0}")]
    Invalid(String),

    #[error("Token subject is not a valid user id: {0}")]
    BadSubject(String),

    #[error("JWT generation error: {0}")]
    Signing(String),
}

/// Identity of the caller, derived from a verified token for one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AuthError::BadSubject(claims.sub.clone()))?;

        Ok(Self {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Verifies HS256 bearer tokens against the shared secret.
///
/// Pure CPU work; no I/O happens during verification.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(security: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &security.jwt_audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        AuthUser::try_from(data.claims)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header_value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader("Authorization header must use Bearer token format"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader(
            "Authorization header must use Bearer token format",
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader("Empty bearer token"));
    }

    Ok(token)
}

/// Sign a token with the shared secret. Used by the `token` command and tests.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Signing("empty secret".to_string()));
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::Signing(e.to_string()))
}
