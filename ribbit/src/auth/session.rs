//! JWT session tokens and the cookies that carry them.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, errors::Error, types::UserId};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,   // Subject (user ID)
    pub email: String, // User email
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

impl SessionClaims {
    pub fn new(user_id: UserId, email: &str, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.session.timeout;

        Self {
            sub: user_id,
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a JWT token for a user session
pub fn create_session_token(user_id: UserId, email: &str, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(user_id, email, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn create_session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.session;
    build_cookie(&session.cookie_name, token, session.timeout.as_secs(), config)
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn expired_session_cookie(config: &Config) -> String {
    build_cookie(&config.auth.session.cookie_name, "", 0, config)
}

fn build_cookie(name: &str, value: &str, max_age: u64, config: &Config) -> String {
    let session = &config.auth.session;
    let same_site = match session.cookie_same_site.to_lowercase().as_str() {
        "lax" => "Lax",
        "none" => "None",
        _ => "Strict",
    };
    let secure = if session.cookie_secure { "; Secure" } else { "" };

    format!("{name}={value}; Path=/; HttpOnly; SameSite={same_site}; Max-Age={max_age}{secure}")
}

/// Find the session cookie in a `Cookie` header.
pub fn find_session_cookie<'a>(cookie_header: &'a str, config: &Config) -> Option<&'a str> {
    let cookie_name = &config.auth.session.cookie_name;
    cookie_header
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name.as_str() && !value.is_empty())
        .map(|(_, value)| value)
}
