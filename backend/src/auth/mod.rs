use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use shared::constants::{ADMIN_ONLY_ERROR, INVALID_CREDENTIALS_ERROR};
use shared::models::Role;
use std::fmt;

pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use services::*;

use models::Claims;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    InvalidToken,
    TokenExpired,
    InvalidSignature,
    Forbidden,
    Hashing,
    JWT(jsonwebtoken::errors::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::InvalidToken => write!(f, "Invalid token"),
            Self::TokenExpired => write!(f, "Token expired"),
            Self::InvalidSignature => write!(f, "Invalid signature"),
            Self::Forbidden => write!(f, "Admin role required"),
            Self::Hashing => write!(f, "Password hashing failed"),
            Self::JWT(e) => write!(f, "JWT error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JWT(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::JWT(err)
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::InvalidToken | Self::TokenExpired | Self::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Hashing | Self::JWT(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => INVALID_CREDENTIALS_ERROR,
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Token has expired",
            Self::InvalidSignature => "Invalid signature",
            Self::Forbidden => ADMIN_ONLY_ERROR,
            Self::Hashing => "Authentication error",
            Self::JWT(_) => "Token creation failed",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Signs and checks session tokens with a single HS256 secret.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    duration: i64,
}

impl SessionIssuer {
    pub fn new(secret: &str, duration: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            duration,
        }
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn issue(&self, username: &str, role: Role) -> Result<String, AuthError> {
        let exp = chrono::Utc::now().timestamp() + self.duration;
        let claims = Claims {
            sub: username.to_string(),
            role,
            exp: exp.max(0) as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_round_trips_role() {
        let issuer = SessionIssuer::new("test-secret", 3600);
        let token = issuer.issue("corze73", Role::Admin).unwrap();
        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.sub, "corze73");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let token = SessionIssuer::new("one", 3600).issue("guest", Role::Guest).unwrap();
        assert!(matches!(
            SessionIssuer::new("two", 3600).validate(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = SessionIssuer::new("test-secret", -3600);
        let token = issuer.issue("guest", Role::Guest).unwrap();
        assert!(matches!(issuer.validate(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let issuer = SessionIssuer::new("test-secret", 3600);
        assert!(matches!(issuer.validate("not-a-token"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidCredentials.message(), "Invalid credentials");
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
    }
}
