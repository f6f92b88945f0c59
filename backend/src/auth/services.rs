use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};
use shared::models::Role;
use tracing::warn;

use super::{models::Session, AuthError, SessionIssuer, SESSION_COOKIE};
use crate::config::Config;

/// Decides whether a username/password pair grants admin access.
pub trait CredentialChecker: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// The single admin account, checked against an argon2 hash.
pub struct AdminCredentials {
    username: String,
    password_hash: Option<String>,
}

impl AdminCredentials {
    pub fn from_password(username: &str, password: &str) -> Result<Self, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| AuthError::Hashing)?;

        Ok(Self {
            username: username.to_string(),
            password_hash: Some(hash.to_string()),
        })
    }

    pub fn from_hash(username: &str, hash: &str) -> Result<Self, AuthError> {
        PasswordHash::new(hash).map_err(|_| AuthError::Hashing)?;
        Ok(Self {
            username: username.to_string(),
            password_hash: Some(hash.to_string()),
        })
    }

    /// No password configured: every login attempt fails.
    pub fn disabled(username: &str) -> Self {
        Self {
            username: username.to_string(),
            password_hash: None,
        }
    }
}

impl CredentialChecker for AdminCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        if username != self.username {
            return false;
        }
        let Some(hash) = &self.password_hash else {
            return false;
        };
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

pub struct AuthService {
    checker: Box<dyn CredentialChecker>,
    issuer: SessionIssuer,
    cookie_secure: bool,
}

impl AuthService {
    pub fn new(checker: Box<dyn CredentialChecker>, issuer: SessionIssuer, cookie_secure: bool) -> Self {
        Self {
            checker,
            issuer,
            cookie_secure,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let credentials = match (&config.admin_password_hash, &config.admin_password) {
            (Some(hash), _) => AdminCredentials::from_hash(&config.admin_username, hash)?,
            (None, Some(password)) => AdminCredentials::from_password(&config.admin_username, password)?,
            (None, None) => {
                warn!("ADMIN_PASSWORD not set; admin login is disabled");
                AdminCredentials::disabled(&config.admin_username)
            }
        };

        Ok(Self::new(
            Box::new(credentials),
            SessionIssuer::new(&config.jwt_secret, config.session_duration),
            config.cookie_secure,
        ))
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(String, Session), AuthError> {
        let username = username.trim();
        if !self.checker.verify(username, password) {
            return Err(AuthError::InvalidCredentials);
        }
        self.start_session(username, Role::Admin)
    }

    pub fn guest(&self) -> Result<(String, Session), AuthError> {
        self.start_session("guest", Role::Guest)
    }

    fn start_session(&self, username: &str, role: Role) -> Result<(String, Session), AuthError> {
        let token = self.issuer.issue(username, role)?;
        Ok((
            token,
            Session {
                username: username.to_string(),
                role,
            },
        ))
    }

    pub fn validate(&self, token: &str) -> Result<Session, AuthError> {
        self.issuer.validate(token).map(Session::from)
    }

    pub fn set_session_cookie(&self, token: &str, headers: &mut HeaderMap) {
        let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
        cookie.set_http_only(true);
        cookie.set_secure(self.cookie_secure);
        cookie.set_same_site(SameSite::Strict);
        cookie.set_path("/");
        cookie.set_max_age(time::Duration::seconds(self.issuer.duration()));
        insert_cookie(headers, cookie);
    }

    pub fn clear_session_cookie(&self, headers: &mut HeaderMap) {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_http_only(true);
        cookie.set_secure(self.cookie_secure);
        cookie.set_same_site(SameSite::Strict);
        cookie.set_path("/");
        cookie.set_max_age(time::Duration::ZERO);
        insert_cookie(headers, cookie);
    }
}

fn insert_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Could not encode session cookie: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            Box::new(AdminCredentials::from_password("corze73", "test-password").unwrap()),
            SessionIssuer::new("test-secret", 3600),
            false,
        )
    }

    #[test]
    fn test_admin_login() {
        let (token, session) = service().login("corze73", "test-password").unwrap();
        assert_eq!(session.role, Role::Admin);
        assert_eq!(service_validate(&token).role, Role::Admin);
    }

    fn service_validate(token: &str) -> Session {
        AuthService::new(
            Box::new(AdminCredentials::disabled("corze73")),
            SessionIssuer::new("test-secret", 3600),
            false,
        )
        .validate(token)
        .unwrap()
    }

    #[test]
    fn test_any_other_pair_is_rejected() {
        let auth = service();
        for (user, pass) in [("corze73", "wrong"), ("admin", "test-password"), ("", "")] {
            assert!(matches!(auth.login(user, pass), Err(AuthError::InvalidCredentials)));
        }
    }

    #[test]
    fn test_guest_skips_credentials() {
        let (_, session) = service().guest().unwrap();
        assert_eq!(session.role, Role::Guest);
        assert!(!session.role.can_manage_players());
    }

    #[test]
    fn test_disabled_admin_never_logs_in() {
        let creds = AdminCredentials::disabled("corze73");
        assert!(!creds.verify("corze73", ""));
    }

    #[test]
    fn test_from_hash_accepts_phc_string() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(b"pitch-side", &salt).unwrap().to_string();
        let creds = AdminCredentials::from_hash("corze73", &hash).unwrap();
        assert!(creds.verify("corze73", "pitch-side"));
        assert!(AdminCredentials::from_hash("corze73", "plain-text").is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut headers = HeaderMap::new();
        service().set_session_cookie("abc", &mut headers);
        let value = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.starts_with("session_token=abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=3600"));
    }
}
