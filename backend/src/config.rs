use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::distributions::{Alphanumeric, DistString};
use shared::constants::DEFAULT_ADMIN_USERNAME;
use shared::shared_wheel_game::SPIN_DURATION_MS;
use tracing::{info, warn};

// Value shipped in the example .env; treated the same as no database at all.
const DATABASE_URL_PLACEHOLDER: &str = "your_neon_database_connection_string_here";
const DEFAULT_LOCAL_STORE_PATH: &str = "data/football-wheel.json";
const DEFAULT_SESSION_DURATION: i64 = 86400;
const DEFAULT_DATABASE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub database_timeout: Duration,
    pub local_store_path: Option<PathBuf>,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub admin_password_hash: Option<String>,
    pub jwt_secret: String,
    pub session_duration: i64,
    pub spin_duration: Duration,
    pub static_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR")
            .and_then(|addr| match addr.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    warn!("Ignoring invalid BIND_ADDR {}: {}", addr, e);
                    None
                }
            })
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let database_url = match var("DATABASE_URL") {
            Some(url) if url != DATABASE_URL_PLACEHOLDER => Some(url),
            _ => {
                info!("Database URL not configured. Using local storage fallback.");
                None
            }
        };

        let local_store_path = if var("DISABLE_LOCAL_STORE").as_deref() == Some("true") {
            None
        } else {
            Some(PathBuf::from(
                var("LOCAL_STORE_PATH").unwrap_or_else(|| DEFAULT_LOCAL_STORE_PATH.to_string()),
            ))
        };

        let jwt_secret = var("JWT_SECRET_KEY").unwrap_or_else(|| {
            warn!("JWT_SECRET_KEY not set; sessions will not survive a restart");
            Alphanumeric.sample_string(&mut rand::thread_rng(), 64)
        });

        let spin_duration = var("SPIN_DURATION_MS")
            .and_then(|ms| ms.parse().ok())
            .unwrap_or(SPIN_DURATION_MS);

        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://127.0.0.1:8080".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            bind_addr,
            database_url,
            database_timeout: Duration::from_millis(
                var("DATABASE_TIMEOUT_MS")
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_TIMEOUT_MS),
            ),
            local_store_path,
            admin_username: var("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password: var("ADMIN_PASSWORD"),
            admin_password_hash: var("ADMIN_PASSWORD_HASH"),
            jwt_secret,
            session_duration: var("SESSION_DURATION")
                .and_then(|d| d.parse().ok())
                .unwrap_or(DEFAULT_SESSION_DURATION),
            spin_duration: Duration::from_millis(spin_duration),
            static_dir: var("STATIC_DIR").map(PathBuf::from).unwrap_or_else(default_static_dir),
            allowed_origins,
            cookie_secure: var("COOKIE_SECURE").map(|v| v == "true").unwrap_or(true),
        }
    }
}

fn default_static_dir() -> PathBuf {
    for candidate in ["static", "backend/static", "../backend/static"] {
        if Path::new(candidate).exists() {
            if candidate != "static" {
                info!("Using alternative static path: {}", candidate);
            }
            return PathBuf::from(candidate);
        }
    }
    PathBuf::from("static")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert!(config.database_url.is_none());
        assert_eq!(config.local_store_path, Some(PathBuf::from(DEFAULT_LOCAL_STORE_PATH)));
        assert_eq!(config.admin_username, "corze73");
        assert_eq!(config.spin_duration, Duration::from_millis(4000));
        assert_eq!(config.database_timeout, Duration::from_secs(5));
        assert_eq!(config.jwt_secret.len(), 64);
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_placeholder_database_url_is_ignored() {
        let config = config_from(&[("DATABASE_URL", DATABASE_URL_PLACEHOLDER)]);
        assert!(config.database_url.is_none());

        let config = config_from(&[("DATABASE_URL", "postgres://wheel@localhost/wheel")]);
        assert_eq!(config.database_url.as_deref(), Some("postgres://wheel@localhost/wheel"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DISABLE_LOCAL_STORE", "true"),
            ("SPIN_DURATION_MS", "250"),
            ("DATABASE_TIMEOUT_MS", "100"),
            ("ALLOWED_ORIGINS", "https://wheel.example, http://localhost:5173"),
            ("COOKIE_SECURE", "false"),
        ]);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.local_store_path.is_none());
        assert_eq!(config.spin_duration, Duration::from_millis(250));
        assert_eq!(config.database_timeout, Duration::from_millis(100));
        assert_eq!(config.allowed_origins, vec!["https://wheel.example", "http://localhost:5173"]);
        assert!(!config.cookie_secure);
    }
}
