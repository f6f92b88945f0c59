//! Persistence for players, spin results and the sound setting.
//!
//! Storage is an ordered list of [`Backend`]s: the hosted database when one is
//! configured, then the local key/value file, then process memory. Every
//! operation walks the list and stops at the first backend that succeeds, so
//! a broken database or an unwritable disk only ever costs durability.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::SecondsFormat;
use shared::models::{Player, SpinResult};

mod gateway;
mod local;
mod memory;
mod postgres;

pub use gateway::{PersistenceGateway, PlayerRejection};
pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed stored data: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("{0} storage does not keep settings")]
    Unsupported(Tier),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Remote,
    Local,
    Memory,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Remote => "remote",
            Tier::Local => "local",
            Tier::Memory => "memory",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The capability set every storage tier provides.
#[async_trait]
pub trait Backend: Send + Sync {
    fn tier(&self) -> Tier;

    async fn list_players(&self) -> StoreResult<Vec<Player>>;
    async fn insert_player(&self, name: &str) -> StoreResult<Player>;
    async fn delete_player(&self, player: &Player) -> StoreResult<()>;

    /// Most recent first.
    async fn list_results(&self) -> StoreResult<Vec<SpinResult>>;
    async fn insert_result(&self, player_name: &str, result: &str) -> StoreResult<SpinResult>;
    async fn clear_results(&self) -> StoreResult<()>;

    async fn load_sound_enabled(&self) -> StoreResult<Option<bool>> {
        Err(StoreError::Unsupported(self.tier()))
    }

    async fn save_sound_enabled(&self, _enabled: bool) -> StoreResult<()> {
        Err(StoreError::Unsupported(self.tier()))
    }
}

static LAST_LOCAL_ID: AtomicI64 = AtomicI64::new(0);

/// Clock based identifier for records no database has numbered. Strictly
/// increasing within the process so two records created in the same
/// millisecond still differ.
pub(crate) fn local_id(prefix: &str) -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let previous = LAST_LOCAL_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or_else(|last| last);
    format!("{}-{}", prefix, now.max(previous + 1))
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_local_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| local_id("local")).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("local-")));
    }

    #[test]
    fn test_timestamps_are_rfc3339_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
