use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use shared::constants::{DEFAULT_PLAYERS, PLAYERS_STORAGE_KEY, RESULTS_STORAGE_KEY, SOUND_STORAGE_KEY};
use shared::models::{Player, SpinResult};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{local_id, now_timestamp, Backend, StoreResult, Tier};
use crate::models::LocalResultRecord;

/// Durable key/value store kept in a single JSON file on disk.
///
/// Each key holds the same value the browser build kept in local storage:
/// the ordered list of player names, the ordered list of result records and
/// the sound flag. Every change rewrites the whole file.
pub struct LocalBackend {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl LocalBackend {
    /// Opens the store, creating it with the default squad on first use. The
    /// file is written once here so an unwritable location fails now rather
    /// than on the first change.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating local store at {}", path.display());
                let mut entries = Map::new();
                entries.insert(PLAYERS_STORAGE_KEY.to_string(), serde_json::to_value(DEFAULT_PLAYERS)?);
                entries
            }
            Err(e) => return Err(e.into()),
        };

        write_entries(&path, &entries).await?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Reads `key`, lets `change` edit it and writes the file. Memory is only
    /// updated once the file write has succeeded.
    async fn update<T, R>(&self, key: &str, change: impl FnOnce(&mut T) -> R) -> StoreResult<R>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let mut entries = self.entries.lock().await;
        let mut value: T = match entries.get(key) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => T::default(),
        };
        let outcome = change(&mut value);

        let mut next = entries.clone();
        next.insert(key.to_string(), serde_json::to_value(&value)?);
        write_entries(&self.path, &next).await?;
        *entries = next;
        debug!("Local store key {} rewritten", key);
        Ok(outcome)
    }
}

/// Names are unique and the stored list holds nothing else, so the name is
/// the only identity that survives a reload.
fn player_id(name: &str) -> String {
    format!("local-{}", name)
}

async fn write_entries(path: &Path, entries: &Map<String, Value>) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let contents = serde_json::to_vec_pretty(entries)?;
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, contents).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

#[async_trait]
impl Backend for LocalBackend {
    fn tier(&self) -> Tier {
        Tier::Local
    }

    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        let names: Vec<String> = self.get(PLAYERS_STORAGE_KEY).await?.unwrap_or_default();
        let created_at = now_timestamp();
        Ok(names
            .into_iter()
            .map(|name| Player {
                id: player_id(&name),
                name,
                created_at: created_at.clone(),
            })
            .collect())
    }

    async fn insert_player(&self, name: &str) -> StoreResult<Player> {
        self.update(PLAYERS_STORAGE_KEY, |names: &mut Vec<String>| {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        })
        .await?;

        Ok(Player {
            id: player_id(name),
            name: name.to_string(),
            created_at: now_timestamp(),
        })
    }

    async fn delete_player(&self, player: &Player) -> StoreResult<()> {
        self.update(PLAYERS_STORAGE_KEY, |names: &mut Vec<String>| {
            names.retain(|n| n != &player.name);
        })
        .await
    }

    async fn list_results(&self) -> StoreResult<Vec<SpinResult>> {
        let records: Vec<LocalResultRecord> = self.get(RESULTS_STORAGE_KEY).await?.unwrap_or_default();
        Ok(records.into_iter().map(SpinResult::from).collect())
    }

    async fn insert_result(&self, player_name: &str, result: &str) -> StoreResult<SpinResult> {
        let timestamp = now_timestamp();
        let spin = SpinResult {
            id: local_id("local"),
            player_name: player_name.to_string(),
            result: result.to_string(),
            timestamp: timestamp.clone(),
            created_at: timestamp,
        };

        self.update(RESULTS_STORAGE_KEY, |records: &mut Vec<LocalResultRecord>| {
            records.insert(0, LocalResultRecord::from(&spin));
        })
        .await?;

        Ok(spin)
    }

    async fn clear_results(&self) -> StoreResult<()> {
        self.update(RESULTS_STORAGE_KEY, |records: &mut Vec<LocalResultRecord>| records.clear())
            .await
    }

    async fn load_sound_enabled(&self) -> StoreResult<Option<bool>> {
        self.get(SOUND_STORAGE_KEY).await
    }

    async fn save_sound_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.update(SOUND_STORAGE_KEY, |flag: &mut bool| *flag = enabled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_open_seeds_default_squad() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("wheel.json")).await.unwrap();

        let names: Vec<String> = backend.list_players().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, DEFAULT_PLAYERS.to_vec());
        assert!(backend.list_results().await.unwrap().is_empty());
        assert_eq!(backend.load_sound_enabled().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_changes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wheel.json");

        let backend = LocalBackend::open(&path).await.unwrap();
        backend.insert_player("Sam Kerr").await.unwrap();
        let tom = backend
            .list_players()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == "Tom Davis")
            .unwrap();
        backend.delete_player(&tom).await.unwrap();
        backend.insert_result("Sam Kerr", "Wear shirt backwards").await.unwrap();
        backend.insert_result("Chris Brown", "Bring snacks next session").await.unwrap();
        backend.save_sound_enabled(false).await.unwrap();
        drop(backend);

        let reopened = LocalBackend::open(&path).await.unwrap();
        let names: Vec<String> = reopened.list_players().await.unwrap().into_iter().map(|p| p.name).collect();
        assert!(names.contains(&"Sam Kerr".to_string()));
        assert!(!names.contains(&"Tom Davis".to_string()));

        let results = reopened.list_results().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].player_name, "Chris Brown");
        assert_eq!(results[1].result, "Wear shirt backwards");
        assert_eq!(reopened.load_sound_enabled().await.unwrap(), Some(false));

        reopened.clear_results().await.unwrap();
        assert!(reopened.list_results().await.unwrap().is_empty());
        assert_eq!(reopened.list_players().await.unwrap().len(), names.len());
    }

    #[tokio::test]
    async fn test_player_ids_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wheel.json");
        let backend = LocalBackend::open(&path).await.unwrap();

        let sam = backend.insert_player("Sam Kerr").await.unwrap();
        let listed = backend.list_players().await.unwrap();
        assert!(listed.iter().any(|p| p.id == sam.id && p.name == "Sam Kerr"));

        let tom = listed.iter().find(|p| p.name == "Tom Davis").unwrap().clone();
        backend.delete_player(&tom).await.unwrap();
        drop(backend);

        let reopened = LocalBackend::open(&path).await.unwrap();
        let sam_again = reopened
            .list_players()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == "Sam Kerr")
            .unwrap();
        assert_eq!(sam_again.id, sam.id);
    }

    #[tokio::test]
    async fn test_file_uses_browser_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wheel.json");
        let backend = LocalBackend::open(&path).await.unwrap();
        backend.insert_result("Tom Davis", "Take warm-up next game").await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw[PLAYERS_STORAGE_KEY].is_array());
        assert_eq!(raw[RESULTS_STORAGE_KEY][0]["player"], "Tom Davis");
        assert_eq!(raw[RESULTS_STORAGE_KEY][0]["result"], "Take warm-up next game");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wheel.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(LocalBackend::open(&path).await.is_err());
    }
}
