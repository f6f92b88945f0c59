use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::constants::DUPLICATE_PLAYER_ERROR;
use shared::models::{Player, SpinResult};
use shared::validation::{error_message, validate_player_name};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    local_id, now_timestamp, Backend, LocalBackend, MemoryBackend, PostgresBackend, StoreError, Tier,
};
use crate::config::Config;

const DEFAULT_SOUND_ENABLED: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerRejection {
    Invalid(String),
    Duplicate(String),
}

impl fmt::Display for PlayerRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(message) => f.write_str(message),
            Self::Duplicate(_) => f.write_str(DUPLICATE_PLAYER_ERROR),
        }
    }
}

impl std::error::Error for PlayerRejection {}

struct Mirror {
    players: Vec<Player>,
    results: Vec<SpinResult>,
    sound_enabled: bool,
}

/// Front door to storage.
///
/// Reads are answered from the in-memory mirror without touching a backend.
/// Writes go to the first tier that accepts them and then update the mirror;
/// backend failures are logged and never reach the caller.
pub struct PersistenceGateway {
    tiers: Vec<Arc<dyn Backend>>,
    mirror: RwLock<Mirror>,
    mutation: Mutex<()>,
}

impl PersistenceGateway {
    /// Builds a gateway over `tiers`, strongest first. A memory tier is
    /// appended when the list does not already end in one.
    pub fn new(mut tiers: Vec<Arc<dyn Backend>>) -> Self {
        if tiers.last().map(|t| t.tier()) != Some(Tier::Memory) {
            tiers.push(Arc::new(MemoryBackend::new()));
        }

        Self {
            tiers,
            mirror: RwLock::new(Mirror {
                players: Vec::new(),
                results: Vec::new(),
                sound_enabled: DEFAULT_SOUND_ENABLED,
            }),
            mutation: Mutex::new(()),
        }
    }

    /// Installs whichever tiers the configuration allows and loads the mirror.
    pub async fn connect(config: &Config) -> Self {
        let mut tiers: Vec<Arc<dyn Backend>> = Vec::new();

        if let Some(url) = &config.database_url {
            match PostgresBackend::connect_lazy(url, config.database_timeout) {
                Ok(backend) => tiers.push(Arc::new(backend)),
                Err(e) => warn!("Failed to initialize database connection: {}", e),
            }
        }

        if let Some(path) = &config.local_store_path {
            match LocalBackend::open(path).await {
                Ok(backend) => {
                    info!("Using local store at {}", backend.path().display());
                    tiers.push(Arc::new(backend));
                }
                Err(e) => warn!("Local store unavailable at {}: {}", path.display(), e),
            }
        }

        let gateway = Self::new(tiers);
        info!("Storage tiers: {}", gateway.tier_names().join(" -> "));
        gateway.refresh().await;
        gateway
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.tiers.iter().map(|t| t.tier()).collect()
    }

    pub fn tier_names(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.tier().to_string()).collect()
    }

    fn read_mirror(&self) -> RwLockReadGuard<'_, Mirror> {
        self.mirror.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_mirror(&self) -> RwLockWriteGuard<'_, Mirror> {
        self.mirror.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list_players(&self) -> Vec<Player> {
        self.read_mirror().players.clone()
    }

    pub fn list_results(&self) -> Vec<SpinResult> {
        self.read_mirror().results.clone()
    }

    pub fn sound_enabled(&self) -> bool {
        self.read_mirror().sound_enabled
    }

    /// Rebuilds the mirror from the strongest tier that answers.
    pub async fn refresh(&self) {
        let _guard = self.mutation.lock().await;

        let players = self.load_players().await;
        let results = self.load_results().await;
        let sound_enabled = self.load_sound_enabled().await;
        info!("Loaded {} players and {} results", players.len(), results.len());

        let mut mirror = self.write_mirror();
        mirror.players = players;
        mirror.results = results;
        mirror.sound_enabled = sound_enabled;
    }

    async fn load_players(&self) -> Vec<Player> {
        for backend in &self.tiers {
            match backend.list_players().await {
                Ok(players) => {
                    debug!("Players loaded from {} storage", backend.tier());
                    return players;
                }
                Err(e) => warn!("Error loading players from {} storage: {}", backend.tier(), e),
            }
        }
        Vec::new()
    }

    async fn load_results(&self) -> Vec<SpinResult> {
        for backend in &self.tiers {
            match backend.list_results().await {
                Ok(results) => {
                    debug!("Results loaded from {} storage", backend.tier());
                    return results;
                }
                Err(e) => warn!("Error loading results from {} storage: {}", backend.tier(), e),
            }
        }
        Vec::new()
    }

    async fn load_sound_enabled(&self) -> bool {
        for backend in &self.tiers {
            match backend.load_sound_enabled().await {
                Ok(enabled) => return enabled.unwrap_or(DEFAULT_SOUND_ENABLED),
                Err(StoreError::Unsupported(_)) => continue,
                Err(e) => warn!("Error loading sound setting from {} storage: {}", backend.tier(), e),
            }
        }
        DEFAULT_SOUND_ENABLED
    }

    /// Adds a player unless the name is invalid or already taken.
    pub async fn add_player(&self, name: &str) -> Result<Player, PlayerRejection> {
        validate_player_name(name).map_err(|e| PlayerRejection::Invalid(error_message(&e)))?;
        let name = name.trim();

        let _guard = self.mutation.lock().await;
        let taken = self.read_mirror().players.iter().any(|p| p.name == name);
        if taken {
            return Err(PlayerRejection::Duplicate(name.to_string()));
        }

        let mut stored = None;
        for backend in &self.tiers {
            match backend.insert_player(name).await {
                Ok(player) => {
                    info!("Added player {} to {} storage", player.name, backend.tier());
                    stored = Some(player);
                    break;
                }
                Err(e) => warn!("Error adding player to {} storage: {}", backend.tier(), e),
            }
        }
        let player = stored.unwrap_or_else(|| Player {
            id: local_id("mem"),
            name: name.to_string(),
            created_at: now_timestamp(),
        });

        self.write_mirror().players.push(player.clone());
        Ok(player)
    }

    /// Removes the player with `id`. Unknown ids are ignored.
    pub async fn remove_player(&self, id: &str) -> Option<Player> {
        let _guard = self.mutation.lock().await;
        let player = self.read_mirror().players.iter().find(|p| p.id == id).cloned()?;

        for backend in &self.tiers {
            match backend.delete_player(&player).await {
                Ok(()) => {
                    info!("Removed player {} from {} storage", player.name, backend.tier());
                    break;
                }
                Err(e) => warn!("Error removing player from {} storage: {}", backend.tier(), e),
            }
        }

        self.write_mirror().players.retain(|p| p.id != player.id);
        Some(player)
    }

    /// Records a completed spin at the head of the history.
    pub async fn add_result(&self, player_name: &str, result: &str) -> SpinResult {
        let _guard = self.mutation.lock().await;

        let mut stored = None;
        for backend in &self.tiers {
            match backend.insert_result(player_name, result).await {
                Ok(spin) => {
                    debug!("Spin result stored in {} storage", backend.tier());
                    stored = Some(spin);
                    break;
                }
                Err(e) => warn!("Error adding result to {} storage: {}", backend.tier(), e),
            }
        }
        let spin = stored.unwrap_or_else(|| {
            let timestamp = now_timestamp();
            SpinResult {
                id: local_id("mem"),
                player_name: player_name.to_string(),
                result: result.to_string(),
                timestamp: timestamp.clone(),
                created_at: timestamp,
            }
        });

        self.write_mirror().results.insert(0, spin.clone());
        spin
    }

    pub async fn clear_results(&self) {
        let _guard = self.mutation.lock().await;

        for backend in &self.tiers {
            match backend.clear_results().await {
                Ok(()) => {
                    info!("Cleared results in {} storage", backend.tier());
                    break;
                }
                Err(e) => warn!("Error clearing results in {} storage: {}", backend.tier(), e),
            }
        }

        self.write_mirror().results.clear();
    }

    pub async fn set_sound_enabled(&self, enabled: bool) {
        let _guard = self.mutation.lock().await;

        for backend in &self.tiers {
            match backend.save_sound_enabled(enabled).await {
                Ok(()) => break,
                Err(StoreError::Unsupported(_)) => continue,
                Err(e) => warn!("Error saving sound setting to {} storage: {}", backend.tier(), e),
            }
        }

        self.write_mirror().sound_enabled = enabled;
    }
}
