use async_trait::async_trait;
use shared::models::{Player, SpinResult};
use tokio::sync::Mutex;

use super::{local_id, now_timestamp, Backend, StoreResult, Tier};

#[derive(Default)]
struct MemoryState {
    players: Vec<Player>,
    results: Vec<SpinResult>,
    sound_enabled: Option<bool>,
}

/// Last tier of the chain. Never fails; everything is gone on restart.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn tier(&self) -> Tier {
        Tier::Memory
    }

    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        Ok(self.state.lock().await.players.clone())
    }

    async fn insert_player(&self, name: &str) -> StoreResult<Player> {
        let player = Player {
            id: local_id("mem"),
            name: name.to_string(),
            created_at: now_timestamp(),
        };
        self.state.lock().await.players.push(player.clone());
        Ok(player)
    }

    async fn delete_player(&self, player: &Player) -> StoreResult<()> {
        self.state.lock().await.players.retain(|p| p.id != player.id);
        Ok(())
    }

    async fn list_results(&self) -> StoreResult<Vec<SpinResult>> {
        Ok(self.state.lock().await.results.clone())
    }

    async fn insert_result(&self, player_name: &str, result: &str) -> StoreResult<SpinResult> {
        let timestamp = now_timestamp();
        let spin = SpinResult {
            id: local_id("mem"),
            player_name: player_name.to_string(),
            result: result.to_string(),
            timestamp: timestamp.clone(),
            created_at: timestamp,
        };
        self.state.lock().await.results.insert(0, spin.clone());
        Ok(spin)
    }

    async fn clear_results(&self) -> StoreResult<()> {
        self.state.lock().await.results.clear();
        Ok(())
    }

    async fn load_sound_enabled(&self) -> StoreResult<Option<bool>> {
        Ok(self.state.lock().await.sound_enabled)
    }

    async fn save_sound_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.state.lock().await.sound_enabled = Some(enabled);
        Ok(())
    }
}
