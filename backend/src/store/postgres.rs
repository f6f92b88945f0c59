use std::time::Duration;

use async_trait::async_trait;
use shared::constants::RECENT_RESULTS_LIMIT;
use shared::models::{Player, SpinResult};
use sqlx::postgres::{PgPool, PgPoolOptions};
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use super::{Backend, StoreError, StoreResult, Tier};
use crate::models::{PlayerRow, SpinResultRow};

/// Hosted relational store. Ids and timestamps are assigned by the database.
///
/// The pool connects on demand, so an unreachable database at startup only
/// fails the calls made while it is down. Migrations run before the first
/// query that reaches the database and are retried until they succeed.
pub struct PostgresBackend {
    pool: PgPool,
    schema: OnceCell<()>,
}

impl PostgresBackend {
    /// Fails only when `database_url` cannot be parsed.
    pub fn connect_lazy(database_url: &str, acquire_timeout: Duration) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    async fn ready(&self) -> StoreResult<&PgPool> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::migrate!("./migrations").run(&self.pool).await?;
                info!("Connected to remote database");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(&self.pool)
    }
}

fn parse_id(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[async_trait]
impl Backend for PostgresBackend {
    fn tier(&self) -> Tier {
        Tier::Remote
    }

    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        let rows = sqlx::query_as::<_, PlayerRow>(
            "SELECT id, name, created_at FROM players ORDER BY name",
        )
        .fetch_all(self.ready().await?)
        .await?;

        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn insert_player(&self, name: &str) -> StoreResult<Player> {
        let row = sqlx::query_as::<_, PlayerRow>(
            "INSERT INTO players (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(self.ready().await?)
        .await?;

        Ok(row.into())
    }

    async fn delete_player(&self, player: &Player) -> StoreResult<()> {
        let id = parse_id(&player.id)?;
        sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id)
            .execute(self.ready().await?)
            .await?;
        Ok(())
    }

    async fn list_results(&self) -> StoreResult<Vec<SpinResult>> {
        let rows = sqlx::query_as::<_, SpinResultRow>(
            r#"
            SELECT id, player_name, result, timestamp, created_at
            FROM spin_results
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(RECENT_RESULTS_LIMIT as i64)
        .fetch_all(self.ready().await?)
        .await?;

        Ok(rows.into_iter().map(SpinResult::from).collect())
    }

    async fn insert_result(&self, player_name: &str, result: &str) -> StoreResult<SpinResult> {
        let row = sqlx::query_as::<_, SpinResultRow>(
            r#"
            INSERT INTO spin_results (player_name, result, timestamp)
            VALUES ($1, $2, $3)
            RETURNING id, player_name, result, timestamp, created_at
            "#,
        )
        .bind(player_name)
        .bind(result)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.ready().await?)
        .await?;

        Ok(row.into())
    }

    async fn clear_results(&self) -> StoreResult<()> {
        let deleted = sqlx::query("DELETE FROM spin_results")
            .execute(self.ready().await?)
            .await?;
        info!("Cleared {} spin results", deleted.rows_affected());
        Ok(())
    }
}
