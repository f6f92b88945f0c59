use serde::{Deserialize, Serialize};
use shared::models::{Player, SpinResult};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row shape of the `players` table.
#[derive(Debug, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// Row shape of the `spin_results` table.
#[derive(Debug, sqlx::FromRow)]
pub struct SpinResultRow {
    pub id: Uuid,
    pub player_name: String,
    pub result: String,
    pub timestamp: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Shape of one entry under the local results key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalResultRecord {
    pub id: String,
    pub player: String,
    pub result: String,
    pub timestamp: String,
}

pub fn canonical_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.to_string())
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Self {
            id: row.id.to_string(),
            name: row.name,
            created_at: canonical_timestamp(row.created_at),
        }
    }
}

impl From<SpinResultRow> for SpinResult {
    fn from(row: SpinResultRow) -> Self {
        Self {
            id: row.id.to_string(),
            player_name: row.player_name,
            result: row.result,
            timestamp: canonical_timestamp(row.timestamp),
            created_at: canonical_timestamp(row.created_at),
        }
    }
}

impl From<LocalResultRecord> for SpinResult {
    fn from(record: LocalResultRecord) -> Self {
        Self {
            id: record.id,
            player_name: record.player,
            result: record.result,
            created_at: record.timestamp.clone(),
            timestamp: record.timestamp,
        }
    }
}

impl From<&SpinResult> for LocalResultRecord {
    fn from(result: &SpinResult) -> Self {
        Self {
            id: result.id.clone(),
            player: result.player_name.clone(),
            result: result.result.clone(),
            timestamp: result.timestamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_rows_translate_to_canonical_shape() {
        let row = SpinResultRow {
            id: Uuid::nil(),
            player_name: "Tom Davis".to_string(),
            result: "Wear shirt backwards".to_string(),
            timestamp: datetime!(2025-01-23 07:38:49 +01:00),
            created_at: datetime!(2025-01-23 06:38:50 UTC),
        };
        let result = SpinResult::from(row);
        assert_eq!(result.id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(result.player_name, "Tom Davis");
        assert_eq!(result.timestamp, "2025-01-23T06:38:49Z");
        assert_eq!(result.created_at, "2025-01-23T06:38:50Z");
    }

    #[test]
    fn test_local_record_uses_timestamp_for_created_at() {
        let record: LocalResultRecord = serde_json::from_str(
            r#"{"id":"1737614329000","player":"Chris Brown","result":"Bring snacks next session","timestamp":"2025-01-23T06:38:49.000Z"}"#,
        )
        .unwrap();
        let result = SpinResult::from(record);
        assert_eq!(result.player_name, "Chris Brown");
        assert_eq!(result.created_at, result.timestamp);
    }
}
