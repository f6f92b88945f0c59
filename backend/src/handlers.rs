use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use shared::models::{AddPlayerRequest, Player, ResultsQuery, SoundSetting, SpinResult, StorageSummary};
use shared::validation::error_message;
use tracing::{debug, info};
use validator::Validate;

use crate::auth::middleware::Session;
use crate::error::{Error, JsonBody};
use crate::AppState;

pub async fn list_players(State(state): State<AppState>, _session: Session) -> Json<Vec<Player>> {
    Json(state.gateway.list_players())
}

pub async fn add_player(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<AddPlayerRequest>,
) -> Result<(StatusCode, Json<Player>), Error> {
    session.require_admin()?;
    request.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .get("name")
            .and_then(|e| e.first())
            .map(error_message)
            .unwrap_or_else(|| errors.to_string());
        Error::Validation(message)
    })?;

    let player = state.gateway.add_player(&request.name).await?;
    info!("👤 {} added player {}", session.username, player.name);
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn remove_player(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    session.require_admin()?;

    match state.gateway.remove_player(&id).await {
        Some(player) => info!("👤 {} removed player {}", session.username, player.name),
        None => debug!("Remove ignored, no player with id {}", id),
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_results(
    State(state): State<AppState>,
    _session: Session,
    Query(query): Query<ResultsQuery>,
) -> Json<Vec<SpinResult>> {
    let mut results = state.gateway.list_results();
    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    Json(results)
}

pub async fn clear_results(State(state): State<AppState>, session: Session) -> StatusCode {
    state.gateway.clear_results().await;
    info!("🧹 {} cleared the result history", session.username);
    StatusCode::NO_CONTENT
}

pub async fn refresh(State(state): State<AppState>, _session: Session) -> Json<StorageSummary> {
    state.gateway.refresh().await;
    Json(StorageSummary {
        tiers: state.gateway.tier_names(),
        players: state.gateway.list_players().len(),
        results: state.gateway.list_results().len(),
    })
}

pub async fn get_sound(State(state): State<AppState>, _session: Session) -> Json<SoundSetting> {
    Json(SoundSetting {
        enabled: state.gateway.sound_enabled(),
    })
}

pub async fn put_sound(
    State(state): State<AppState>,
    _session: Session,
    JsonBody(setting): JsonBody<SoundSetting>,
) -> Json<SoundSetting> {
    state.gateway.set_sound_enabled(setting.enabled).await;
    Json(setting)
}
