use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use shared::models::{LoginRequest, SessionInfo, SessionResponse};
use tracing::{info, warn};

use super::{middleware::Session, AuthError};
use crate::error::{Error, JsonBody};
use crate::AppState;

fn session_response(token: String, session: &Session) -> SessionResponse {
    SessionResponse {
        token,
        role: session.role,
        mode: session.role.mode_label().to_string(),
    }
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<LoginRequest>,
) -> Result<(HeaderMap, Json<SessionResponse>), Error> {
    let (token, session) = match state.auth.login(&credentials.username, &credentials.password) {
        Ok(issued) => issued,
        Err(e) => {
            warn!(
                event = "login_failed",
                username = %credentials.username,
                "Login failed for {}", credentials.username
            );
            return Err(e.into());
        }
    };

    info!(
        event = "login",
        username = %session.username,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        "🔑 Admin logged in: {}", session.username
    );

    let mut headers = HeaderMap::new();
    state.auth.set_session_cookie(&token, &mut headers);
    Ok((headers, Json(session_response(token, &session))))
}

pub async fn guest(State(state): State<AppState>) -> Result<(HeaderMap, Json<SessionResponse>), AuthError> {
    let (token, session) = state.auth.guest()?;
    info!("Guest session started");

    let mut headers = HeaderMap::new();
    state.auth.set_session_cookie(&token, &mut headers);
    Ok((headers, Json(session_response(token, &session))))
}

pub async fn logout(State(state): State<AppState>) -> (StatusCode, HeaderMap) {
    let mut headers = HeaderMap::new();
    state.auth.clear_session_cookie(&mut headers);
    (StatusCode::NO_CONTENT, headers)
}

pub async fn session(session: Session) -> Json<SessionInfo> {
    Json(SessionInfo {
        mode: session.role.mode_label().to_string(),
        username: session.username,
        role: session.role,
    })
}
