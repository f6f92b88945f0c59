use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shared::shared_wheel_game::SpinRefusal;

use crate::auth::AuthError;
use crate::store::PlayerRejection;

#[derive(Debug)]
pub enum Error {
    Validation(String),
    Conflict(String),
    Body(JsonRejection),
    Auth(AuthError),
}

/// `Json` extractor whose rejections render like every other API error.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Body(rejection)
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}

impl From<PlayerRejection> for Error {
    fn from(err: PlayerRejection) -> Self {
        match err {
            PlayerRejection::Invalid(_) => Error::Validation(err.to_string()),
            PlayerRejection::Duplicate(_) => Error::Conflict(err.to_string()),
        }
    }
}

impl From<SpinRefusal> for Error {
    fn from(refusal: SpinRefusal) -> Self {
        match refusal {
            SpinRefusal::NoPlayer => Error::Validation(refusal.message().to_string()),
            SpinRefusal::AlreadySpinning => Error::Conflict(refusal.message().to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Error::Conflict(message) => (StatusCode::CONFLICT, message),
            Error::Body(rejection) => (rejection.status(), rejection.body_text()),
            Error::Auth(e) => return e.into_response(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
