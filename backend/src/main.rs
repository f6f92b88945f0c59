use std::sync::Arc;

use axum::http::header::HeaderName;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use shared::constants::APP_TITLE;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::assets::AssetCache;
use crate::auth::middleware::require_session;
use crate::auth::AuthService;
use crate::config::Config;
use crate::games::backend_wheel_game::{create_router as create_wheel_game_router, record_results, WheelSpinner};
use crate::store::PersistenceGateway;

mod assets;
mod auth;
mod config;
mod error;
mod games;
mod handlers;
mod logging;
mod models;
mod store;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<PersistenceGateway>,
    pub spinner: Arc<WheelSpinner>,
    pub auth: Arc<AuthService>,
    pub assets: Arc<AssetCache>,
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::OPTIONS, Method::DELETE])
        .allow_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::routes::login))
        .route("/guest", post(auth::routes::guest))
        .route("/logout", post(auth::routes::logout));

    let protected_routes = Router::new()
        .route("/api/auth/session", get(auth::routes::session))
        .route("/api/players", get(handlers::list_players).post(handlers::add_player))
        .route("/api/players/:id", delete(handlers::remove_player))
        .route("/api/results", get(handlers::list_results).delete(handlers::clear_results))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/settings/sound", get(handlers::get_sound).put(handlers::put_sound))
        .nest("/wheel", create_wheel_game_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/api/health_check", get(health_check))
        .nest("/api/auth", auth_routes)
        .merge(protected_routes)
        .fallback(assets::serve_asset)
        .layer(cors_layer(config))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup();

    let config = Config::from_env();
    info!("🎡 Starting {}", APP_TITLE);

    let gateway = Arc::new(PersistenceGateway::connect(&config).await);
    let spinner = Arc::new(WheelSpinner::new(config.spin_duration, record_results(gateway.clone())));
    let auth = Arc::new(AuthService::from_config(&config)?);
    let assets = Arc::new(AssetCache::install(&config.static_dir).await);

    let state = AppState {
        gateway,
        spinner,
        auth,
        assets,
    };
    let app = build_router(state, &config);

    info!("listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
