use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use rand::rngs::OsRng;
use rand::Rng;
use shared::shared_wheel_game::*;
use tracing::{info, warn};

use crate::auth::middleware::Session;
use crate::error::{Error, JsonBody};
use crate::store::PersistenceGateway;
use crate::AppState;

/// Invoked exactly once per spin, after the animation delay.
pub type SpinCallback = Arc<dyn Fn(WheelResult) -> BoxFuture<'static, ()> + Send + Sync>;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/options", get(get_wheel_options))
        .route("/spin", post(spin_wheel))
        .route("/status", get(get_wheel_status))
}

/// Completion callback that files each result with the gateway.
pub fn record_results(gateway: Arc<PersistenceGateway>) -> SpinCallback {
    Arc::new(move |result: WheelResult| {
        let gateway = gateway.clone();
        async move {
            gateway.add_result(&result.player, &result.text).await;
        }
        .boxed()
    })
}

/// Runs the `Idle -> Spinning -> Idle` cycle. The outcome is fixed by the draw
/// made when the spin starts and revealed once the animation delay elapses.
pub struct WheelSpinner {
    game: Arc<Mutex<WheelGame>>,
    geometry: WheelGeometry,
    duration: Duration,
    on_complete: SpinCallback,
}

fn lock(game: &Mutex<WheelGame>) -> MutexGuard<'_, WheelGame> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WheelSpinner {
    pub fn new(duration: Duration, on_complete: SpinCallback) -> Self {
        Self {
            game: Arc::new(Mutex::new(WheelGame::new())),
            geometry: WheelGeometry::default(),
            duration,
            on_complete,
        }
    }

    pub fn geometry(&self) -> WheelGeometry {
        self.geometry
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn status(&self) -> WheelStatusResponse {
        let game = lock(&self.game);
        WheelStatusResponse {
            is_spinning: game.is_spinning(),
            player: game.player.clone(),
            last_result: game.last_result.clone(),
        }
    }

    pub fn spin(&self, player: &str) -> Result<SpinPlan, SpinRefusal> {
        self.spin_with(player, &mut OsRng)
    }

    /// Starts a spin and schedules its completion on the runtime.
    pub fn spin_with<R: Rng + ?Sized>(&self, player: &str, rng: &mut R) -> Result<SpinPlan, SpinRefusal> {
        let plan = lock(&self.game).start_spin(player, &self.geometry, rng)?;

        let game = self.game.clone();
        let geometry = self.geometry;
        let duration = self.duration;
        let on_complete = self.on_complete.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            let result = lock(&game).resolve_spin(&geometry, &WHEEL_OPTIONS);
            match &result {
                Some(result) => {
                    info!("🎡 WHEEL SPIN: {}", result.message);
                    on_complete(result.clone()).await;
                }
                None => warn!("Spin finished without a result"),
            }
            lock(&game).finish_spin(result);
        });

        Ok(plan)
    }
}

async fn get_wheel_options(State(state): State<AppState>, _session: Session) -> Json<WheelOptionsResponse> {
    Json(WheelOptionsResponse {
        options: WHEEL_OPTIONS.iter().map(WheelOptionView::from).collect(),
        geometry: state.spinner.geometry(),
        duration_ms: state.spinner.duration().as_millis() as u64,
    })
}

async fn spin_wheel(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<SpinRequest>,
) -> Result<Json<SpinResponse>, Error> {
    let plan = state.spinner.spin(&request.player)?;
    info!(
        "{} started a spin for {} (cycles={}, offset={:.1})",
        session.username,
        request.player.trim(),
        plan.full_cycles,
        plan.offset
    );

    Ok(Json(SpinResponse {
        player: request.player.trim().to_string(),
        plan,
        duration_ms: state.spinner.duration().as_millis() as u64,
    }))
}

async fn get_wheel_status(State(state): State<AppState>, _session: Session) -> Json<WheelStatusResponse> {
    Json(state.spinner.status())
}
