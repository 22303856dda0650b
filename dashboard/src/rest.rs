use crate::metrics::gather_metrics;
use crate::projection::DashboardView;
use crate::state::Snapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::watch;
use tracing::error;

#[derive(Debug, Clone)]
struct AppState {
    snapshots: watch::Receiver<Snapshot>,
}

pub fn create_router(snapshots: watch::Receiver<Snapshot>) -> Router {
    let state = AppState { snapshots };

    Router::new()
        .route("/api/v1/dashboard", get(get_dashboard))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    let snapshot = state.snapshots.borrow().clone();
    Json(DashboardView::project(&snapshot))
}

async fn get_metrics() -> Result<String, AppError> {
    Ok(gather_metrics()?)
}

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("API error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
