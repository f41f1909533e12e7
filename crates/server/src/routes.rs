use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use seriestrack_core::error::ApiError;
use seriestrack_core::types::{LocalLibrarySignal, MediaRecord};
use seriestrack_db::repo::series::{self, SeriesRow};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;
use crate::tracking;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/lookup", post(lookup_title))
        .route("/series", post(create_series).get(list_series))
        .route("/series/{id}", get(get_series))
        .route("/series/{id}/completion/check", post(check_completion))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TitleRequest {
    title: String,
}

#[derive(Serialize)]
struct LookupResponse {
    display_name: String,
    #[serde(flatten)]
    record: MediaRecord,
}

async fn lookup_title(
    State(state): State<AppState>,
    Json(body): Json<TitleRequest>,
) -> Result<Json<LookupResponse>, AppError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()).into());
    }
    let record = tracking::require_lookup(&state)?.resolve(title).await;

    Ok(Json(LookupResponse {
        display_name: record.display_name().to_string(),
        record,
    }))
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

async fn create_series(
    State(state): State<AppState>,
    Json(body): Json<TitleRequest>,
) -> Result<Json<SeriesRow>, AppError> {
    let row = tracking::subscribe(&state, &body.title).await?;
    Ok(Json(row))
}

async fn list_series(State(state): State<AppState>) -> Result<Json<Vec<SeriesRow>>, AppError> {
    let rows = series::list_series(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;
    Ok(Json(rows))
}

async fn load_series(state: &AppState, id: &str) -> Result<SeriesRow, AppError> {
    let row = series::get_series(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
        .ok_or_else(|| ApiError::NotFound("series not found".into()))?;
    Ok(row)
}

async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeriesRow>, AppError> {
    Ok(Json(load_series(&state, &id).await?))
}

#[derive(Deserialize, Default)]
struct CompletionCheckRequest {
    #[serde(default)]
    local_exists: bool,
    #[serde(default)]
    local_complete: bool,
}

async fn check_completion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CompletionCheckRequest>>,
) -> Result<Json<SeriesRow>, AppError> {
    let row = load_series(&state, &id).await?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let local = LocalLibrarySignal {
        exists: body.local_exists,
        is_complete: body.local_complete,
    };

    let updated = tracking::check_series(&state, &row, local).await?;
    Ok(Json(updated))
}
