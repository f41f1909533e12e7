//! Series subscriptions: resolve titles into rows and keep their completion
//! status current.

use seriestrack_core::error::ApiError;
use seriestrack_core::types::{CompletionVerdict, LocalLibrarySignal, MediaKind, MediaRecord};
use seriestrack_db::repo::series::{self, NewSeries, SeriesRow};
use seriestrack_metadata::lookup::Lookup;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn require_lookup(state: &AppState) -> Result<&Lookup, AppError> {
    state.lookup.as_ref().ok_or_else(|| {
        ApiError::Upstream(
            "metadata provider not configured; set SERIESTRACK_TMDB_KEY".into(),
        )
        .into()
    })
}

fn db_err(e: sqlx::Error) -> AppError {
    ApiError::Internal(format!("db error: {e}")).into()
}

/// A concurrent subscribe can win the race past the duplicate check; the
/// unique index then rejects this insert.
fn insert_err(e: sqlx::Error, tmdb_id: i64) -> AppError {
    if series::is_unique_violation(&e) {
        return ApiError::Conflict(format!("already subscribed (tmdb id {tmdb_id})")).into();
    }
    db_err(e)
}

/// Resolve `title` and store it as a new subscription.
pub async fn subscribe(state: &AppState, title: &str) -> Result<SeriesRow, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()).into());
    }
    let lookup = require_lookup(state)?;
    let record = lookup.resolve(title).await;

    let tmdb_id = i64::try_from(record.external_id)
        .map_err(|_| ApiError::Internal("provider id out of range".into()))?;
    if let Some(existing) = series::find_by_tmdb_id(&state.db, tmdb_id)
        .await
        .map_err(db_err)?
    {
        return Err(ApiError::Conflict(format!(
            "already subscribed as {} ({})",
            existing.name, existing.id
        ))
        .into());
    }

    let row = series::create_series(
        &state.db,
        &NewSeries {
            title,
            name: record.display_name(),
            native_name: record.native_name.as_deref(),
            tmdb_id,
            media_kind: record.media_kind.as_str(),
            year: record.year.map(i64::from),
        },
    )
    .await
    .map_err(|e| insert_err(e, tmdb_id))?;

    info!(id = %row.id, name = %row.name, tmdb_id, "subscribed");
    Ok(row)
}

/// Rebuild the media record a subscription row was created from.
pub fn record_from_row(row: &SeriesRow) -> MediaRecord {
    let kind = match row.media_kind.as_str() {
        "movie" => MediaKind::Movie,
        _ => MediaKind::Series,
    };
    let mut record = MediaRecord::new(row.name.clone(), kind);
    record.external_id = u64::try_from(row.tmdb_id).unwrap_or_default();
    record.native_name = row.native_name.clone();
    record.year = row.year.and_then(|y| i32::try_from(y).ok());
    if let Some(reason) = row.completion_reason.as_deref() {
        record.completion = CompletionVerdict::new(row.status(), reason);
    }
    record
}

/// Run a completion check for one subscription and persist the verdict.
pub async fn check_series(
    state: &AppState,
    row: &SeriesRow,
    local: LocalLibrarySignal,
) -> Result<SeriesRow, AppError> {
    let lookup = require_lookup(state)?;
    let mut record = record_from_row(row);
    let now = chrono::Local::now().naive_local();

    let details = lookup.check_completion(&mut record, local, now).await;
    let tmdb_status = details
        .as_ref()
        .and_then(|d| d["status"].as_str())
        .map(str::to_string);

    series::update_completion(
        &state.db,
        &row.id,
        record.completion.status,
        &record.completion.reason,
        tmdb_status.as_deref(),
        now,
    )
    .await
    .map_err(db_err)?;

    info!(
        id = %row.id,
        status = %record.completion.status,
        completed = record.completion.status.is_completed(),
        reason = %record.completion.reason,
        "completion checked"
    );

    series::get_series(&state.db, &row.id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApiError::NotFound("series not found".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn racing_insert_maps_to_conflict() {
        let pool = seriestrack_db::connect(":memory:").await.unwrap();
        seriestrack_db::migrate::run(&pool).await.unwrap();
        let new = NewSeries {
            title: "[LoliHouse] Hell Mode - 06",
            name: "地狱模式",
            native_name: None,
            tmdb_id: 123456,
            media_kind: "series",
            year: None,
        };
        series::create_series(&pool, &new).await.unwrap();

        let err = series::create_series(&pool, &new).await.unwrap_err();
        let AppError(api) = insert_err(err, new.tmdb_id);
        assert!(matches!(api, ApiError::Conflict(_)));
        assert_eq!(api.status_code(), 409);
    }
}
