use seriestrack_core::types::CompletionStatus;
use sqlx::SqlitePool;

/// Format used for the `LAST_COMPLETION_CHECK` column.
pub const CHECK_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, serde::Serialize)]
pub struct SeriesRow {
    pub id: String,
    pub title: String,
    pub name: String,
    pub native_name: Option<String>,
    pub tmdb_id: i64,
    pub media_kind: String,
    pub year: Option<i64>,
    pub completion_status: String,
    pub tmdb_status: Option<String>,
    pub last_completion_check: Option<String>,
    pub completion_reason: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl SeriesRow {
    /// Parsed status; unrecognised column text reads as `Unknown`.
    pub fn status(&self) -> CompletionStatus {
        self.completion_status
            .parse()
            .unwrap_or(CompletionStatus::Unknown)
    }
}

#[derive(Debug, Clone)]
pub struct NewSeries<'a> {
    pub title: &'a str,
    pub name: &'a str,
    pub native_name: Option<&'a str>,
    pub tmdb_id: i64,
    pub media_kind: &'a str,
    pub year: Option<i64>,
}

type SeriesTuple = (
    String,
    String,
    String,
    Option<String>,
    i64,
    String,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

const SELECT_COLUMNS: &str = "SELECT id, title, name, native_name, tmdb_id, media_kind, year, \
     COMPLETION_STATUS, TMDB_STATUS, LAST_COMPLETION_CHECK, COMPLETION_REASON, \
     created_ts, updated_ts FROM rss_tv";

pub async fn create_series(pool: &SqlitePool, new: &NewSeries<'_>) -> Result<SeriesRow, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO rss_tv (id, title, name, native_name, tmdb_id, media_kind, year, \
         created_ts, updated_ts) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(new.title)
    .bind(new.name)
    .bind(new.native_name)
    .bind(new.tmdb_id)
    .bind(new.media_kind)
    .bind(new.year)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_series(pool, &id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// True when an insert hit the one-row-per-provider-id index.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub async fn get_series(pool: &SqlitePool, id: &str) -> Result<Option<SeriesRow>, sqlx::Error> {
    let row: Option<SeriesTuple> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(row_to_series))
}

/// Find a subscription by provider id. Unresolved rows (id 0) are never returned.
pub async fn find_by_tmdb_id(
    pool: &SqlitePool,
    tmdb_id: i64,
) -> Result<Option<SeriesRow>, sqlx::Error> {
    if tmdb_id == 0 {
        return Ok(None);
    }
    let row: Option<SeriesTuple> =
        sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE tmdb_id = ? LIMIT 1"))
            .bind(tmdb_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(row_to_series))
}

pub async fn list_series(pool: &SqlitePool) -> Result<Vec<SeriesRow>, sqlx::Error> {
    let rows: Vec<SeriesTuple> = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY name"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(row_to_series).collect())
}

pub async fn list_by_status(
    pool: &SqlitePool,
    status: CompletionStatus,
) -> Result<Vec<SeriesRow>, sqlx::Error> {
    let rows: Vec<SeriesTuple> = sqlx::query_as(&format!(
        "{SELECT_COLUMNS} WHERE COMPLETION_STATUS = ? ORDER BY LAST_COMPLETION_CHECK"
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_series).collect())
}

/// Record the result of a completion check. Returns false if the row is gone.
pub async fn update_completion(
    pool: &SqlitePool,
    id: &str,
    status: CompletionStatus,
    reason: &str,
    tmdb_status: Option<&str>,
    checked_at: chrono::NaiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE rss_tv SET COMPLETION_STATUS = ?, COMPLETION_REASON = ?, \
         TMDB_STATUS = COALESCE(?, TMDB_STATUS), LAST_COMPLETION_CHECK = ?, updated_ts = ? \
         WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(reason)
    .bind(tmdb_status)
    .bind(checked_at.format(CHECK_TS_FORMAT).to_string())
    .bind(chrono::Utc::now().timestamp())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_series(r: SeriesTuple) -> SeriesRow {
    SeriesRow {
        id: r.0,
        title: r.1,
        name: r.2,
        native_name: r.3,
        tmdb_id: r.4,
        media_kind: r.5,
        year: r.6,
        completion_status: r.7.unwrap_or_else(|| CompletionStatus::Unknown.as_str().to_string()),
        tmdb_status: r.8,
        last_completion_check: r.9,
        completion_reason: r.10,
        created_ts: r.11,
        updated_ts: r.12,
    }
}
