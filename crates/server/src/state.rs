use sqlx::SqlitePool;

use seriestrack_metadata::lookup::Lookup;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// `None` when no provider is configured; lookups then fail with 502.
    pub lookup: Option<Lookup>,
}
