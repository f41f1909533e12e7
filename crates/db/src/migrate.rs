pub mod completion;

use sqlx::SqlitePool;
use tracing::info;

use crate::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial_schema",
        include_str!("../migrations/001_initial_schema.sql"),
    ),
    (
        "002_unique_tmdb_id",
        include_str!("../migrations/002_unique_tmdb_id.sql"),
    ),
];

/// Run forward-only migrations, then the completion column steps.
///
/// SQL migrations are tracked in a `_migrations` table. The completion steps
/// check their own preconditions and run every time.
pub async fn run(pool: &SqlitePool) -> Result<(), DbError> {
    // Create migrations tracking table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_ts INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: Option<(String,)> =
            sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                .bind(name)
                .fetch_optional(pool)
                .await?;

        if applied.is_some() {
            continue;
        }

        info!(migration = name, "applying migration");
        // Execute migration statements (split on semicolons for multi-statement)
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }
            sqlx::query(trimmed)
                .execute(pool)
                .await
                .map_err(|source| DbError::Migration {
                    statement: trimmed.to_string(),
                    source,
                })?;
        }

        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO _migrations (name, applied_ts) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(pool)
            .await?;

        info!(migration = name, "migration applied");
    }

    completion::apply(pool).await?;

    Ok(())
}
