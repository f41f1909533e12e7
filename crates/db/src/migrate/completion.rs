//! Completion status columns on `rss_tv`.
//!
//! Each step carries the column it creates and is skipped when the column is
//! already present, so applying the migration any number of times leaves the
//! same schema and rows. All steps and the backfill share one transaction.

use std::collections::HashSet;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

use crate::DbError;

pub const TABLE: &str = "rss_tv";

/// Reason stored on rows that existed before completion tracking.
pub const HISTORICAL_REASON: &str = "historical data; status unknown";

/// One `ADD COLUMN` mutation guarded by a "column exists?" check.
#[derive(Debug, Clone, Copy)]
pub struct ColumnStep {
    pub column: &'static str,
    pub ddl: &'static str,
}

pub const STEPS: &[ColumnStep] = &[
    ColumnStep {
        column: "COMPLETION_STATUS",
        ddl: "ALTER TABLE rss_tv ADD COLUMN COMPLETION_STATUS TEXT DEFAULT 'UNKNOWN'",
    },
    ColumnStep {
        column: "TMDB_STATUS",
        ddl: "ALTER TABLE rss_tv ADD COLUMN TMDB_STATUS TEXT",
    },
    ColumnStep {
        column: "LAST_COMPLETION_CHECK",
        ddl: "ALTER TABLE rss_tv ADD COLUMN LAST_COMPLETION_CHECK DATETIME",
    },
    ColumnStep {
        column: "COMPLETION_REASON",
        ddl: "ALTER TABLE rss_tv ADD COLUMN COMPLETION_REASON TEXT",
    },
];

const BACKFILL_SQL: &str = "UPDATE rss_tv \
     SET COMPLETION_STATUS = 'UNKNOWN', COMPLETION_REASON = ? \
     WHERE COMPLETION_STATUS IS NULL";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub added: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
    pub backfilled: u64,
}

/// Columns from [`STEPS`] that the table does not have yet.
pub async fn missing_columns(pool: &SqlitePool) -> Result<Vec<&'static str>, DbError> {
    let mut conn = pool.acquire().await?;
    let existing = existing_columns(&mut conn).await?;
    let missing: Vec<&'static str> = STEPS
        .iter()
        .filter(|step| !existing.contains(&step.column.to_ascii_lowercase()))
        .map(|step| step.column)
        .collect();

    if missing.is_empty() {
        info!(table = TABLE, "completion columns present");
    } else {
        info!(table = TABLE, ?missing, "completion columns missing");
    }
    Ok(missing)
}

/// Apply the completion steps inside a single transaction.
///
/// Any failure rolls the whole transaction back and is returned to the caller.
pub async fn apply(pool: &SqlitePool) -> Result<MigrationReport, DbError> {
    info!(table = TABLE, "applying completion columns migration");
    let mut tx = pool.begin().await?;

    match apply_steps(&mut tx).await {
        Ok(report) => {
            tx.commit().await?;
            info!(
                added = ?report.added,
                skipped = ?report.skipped,
                backfilled = report.backfilled,
                "completion columns migration complete"
            );
            Ok(report)
        }
        Err(e) => {
            error!(error = %e, "completion columns migration failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(e)
        }
    }
}

async fn apply_steps(conn: &mut SqliteConnection) -> Result<MigrationReport, DbError> {
    let existing = existing_columns(&mut *conn).await?;
    if existing.is_empty() {
        return Err(DbError::MissingTable(TABLE.to_string()));
    }

    let mut report = MigrationReport::default();
    for step in STEPS {
        if existing.contains(&step.column.to_ascii_lowercase()) {
            warn!(column = step.column, "column already exists, skipping");
            report.skipped.push(step.column);
            continue;
        }

        sqlx::query(step.ddl)
            .execute(&mut *conn)
            .await
            .map_err(|source| DbError::Migration {
                statement: step.ddl.to_string(),
                source,
            })?;
        info!(column = step.column, statement = step.ddl, "column added");
        report.added.push(step.column);
    }

    let result = sqlx::query(BACKFILL_SQL)
        .bind(HISTORICAL_REASON)
        .execute(&mut *conn)
        .await
        .map_err(|source| DbError::Migration {
            statement: BACKFILL_SQL.to_string(),
            source,
        })?;
    report.backfilled = result.rows_affected();
    if report.backfilled > 0 {
        info!(rows = report.backfilled, "backfilled completion status");
    }

    Ok(report)
}

/// Lower-cased column names of [`TABLE`]; empty when the table is absent.
async fn existing_columns(conn: &mut SqliteConnection) -> Result<HashSet<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info(?)")
        .bind(TABLE)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(name,)| name.to_ascii_lowercase())
        .collect())
}
