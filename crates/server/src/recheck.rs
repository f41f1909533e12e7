use std::time::Duration;

use seriestrack_core::types::{CompletionStatus, LocalLibrarySignal};
use seriestrack_db::repo::series;
use tracing::{info, warn};

use crate::state::AppState;
use crate::tracking;

pub const DEFAULT_RECHECK_SECS: u64 = 6 * 60 * 60;
pub const MIN_RECHECK_SECS: u64 = 60;

/// Recheck period from a `SERIESTRACK_RECHECK_SECS` value. Missing or
/// unparseable values use the default; short periods are raised to the floor.
pub fn recheck_interval(raw: Option<&str>) -> Duration {
    let secs = match raw.map(str::trim) {
        None => DEFAULT_RECHECK_SECS,
        Some(v) => match v.parse::<u64>() {
            Ok(secs) => secs,
            Err(_) => {
                warn!(value = v, "invalid recheck interval, using default");
                DEFAULT_RECHECK_SECS
            }
        },
    };
    if secs < MIN_RECHECK_SECS {
        warn!(secs, min = MIN_RECHECK_SECS, "recheck interval too short, clamping");
        return Duration::from_secs(MIN_RECHECK_SECS);
    }
    Duration::from_secs(secs)
}

/// Re-run the completion check for every suspicious series.
///
/// Returns how many series were checked. Failures on individual series are
/// logged and skipped.
pub async fn recheck_suspicious(state: &AppState) -> Result<usize, sqlx::Error> {
    let rows = series::list_by_status(&state.db, CompletionStatus::SuspiciousCompleted).await?;
    let mut checked = 0;

    for row in &rows {
        match tracking::check_series(state, row, LocalLibrarySignal::default()).await {
            Ok(updated) => {
                checked += 1;
                if updated.status() != CompletionStatus::SuspiciousCompleted {
                    info!(id = %row.id, status = %updated.completion_status, "suspicious series settled");
                }
            }
            Err(e) => warn!(id = %row.id, error = %e.0, "recheck failed"),
        }
    }

    Ok(checked)
}

/// Loop forever, rechecking suspicious series every `every`.
pub async fn run_recheck_loop(state: AppState, every: Duration) {
    loop {
        tokio::time::sleep(every).await;
        match recheck_suspicious(&state).await {
            Ok(n) if n > 0 => info!(checked = n, "suspicious series rechecked"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "listing suspicious series failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_defaults_and_clamps() {
        assert_eq!(recheck_interval(None), Duration::from_secs(DEFAULT_RECHECK_SECS));
        assert_eq!(recheck_interval(Some("abc")), Duration::from_secs(DEFAULT_RECHECK_SECS));
        assert_eq!(recheck_interval(Some("0")), Duration::from_secs(MIN_RECHECK_SECS));
        assert_eq!(recheck_interval(Some("5")), Duration::from_secs(MIN_RECHECK_SECS));
        assert_eq!(recheck_interval(Some(" 3600 ")), Duration::from_secs(3600));
    }
}
