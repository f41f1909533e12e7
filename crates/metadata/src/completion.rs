//! Completion status classifier.
//!
//! Precedence, first match wins:
//! 1. Provider data, when present and conclusive.
//! 2. The local library holding every episode.
//! 3. Keep monitoring.

use chrono::NaiveDateTime;
use seriestrack_core::types::{
    CompletionStatus, CompletionVerdict, LocalLibrarySignal, MediaRecord,
};
use tracing::{debug, info, warn};

use crate::signals::{
    self, ProviderRecord, ProviderShapeError, ANIME_GENRE_ID, SUSPICIOUS_DAYS_THRESHOLD,
};

/// Tunables for the classifier. The defaults are the production values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionConfig {
    pub anime_genre_id: i64,
    pub suspicious_days_threshold: i64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            anime_genre_id: ANIME_GENRE_ID,
            suspicious_days_threshold: SUSPICIOUS_DAYS_THRESHOLD,
        }
    }
}

/// Classify a series from whatever evidence is available.
///
/// Never fails: malformed provider data degrades to the local/default rules.
pub fn classify(
    media: &MediaRecord,
    provider: Option<&serde_json::Value>,
    local: LocalLibrarySignal,
    now: NaiveDateTime,
) -> CompletionVerdict {
    if let Some(raw) = provider.filter(|raw| !is_empty_record(raw)) {
        let verdict = classify_provider(raw, now);
        if verdict.status != CompletionStatus::Unknown {
            info!(
                name = %media.display_name(),
                status = %verdict.status,
                reason = %verdict.reason,
                "completion decided by provider"
            );
            return verdict;
        }
    }

    if local.exists && local.is_complete {
        let verdict = CompletionVerdict::new(
            CompletionStatus::CompletedByLocal,
            "local library holds all episodes",
        );
        info!(name = %media.display_name(), "completion decided by local library");
        return verdict;
    }

    debug!(name = %media.display_name(), "no conclusive completion signal");
    CompletionVerdict::new(
        CompletionStatus::Ongoing,
        "insufficient information; continue monitoring",
    )
}

/// `null` and `{}` carry no provider evidence at all.
fn is_empty_record(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Provider rules with shape errors folded into an `Unknown` verdict.
pub fn classify_provider(raw: &serde_json::Value, now: NaiveDateTime) -> CompletionVerdict {
    match classify_from_provider(raw, now) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(error = %e, "provider record rejected");
            CompletionVerdict::new(
                CompletionStatus::Unknown,
                format!("provider data could not be read: {e}"),
            )
        }
    }
}

/// Provider rules over the raw record.
pub fn classify_from_provider(
    raw: &serde_json::Value,
    now: NaiveDateTime,
) -> Result<CompletionVerdict, ProviderShapeError> {
    let record = ProviderRecord::from_json(raw)?;
    Ok(classify_record(&record, &CompletionConfig::default(), now))
}

/// Provider rules over an already decoded record.
pub fn classify_record(
    record: &ProviderRecord,
    config: &CompletionConfig,
    now: NaiveDateTime,
) -> CompletionVerdict {
    let status = record.status();

    if status == "Ended" && !record.in_production {
        return CompletionVerdict::new(
            CompletionStatus::CompletedByProvider,
            format!(
                "provider marks series ended (status={status}, in_production={})",
                record.in_production
            ),
        );
    }

    let Some(next) = record.next_episode_to_air.as_ref() else {
        if record.last_air_date.is_some()
            && signals::has_genre(record, config.anime_genre_id)
            && signals::is_stale(record, config.suspicious_days_threshold, now)
        {
            return CompletionVerdict::new(
                CompletionStatus::SuspiciousCompleted,
                format!(
                    "anime has had no next-episode information for more than {} days",
                    config.suspicious_days_threshold
                ),
            );
        }
        return CompletionVerdict::new(
            CompletionStatus::CompletedByProvider,
            "no next-episode scheduled",
        );
    };

    if let Some(air_date) = next.air_date.as_deref() {
        match signals::parse_date(air_date) {
            Ok(date) if date < now => {
                return CompletionVerdict::new(
                    CompletionStatus::Ongoing,
                    format!(
                        "scheduled date ({air_date}) has passed; provider data may be stale"
                    ),
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(field = "next_episode_to_air.air_date", error = %e, "cannot parse next air date");
            }
        }
    }

    CompletionVerdict::new(
        CompletionStatus::Ongoing,
        format!("provider shows series airing (status={status})"),
    )
}

/// True when an anime is finished or probably finished per the provider.
/// Non-anime records and malformed data are never reported as finished.
pub fn is_completed_by_provider(raw: &serde_json::Value, now: NaiveDateTime) -> bool {
    let Ok(record) = ProviderRecord::from_json(raw) else {
        return false;
    };
    if !signals::is_long_form_episodic(&record) {
        return false;
    }
    match classify_record(&record, &CompletionConfig::default(), now).status {
        CompletionStatus::CompletedByProvider | CompletionStatus::SuspiciousCompleted => true,
        CompletionStatus::Unknown | CompletionStatus::Ongoing | CompletionStatus::CompletedByLocal => {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use seriestrack_core::types::MediaKind;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn media() -> MediaRecord {
        MediaRecord::new("Hell Mode", MediaKind::Series)
    }

    fn no_local() -> LocalLibrarySignal {
        LocalLibrarySignal::default()
    }

    #[test]
    fn ended_and_not_in_production_is_completed() {
        for extra in [
            json!({ "next_episode_to_air": { "air_date": "2030-01-01" } }),
            json!({ "genre_ids": [16], "last_air_date": "2020-01-01" }),
            json!({}),
        ] {
            let mut raw = json!({ "status": "Ended", "in_production": false });
            raw.as_object_mut()
                .unwrap()
                .extend(extra.as_object().unwrap().clone());

            let v = classify(&media(), Some(&raw), no_local(), now());
            assert_eq!(v.status, CompletionStatus::CompletedByProvider);
            assert!(v.reason.contains("status=Ended"));
            assert!(v.reason.contains("in_production=false"));
        }
    }

    #[test]
    fn ended_but_in_production_is_not_shortcut() {
        let raw = json!({
            "status": "Ended",
            "in_production": true,
            "next_episode_to_air": { "air_date": "2024-06-01" }
        });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::Ongoing);
        assert!(v.reason.contains("status=Ended"));
    }

    #[test]
    fn future_next_episode_is_ongoing() {
        for date in ["2024-05-21", "2024-05-20T16:00:00", "2031-12-31"] {
            let raw = json!({
                "status": "Returning Series",
                "in_production": true,
                "next_episode_to_air": { "air_date": date }
            });
            let v = classify(&media(), Some(&raw), no_local(), now());
            assert_eq!(v.status, CompletionStatus::Ongoing);
            assert!(v.reason.contains("Returning Series"));
        }
    }

    #[test]
    fn past_next_episode_is_ongoing_but_stale() {
        let raw = json!({
            "status": "Returning Series",
            "next_episode_to_air": { "air_date": "2024-05-01" }
        });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::Ongoing);
        assert!(v.reason.contains("has passed"));
    }

    #[test]
    fn unparseable_next_episode_falls_through() {
        let raw = json!({
            "status": "Returning Series",
            "next_episode_to_air": { "air_date": "TBA" }
        });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::Ongoing);
        assert!(v.reason.contains("status=Returning Series"));
    }

    #[test]
    fn anime_silent_for_eight_days_is_suspicious() {
        let raw = json!({
            "status": "Returning Series",
            "genre_ids": [16],
            "last_air_date": "2024-05-12"
        });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::SuspiciousCompleted);
        assert!(v.reason.contains('7'));
        assert!(v.status.needs_recheck());
    }

    #[test]
    fn anime_silent_for_exactly_seven_days_is_not_suspicious() {
        let raw = json!({
            "status": "Returning Series",
            "genres": [{ "id": 16, "name": "Animation" }],
            "last_air_date": "2024-05-13"
        });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::CompletedByProvider);
        assert_eq!(v.reason, "no next-episode scheduled");
    }

    #[test]
    fn non_anime_without_next_episode_is_completed() {
        let raw = json!({
            "status": "Returning Series",
            "genre_ids": [18],
            "last_air_date": "2020-01-01"
        });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::CompletedByProvider);
    }

    #[test]
    fn unparseable_last_air_date_is_not_stale() {
        let raw = json!({ "genre_ids": [16], "last_air_date": "a while ago" });
        let v = classify(&media(), Some(&raw), no_local(), now());
        assert_eq!(v.status, CompletionStatus::CompletedByProvider);
    }

    #[test]
    fn malformed_provider_record_is_unknown_at_the_boundary() {
        let raw = json!({ "status": 42, "in_production": "no" });
        let v = classify_provider(&raw, now());
        assert_eq!(v.status, CompletionStatus::Unknown);
        assert!(v.reason.contains("unexpected provider record shape"));
        assert!(classify_from_provider(&raw, now()).is_err());
    }

    #[test]
    fn malformed_provider_record_defers_to_local_library() {
        let raw = json!({ "genres": "Animation" });
        let local = LocalLibrarySignal { exists: true, is_complete: true };
        let v = classify(&media(), Some(&raw), local, now());
        assert_eq!(v.status, CompletionStatus::CompletedByLocal);
        assert_eq!(v.reason, "local library holds all episodes");
    }

    #[test]
    fn local_library_needs_both_flags() {
        let partial = LocalLibrarySignal { exists: true, is_complete: false };
        let v = classify(&media(), None, partial, now());
        assert_eq!(v.status, CompletionStatus::Ongoing);
        assert_eq!(v.reason, "insufficient information; continue monitoring");

        let complete = LocalLibrarySignal { exists: true, is_complete: true };
        let v = classify(&media(), None, complete, now());
        assert_eq!(v.status, CompletionStatus::CompletedByLocal);
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let record = ProviderRecord::from_json(&json!({
            "genre_ids": [16],
            "last_air_date": "2024-05-17"
        }))
        .unwrap();
        let config = CompletionConfig {
            suspicious_days_threshold: 2,
            ..Default::default()
        };
        let v = classify_record(&record, &config, now());
        assert_eq!(v.status, CompletionStatus::SuspiciousCompleted);
        assert!(v.reason.contains("2 days"));
    }

    #[test]
    fn completed_by_provider_only_for_anime() {
        let anime = json!({ "status": "Ended", "in_production": false, "genre_ids": [16] });
        let drama = json!({ "status": "Ended", "in_production": false, "genre_ids": [18] });
        let airing = json!({
            "genre_ids": [16],
            "next_episode_to_air": { "air_date": "2030-01-01" }
        });
        assert!(is_completed_by_provider(&anime, now()));
        assert!(!is_completed_by_provider(&drama, now()));
        assert!(!is_completed_by_provider(&airing, now()));
        assert!(!is_completed_by_provider(&json!("oops"), now()));
    }

    #[test]
    fn empty_provider_record_defers_to_local_library() {
        let complete = LocalLibrarySignal { exists: true, is_complete: true };
        for raw in [json!({}), json!(null)] {
            let v = classify(&media(), Some(&raw), complete, now());
            assert_eq!(v.status, CompletionStatus::CompletedByLocal);

            let v = classify(&media(), Some(&raw), no_local(), now());
            assert_eq!(v.status, CompletionStatus::Ongoing);
            assert_eq!(v.reason, "insufficient information; continue monitoring");
        }
    }

    #[test]
    fn every_verdict_has_a_reason() {
        for raw in [
            json!({ "status": "Ended", "in_production": false }),
            json!({ "next_episode_to_air": {} }),
            json!({ "status": "Returning Series" }),
            json!("oops"),
        ] {
            let v = classify(&media(), Some(&raw), no_local(), now());
            assert!(!v.reason.trim().is_empty());
        }
    }
}
