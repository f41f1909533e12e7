//! Title lookup with a native-name fallback.
//!
//! At most two searches per title, always in order: the name parsed from the
//! release title, then the Han candidate name when the first finds nothing.

use std::sync::Arc;

use chrono::NaiveDateTime;
use seriestrack_core::types::{LocalLibrarySignal, MediaKind, MediaRecord};
use seriestrack_scanner::fallback::extract_candidate_name;
use seriestrack_scanner::parser::parse_release_title;
use tracing::{info, instrument, warn};

use crate::completion;
use crate::provider::{MetadataProvider, SearchResult};

#[derive(Clone)]
pub struct Lookup {
    provider: Arc<dyn MetadataProvider>,
}

impl Lookup {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Resolve a release title into a media record.
    ///
    /// An empty search result is a normal outcome. Provider errors are logged
    /// and count as "no match" so that the fallback still runs.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn resolve(&self, title: &str) -> MediaRecord {
        let parsed = parse_release_title(title);
        let kind = if parsed.is_episode() {
            MediaKind::Series
        } else {
            MediaKind::Movie
        };
        let mut record = MediaRecord::new(parsed.name.clone(), kind);

        let primary = self.search(&parsed.name, kind).await;

        if let Some(candidate) = extract_candidate_name(title, None) {
            record.set_native_name(candidate);
        }

        let matched = match primary {
            Some(hit) => Some(hit),
            None => match record.native_name.clone() {
                Some(candidate) => {
                    info!(query = %candidate, "primary search empty, trying native name");
                    self.search(&candidate, kind).await
                }
                None => None,
            },
        };

        match matched {
            Some(hit) => apply_match(&mut record, hit),
            None => info!(
                display_name = %record.display_name(),
                "no provider match"
            ),
        }

        record
    }

    /// Fetch provider details for a resolved series and attach a completion
    /// verdict. Without details the local/default rules decide.
    #[instrument(skip(self, record), fields(external_id = record.external_id))]
    pub async fn check_completion(
        &self,
        record: &mut MediaRecord,
        local: LocalLibrarySignal,
        now: NaiveDateTime,
    ) -> Option<serde_json::Value> {
        let details = if record.is_resolved() && record.media_kind == MediaKind::Series {
            match self.provider.get_series_details(record.external_id).await {
                Ok(details) => Some(details),
                Err(e) => {
                    warn!(error = %e, "series details unavailable");
                    None
                }
            }
        } else {
            None
        };

        record.completion = completion::classify(record, details.as_ref(), local, now);
        details
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Option<SearchResult> {
        if query.trim().is_empty() {
            return None;
        }
        let result = match kind {
            MediaKind::Series => self.provider.search_series(query).await,
            MediaKind::Movie => self.provider.search_movie(query).await,
        };
        match result {
            Ok(results) => results.into_iter().next(),
            Err(e) => {
                warn!(query, error = %e, "search failed");
                None
            }
        }
    }
}

fn apply_match(record: &mut MediaRecord, hit: SearchResult) {
    info!(external_id = hit.provider_id, name = %hit.name, "provider match");
    record.external_id = hit.provider_id;
    record.primary_name = hit.name;
    record.media_kind = hit.kind;
    record.year = hit.year;
    record.overview = hit.overview;
    record.poster_url = hit.poster_url;
}
