//! Provider record fields the completion classifier relies on.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// TMDB genre id for Animation, used as the anime marker.
pub const ANIME_GENRE_ID: i64 = 16;

/// Days without a scheduled episode after which an anime looks finished.
pub const SUSPICIOUS_DAYS_THRESHOLD: i64 = 7;

/// Series details as returned by the provider (`/tv/{id}`).
///
/// Absent fields take the values the classifier treats as "no information":
/// an empty status, still in production, no genres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default = "in_production_default", deserialize_with = "null_as_true")]
    pub in_production: bool,
    #[serde(default)]
    pub next_episode_to_air: Option<NextEpisode>,
    #[serde(default)]
    pub last_air_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextEpisode {
    #[serde(default)]
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

fn in_production_default() -> bool {
    true
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn null_as_true<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(de)?.unwrap_or(true))
}

/// The raw provider JSON did not have the expected shape.
#[derive(Debug, Error)]
#[error("unexpected provider record shape: {0}")]
pub struct ProviderShapeError(#[from] serde_json::Error);

impl ProviderRecord {
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, ProviderShapeError> {
        Ok(Self::deserialize(raw)?)
    }

    /// Provider status text, trimmed.
    pub fn status(&self) -> &str {
        self.status.trim()
    }
}

/// A date string that is not ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date: {0:?}")]
pub struct DateParseError(pub String);

/// Anime-like release cadence: genre 16 in `genre_ids` or in `genres`.
pub fn is_long_form_episodic(record: &ProviderRecord) -> bool {
    has_genre(record, ANIME_GENRE_ID)
}

pub fn has_genre(record: &ProviderRecord, genre_id: i64) -> bool {
    record.genre_ids.contains(&genre_id) || record.genres.iter().any(|g| g.id == Some(genre_id))
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.f]` or RFC 3339. Offsets are
/// dropped and the wall-clock time is kept.
pub fn parse_date(value: &str) -> Result<NaiveDateTime, DateParseError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .map_err(|_| DateParseError(value.to_string()))
}

/// Whole days from `date` to `now`.
pub fn days_since(date: &str, now: NaiveDateTime) -> Result<i64, DateParseError> {
    let then = parse_date(date)?;
    Ok((now - then).num_days())
}

/// True when the last air date is more than `days` before `now`. An
/// unparseable or missing date is never stale.
pub fn is_stale(record: &ProviderRecord, days: i64, now: NaiveDateTime) -> bool {
    let Some(last) = record.last_air_date.as_deref() else {
        return false;
    };
    match days_since(last, now) {
        Ok(elapsed) => elapsed > days,
        Err(e) => {
            warn!(field = "last_air_date", error = %e, "cannot parse last air date");
            false
        }
    }
}

/// Air date of the next scheduled episode, if any and parseable.
pub fn next_episode_date(record: &ProviderRecord) -> Option<NaiveDateTime> {
    let air_date = record.next_episode_to_air.as_ref()?.air_date.as_deref()?;
    match parse_date(air_date) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(field = "next_episode_to_air.air_date", error = %e, "cannot parse next air date");
            None
        }
    }
}
