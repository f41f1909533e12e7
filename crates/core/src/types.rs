use serde::{Deserialize, Serialize};

/// Sentinel `external_id` for a record no search attempt matched.
pub const UNRESOLVED_ID: u64 = 0;

/// Media kind, as hinted by the release title and confirmed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a series has finished releasing episodes.
///
/// Stored in the `COMPLETION_STATUS` column using [`CompletionStatus::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    Unknown,
    Ongoing,
    CompletedByProvider,
    CompletedByLocal,
    SuspiciousCompleted,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Ongoing => "ONGOING",
            Self::CompletedByProvider => "COMPLETED_BY_PROVIDER",
            Self::CompletedByLocal => "COMPLETED_BY_LOCAL",
            Self::SuspiciousCompleted => "SUSPICIOUS_COMPLETED",
        }
    }

    /// Fixed human description of the state, independent of any particular check.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Unknown => "completion status could not be determined",
            Self::Ongoing => "series is still airing",
            Self::CompletedByProvider => "completed according to provider data",
            Self::CompletedByLocal => "completed according to the local library",
            Self::SuspiciousCompleted => "probably completed; needs confirmation",
        }
    }

    /// Suspicious completion is never terminal and must be checked again later.
    pub fn needs_recheck(self) -> bool {
        match self {
            Self::SuspiciousCompleted => true,
            Self::Unknown | Self::Ongoing | Self::CompletedByProvider | Self::CompletedByLocal => {
                false
            }
        }
    }

    pub fn is_completed(self) -> bool {
        match self {
            Self::CompletedByProvider | Self::CompletedByLocal => true,
            Self::Unknown | Self::Ongoing | Self::SuspiciousCompleted => false,
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown completion status: {0}")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for CompletionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(Self::Unknown),
            "ONGOING" => Ok(Self::Ongoing),
            "COMPLETED_BY_PROVIDER" => Ok(Self::CompletedByProvider),
            "COMPLETED_BY_LOCAL" => Ok(Self::CompletedByLocal),
            "SUSPICIOUS_COMPLETED" => Ok(Self::SuspiciousCompleted),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A completion status together with the reason it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionVerdict {
    pub status: CompletionStatus,
    pub reason: String,
}

impl CompletionVerdict {
    /// Builds a verdict. An empty reason falls back to the status description so
    /// that a status is never stored without one.
    pub fn new(status: CompletionStatus, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            status.describe().to_string()
        } else {
            reason
        };
        Self { status, reason }
    }

    pub fn unchecked() -> Self {
        Self::new(CompletionStatus::Unknown, "completion not checked yet")
    }
}

impl Default for CompletionVerdict {
    fn default() -> Self {
        Self::unchecked()
    }
}

/// Whether the local library already holds the series, supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalLibrarySignal {
    pub exists: bool,
    pub is_complete: bool,
}

/// The outcome of resolving one release title against the metadata provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Provider id of the match, [`UNRESOLVED_ID`] until a search matches.
    pub external_id: u64,
    /// Name derived from the title, replaced by the matched name.
    pub primary_name: String,
    /// Native-script (Han) name taken from the title. Never cleared once set.
    pub native_name: Option<String>,
    pub media_kind: MediaKind,
    pub completion: CompletionVerdict,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
}

impl MediaRecord {
    pub fn new(primary_name: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            external_id: UNRESOLVED_ID,
            primary_name: primary_name.into(),
            native_name: None,
            media_kind,
            completion: CompletionVerdict::unchecked(),
            year: None,
            overview: None,
            poster_url: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.external_id != UNRESOLVED_ID
    }

    /// Stores the native name unless one is already set.
    pub fn set_native_name(&mut self, name: String) {
        if self.native_name.is_none() {
            self.native_name = Some(name);
        }
    }

    /// Matched name, else the native name, else the name derived from the title.
    pub fn display_name(&self) -> &str {
        if self.is_resolved() {
            return &self.primary_name;
        }
        self.native_name.as_deref().unwrap_or(&self.primary_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_column_text() {
        for status in [
            CompletionStatus::Unknown,
            CompletionStatus::Ongoing,
            CompletionStatus::CompletedByProvider,
            CompletionStatus::CompletedByLocal,
            CompletionStatus::SuspiciousCompleted,
        ] {
            assert_eq!(status.as_str().parse::<CompletionStatus>(), Ok(status));
        }
        assert!("FINISHED".parse::<CompletionStatus>().is_err());
    }

    #[test]
    fn serde_uses_column_text() {
        let json = serde_json::to_string(&CompletionStatus::SuspiciousCompleted).unwrap();
        assert_eq!(json, "\"SUSPICIOUS_COMPLETED\"");
    }

    #[test]
    fn only_suspicious_needs_recheck() {
        assert!(CompletionStatus::SuspiciousCompleted.needs_recheck());
        assert!(!CompletionStatus::CompletedByProvider.needs_recheck());
        assert!(!CompletionStatus::Ongoing.needs_recheck());
    }

    #[test]
    fn suspicious_is_not_completed() {
        assert!(CompletionStatus::CompletedByProvider.is_completed());
        assert!(CompletionStatus::CompletedByLocal.is_completed());
        assert!(!CompletionStatus::SuspiciousCompleted.is_completed());
        assert!(!CompletionStatus::Unknown.is_completed());
    }

    #[test]
    fn verdict_never_has_empty_reason() {
        let v = CompletionVerdict::new(CompletionStatus::Ongoing, "  ");
        assert_eq!(v.reason, CompletionStatus::Ongoing.describe());
    }

    #[test]
    fn display_name_prefers_match_then_native() {
        let mut rec = MediaRecord::new("Hell Mode", MediaKind::Series);
        assert_eq!(rec.display_name(), "Hell Mode");

        rec.set_native_name("地狱模式".into());
        assert_eq!(rec.display_name(), "地狱模式");

        rec.external_id = 42;
        rec.primary_name = "Hell Mode: The Gamer".into();
        assert_eq!(rec.display_name(), "Hell Mode: The Gamer");

        rec.set_native_name("other".into());
        assert_eq!(rec.native_name.as_deref(), Some("地狱模式"));
    }
}
