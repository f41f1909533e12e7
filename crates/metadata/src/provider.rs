use seriestrack_core::types::MediaKind;

use crate::MetadataError;

/// A metadata provider that can search titles and fetch series details.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search for a movie by name. An empty list means no match.
    async fn search_movie(&self, query: &str) -> Result<Vec<SearchResult>, MetadataError>;

    /// Search for a TV series by name. An empty list means no match.
    async fn search_series(&self, query: &str) -> Result<Vec<SearchResult>, MetadataError>;

    /// Raw series details, as consumed by the completion classifier.
    async fn get_series_details(&self, provider_id: u64)
    -> Result<serde_json::Value, MetadataError>;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    pub provider_id: u64,
    pub name: String,
    pub kind: MediaKind,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
}
