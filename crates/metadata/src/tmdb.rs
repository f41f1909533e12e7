//! TMDB (The Movie Database) provider client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use seriestrack_core::types::MediaKind;
use tracing::debug;

use crate::MetadataError;
use crate::provider::{MetadataProvider, SearchResult};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

pub struct TmdbClient {
    api_key: String,
    language: String,
    base_url: String,
    client: reqwest::Client,
}

impl TmdbClient {
    pub fn new(api_key: String, language: String) -> Self {
        Self {
            api_key,
            language,
            base_url: BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at another API root (a proxy or a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, MetadataError> {
        let mut all_params = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound);
        }

        if !resp.status().is_success() {
            return Err(MetadataError::Provider(format!(
                "TMDB returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| MetadataError::Provider(format!("parse JSON: {e}")))
    }

    async fn search(
        &self,
        path: &str,
        query: &str,
        kind: MediaKind,
    ) -> Result<Vec<SearchResult>, MetadataError> {
        let data = self.get_json(path, &[("query", query)]).await?;
        Ok(parse_search_results(&data, kind))
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn search_movie(&self, query: &str) -> Result<Vec<SearchResult>, MetadataError> {
        self.search("/search/movie", query, MediaKind::Movie).await
    }

    async fn search_series(&self, query: &str) -> Result<Vec<SearchResult>, MetadataError> {
        self.search("/search/tv", query, MediaKind::Series).await
    }

    async fn get_series_details(
        &self,
        provider_id: u64,
    ) -> Result<serde_json::Value, MetadataError> {
        self.get_json(&format!("/tv/{provider_id}"), &[]).await
    }
}

/// Movie results carry `title`/`release_date`, TV results `name`/`first_air_date`.
fn parse_search_results(data: &serde_json::Value, kind: MediaKind) -> Vec<SearchResult> {
    let (name_key, date_key) = match kind {
        MediaKind::Movie => ("title", "release_date"),
        MediaKind::Series => ("name", "first_air_date"),
    };
    let results = data["results"].as_array().cloned().unwrap_or_default();

    results
        .iter()
        .take(10)
        .filter_map(|r| {
            let provider_id = r["id"].as_u64().filter(|id| *id != 0)?;
            Some(SearchResult {
                provider_id,
                name: r[name_key].as_str().unwrap_or("Unknown").to_string(),
                kind,
                year: r[date_key]
                    .as_str()
                    .and_then(|d| d.get(..4))
                    .and_then(|y| y.parse().ok()),
                overview: r["overview"]
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string()),
                poster_url: r["poster_path"]
                    .as_str()
                    .map(|p| format!("{IMAGE_BASE}/w500{p}")),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tv_search_results() {
        let json = serde_json::json!({
            "page": 1,
            "results": [
                {
                    "id": 123456,
                    "name": "地狱模式",
                    "first_air_date": "2024-01-01",
                    "overview": "",
                    "poster_path": "/hell.jpg",
                    "genre_ids": [16]
                },
                { "id": 0, "name": "broken" }
            ]
        });

        let results = parse_search_results(&json, MediaKind::Series);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider_id, 123456);
        assert_eq!(results[0].name, "地狱模式");
        assert_eq!(results[0].year, Some(2024));
        assert_eq!(results[0].overview, None);
        assert!(results[0].poster_url.as_ref().unwrap().ends_with("/w500/hell.jpg"));
    }

    #[test]
    fn parse_movie_search_results() {
        let json = serde_json::json!({
            "results": [
                { "id": 916224, "title": "Suzume", "release_date": "2022-11-11" }
            ]
        });

        let results = parse_search_results(&json, MediaKind::Movie);
        assert_eq!(results[0].name, "Suzume");
        assert_eq!(results[0].kind, MediaKind::Movie);
        assert_eq!(results[0].year, Some(2022));
    }

    #[test]
    fn missing_results_is_empty() {
        let json = serde_json::json!({ "status_message": "Invalid API key" });
        assert!(parse_search_results(&json, MediaKind::Series).is_empty());
    }

    /// Serve one canned HTTP response on a local port; yields the request line.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}/"), handle)
    }

    #[tokio::test]
    async fn search_hits_configured_base_url() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"results":[{"id":123456,"name":"地狱模式","first_air_date":"2024-01-06"}]}"#,
        )
        .await;
        let client = TmdbClient::new("key".into(), "zh-CN".into()).with_base_url(base);

        let results = client.search_series("Hell Mode").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider_id, 123456);

        let line = request.await.unwrap();
        assert!(line.starts_with("GET /search/tv?"));
        assert!(line.contains("language=zh-CN"));
        assert!(line.contains("query=Hell+Mode"));
    }

    #[tokio::test]
    async fn missing_series_maps_to_not_found() {
        let (base, _request) = serve_once("404 Not Found", "{}").await;
        let client = TmdbClient::new("key".into(), "zh-CN".into()).with_base_url(base);
        assert!(matches!(
            client.get_series_details(1).await,
            Err(MetadataError::NotFound)
        ));
    }
}
