use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::AppError;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LrcLibResponse {
    pub id: u64,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub instrumental: bool,
    pub plain_lyrics: Option<String>,
    pub synced_lyrics: Option<String>,
}

impl LrcLibResponse {
    pub fn synced(&self) -> Option<&str> {
        self.synced_lyrics
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

pub struct LrcLibClient {
    client: Client,
    base_url: String,
}

impl LrcLibClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("umusic/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Exact signature lookup. `Ok(None)` on 404.
    pub async fn get(
        &self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<LrcLibResponse>, AppError> {
        let url = format!("{}/api/get", self.base_url);
        let duration = (duration.floor() as u64).to_string();
        let params = [
            ("artist_name", artist),
            ("track_name", title),
            ("duration", duration.as_str()),
        ];

        log::info!("Fetching LRCLib lyrics for: {} - {}", title, artist);

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(Some(response.json::<LrcLibResponse>().await?));
        }
        if status.as_u16() == 404 {
            log::info!("LRCLib direct fetch not found (404)");
        } else {
            log::warn!("LRCLib request failed: {}", status);
        }
        Ok(None)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<LrcLibResponse>, AppError> {
        let url = format!("{}/api/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!("LRCLib search failed: {}", response.status());
            return Ok(Vec::new());
        }

        Ok(response.json().await?)
    }

    /// Synced lyrics text, trying the exact lookup before a fuzzy search.
    pub async fn synced_lyrics(
        &self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<String>, AppError> {
        if let Some(found) = self.get(title, artist, duration).await? {
            if let Some(synced) = found.synced() {
                return Ok(Some(synced.to_string()));
            }
        }

        log::info!("Falling back to LRCLib search...");
        let results = self.search(&format!("{} {}", title, artist)).await?;
        Ok(pick_closest(&results, duration)
            .and_then(LrcLibResponse::synced)
            .map(str::to_string))
    }
}

/// Among results with synced lyrics, the one whose duration is closest to
/// `duration`. Results without a duration sort last.
pub fn pick_closest(results: &[LrcLibResponse], duration: f64) -> Option<&LrcLibResponse> {
    results
        .iter()
        .filter(|r| r.synced().is_some())
        .min_by(|a, b| {
            let da = a.duration.map(|d| (d - duration).abs()).unwrap_or(f64::INFINITY);
            let db = b.duration.map(|d| (d - duration).abs()).unwrap_or(f64::INFINITY);
            da.total_cmp(&db)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, duration: Option<f64>, synced: Option<&str>) -> LrcLibResponse {
        LrcLibResponse {
            id,
            duration,
            synced_lyrics: synced.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_pick_closest_prefers_nearest_duration() {
        let results = vec![
            entry(1, Some(180.0), Some("[00:01.00]a")),
            entry(2, Some(233.0), Some("[00:01.00]b")),
            entry(3, Some(230.0), None),
            entry(4, None, Some("[00:01.00]d")),
        ];
        assert_eq!(pick_closest(&results, 230.0).map(|r| r.id), Some(2));
        assert_eq!(pick_closest(&results, 10.0).map(|r| r.id), Some(1));
    }

    #[test]
    fn test_pick_closest_ignores_blank_synced() {
        let results = vec![entry(1, Some(200.0), Some("   "))];
        assert!(pick_closest(&results, 200.0).is_none());
    }

    #[test]
    fn test_response_parses_api_shape() {
        let json = r#"{
            "id": 3396226,
            "trackName": "I Want to Live",
            "artistName": "Borislav Slavov",
            "albumName": "Baldur's Gate 3",
            "duration": 233,
            "instrumental": false,
            "plainLyrics": "I feel your breath",
            "syncedLyrics": "[00:17.12] I feel your breath"
        }"#;
        let parsed: LrcLibResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.duration, Some(233.0));
        assert_eq!(parsed.synced(), Some("[00:17.12] I feel your breath"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let client = LrcLibClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(client.synced_lyrics("a", "b", 100.0).await.is_err());
    }
}
