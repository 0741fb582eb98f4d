use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const LRCLIB_BASE_URL: &str = "https://lrclib.net";
pub const REQUEST_TIMEOUT_SECONDS: u64 = 5;
pub const POLL_INTERVAL_MS: u64 = 200;
pub const MAX_AUTO_SKIPS: u32 = 3;

pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("umusic")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub gemini_base_url: String,
    pub lrclib_base_url: String,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_auto_skips: u32,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            lrclib_base_url: LRCLIB_BASE_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECONDS,
            poll_interval_ms: POLL_INTERVAL_MS,
            max_auto_skips: MAX_AUTO_SKIPS,
            data_dir: get_data_dir(),
        }
    }
}

impl AppConfig {
    /// Reads the API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .or_else(|| std::env::var("API_KEY").ok());

        let mut config = Self {
            api_key: sanitize_api_key(api_key),
            ..Self::default()
        };

        if let Ok(model) = std::env::var("UMUSIC_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        if let Ok(dir) = std::env::var("UMUSIC_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir.trim());
            }
        }

        config
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Blank keys and the literal string "undefined" count as missing.
pub fn sanitize_api_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && k != "undefined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_api_key() {
        assert_eq!(sanitize_api_key(None), None);
        assert_eq!(sanitize_api_key(Some("   ".into())), None);
        assert_eq!(sanitize_api_key(Some("undefined".into())), None);
        assert_eq!(
            sanitize_api_key(Some(" abc ".into())),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(!config.has_credentials());
        assert_eq!(config.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.max_auto_skips, 3);
        assert_eq!(config.model, "gemini-2.5-flash");
    }
}
