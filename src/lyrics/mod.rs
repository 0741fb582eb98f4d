use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::genai::{extract_json_array, GenAiClient, GenerateRequest};
use crate::metadata::{clean_metadata, strip_artist};

pub mod lrc;
pub mod lrclib;

pub use lrc::parse_lrc;
pub use lrclib::LrcLibClient;

/// Used when the caller does not know the track length yet.
pub const DEFAULT_DURATION_SECONDS: f64 = 200.0;

pub const LYRICS_CACHE_CAPACITY: usize = 128;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LyricLine {
    pub time: f64,
    pub text: String,
}

impl LyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LyricsSource {
    LrcLib,
    Ai,
    Placeholder,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Lyrics {
    pub lines: Vec<LyricLine>,
    pub source: LyricsSource,
}

impl Lyrics {
    pub fn placeholder() -> Self {
        Self {
            lines: vec![
                LyricLine::new(5.0, "Lyrics not available"),
                LyricLine::new(10.0, "Enjoy the music"),
            ],
            source: LyricsSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == LyricsSource::Placeholder
    }
}

/// Index of the line being sung at `elapsed`: the last line whose time is
/// not after `elapsed`. `None` before the first line.
pub fn active_line(lines: &[LyricLine], elapsed: f64) -> Option<usize> {
    let after = lines.partition_point(|line| line.time <= elapsed);
    after.checked_sub(1)
}

/// Insertion-ordered cache; the oldest entry goes first once full.
struct LyricsCache {
    capacity: usize,
    entries: HashMap<String, Lyrics>,
    order: VecDeque<String>,
}

impl LyricsCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&Lyrics> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, lyrics: Lyrics) {
        if self.entries.insert(key.clone(), lyrics).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct LyricsGateway {
    lrclib: Option<LrcLibClient>,
    ai: Option<Arc<dyn GenAiClient>>,
    cache: Mutex<LyricsCache>,
}

impl LyricsGateway {
    pub fn new(lrclib: Option<LrcLibClient>, ai: Option<Arc<dyn GenAiClient>>) -> Self {
        Self {
            lrclib,
            ai,
            cache: Mutex::new(LyricsCache::new(LYRICS_CACHE_CAPACITY)),
        }
    }

    pub fn from_config(config: &AppConfig, ai: Option<Arc<dyn GenAiClient>>) -> Self {
        let lrclib = match LrcLibClient::new(&config.lrclib_base_url, config.request_timeout()) {
            Ok(client) => Some(client),
            Err(e) => {
                log::error!("Failed to build LRCLib client: {}", e);
                None
            }
        };
        Self::new(lrclib, ai)
    }

    /// Never fails. Tiers: LRCLib exact, LRCLib search, AI, placeholder.
    pub async fn get_lyrics(&self, title: &str, artist: &str, duration: f64) -> Lyrics {
        let duration = if duration > 0.0 {
            duration
        } else {
            DEFAULT_DURATION_SECONDS
        };

        let clean_artist = clean_metadata(artist);
        let clean_title = strip_artist(&clean_metadata(title), &clean_artist);
        let cache_id = format!("{}|{}", clean_artist, clean_title).to_lowercase();

        if let Some(cached) = self.cache.lock().get(&cache_id) {
            log::debug!("Lyrics cache hit for {}", cache_id);
            return cached.clone();
        }

        let found = match self.from_lrclib(&clean_title, &clean_artist, duration).await {
            Some(lyrics) => Some(lyrics),
            None => self.from_ai(&clean_title, &clean_artist, duration).await,
        };

        match found {
            Some(lyrics) => {
                self.cache.lock().insert(cache_id, lyrics.clone());
                lyrics
            }
            None => {
                log::warn!("No lyrics found for {} - {}", clean_artist, clean_title);
                Lyrics::placeholder()
            }
        }
    }

    async fn from_lrclib(&self, title: &str, artist: &str, duration: f64) -> Option<Lyrics> {
        let client = self.lrclib.as_ref()?;

        match client.synced_lyrics(title, artist, duration).await {
            Ok(Some(text)) => {
                let lines = parse_lrc(&text);
                if lines.is_empty() {
                    return None;
                }
                log::info!("Found synced lyrics on LRCLib");
                Some(Lyrics {
                    lines,
                    source: LyricsSource::LrcLib,
                })
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("LRCLib lookup failed: {}", e);
                None
            }
        }
    }

    async fn from_ai(&self, title: &str, artist: &str, duration: f64) -> Option<Lyrics> {
        let ai = self.ai.as_ref()?;

        let request = GenerateRequest::new(lyrics_prompt(title, artist, duration))
            .with_schema(lyrics_schema());

        let response = match ai.generate(request).await {
            Ok(r) => r,
            Err(e) => {
                log::error!("AI lyrics request failed: {:#}", e);
                return None;
            }
        };

        let lines = parse_ai_lines(&response.text);
        if lines.is_empty() {
            return None;
        }
        log::info!("Generated lyrics via {}", ai.id());
        Some(Lyrics {
            lines,
            source: LyricsSource::Ai,
        })
    }
}

fn lyrics_prompt(title: &str, artist: &str, duration: f64) -> String {
    format!(
        "Provide the synchronized lyrics for the song \"{title}\" by \"{artist}\". \
         The song is about {} seconds long. \
         Return a JSON array of objects with \"time\" (seconds from the start, number) \
         and \"text\" (the lyric line). Spread the timestamps across the whole song.",
        duration.round() as u64
    )
}

fn lyrics_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "time": { "type": "NUMBER" },
                "text": { "type": "STRING" }
            },
            "required": ["time", "text"]
        }
    })
}

/// Lenient: entries missing a numeric time or non-empty text are skipped.
fn parse_ai_lines(text: &str) -> Vec<LyricLine> {
    let Some(items) = extract_json_array(text) else {
        return Vec::new();
    };

    let mut lines: Vec<LyricLine> = items
        .into_iter()
        .filter_map(|item| {
            let time = item.get("time")?.as_f64()?;
            let text = item.get("text")?.as_str()?.trim();
            if text.is_empty() || !time.is_finite() {
                return None;
            }
            Some(LyricLine::new(time, text))
        })
        .collect();

    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::GenerateResponse;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FakeAi {
        reply: anyhow::Result<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeAi {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(anyhow::anyhow!("quota exceeded")),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenAiClient for FakeAi {
        fn id(&self) -> &str {
            "fake"
        }

        async fn generate(&self, request: GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.calls.lock().push(request.prompt);
            match &self.reply {
                Ok(text) => Ok(GenerateResponse {
                    text: text.clone(),
                    grounding: Vec::new(),
                }),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    fn unreachable_lrclib() -> Option<LrcLibClient> {
        Some(LrcLibClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap())
    }

    #[test]
    fn test_active_line() {
        let lines = vec![
            LyricLine::new(5.0, "a"),
            LyricLine::new(10.0, "b"),
            LyricLine::new(15.0, "c"),
        ];
        assert_eq!(active_line(&lines, 0.0), None);
        assert_eq!(active_line(&lines, 5.0), Some(0));
        assert_eq!(active_line(&lines, 9.99), Some(0));
        assert_eq!(active_line(&lines, 12.0), Some(1));
        assert_eq!(active_line(&lines, 400.0), Some(2));
        assert_eq!(active_line(&[], 3.0), None);
    }

    #[test]
    fn test_parse_ai_lines_sorts_and_skips_bad_entries() {
        let text = r#"```json
[{"time": 12.5, "text": "second"}, {"time": 2, "text": "first"}, {"time": "x", "text": "bad"}, {"time": 20, "text": "  "}]
```"#;
        let lines = parse_ai_lines(text);
        assert_eq!(
            lines,
            vec![LyricLine::new(2.0, "first"), LyricLine::new(12.5, "second")]
        );
    }

    #[tokio::test]
    async fn test_no_match_anywhere_yields_placeholder() {
        let gateway = LyricsGateway::new(unreachable_lrclib(), Some(FakeAi::failing()));
        let lyrics = gateway.get_lyrics("Nothing", "Nobody", 180.0).await;

        assert!(lyrics.is_placeholder());
        assert!(!lyrics.lines.is_empty());
        assert!(lyrics.lines.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(lyrics, Lyrics::placeholder());
    }

    #[tokio::test]
    async fn test_no_collaborators_yields_placeholder() {
        let gateway = LyricsGateway::new(None, None);
        let lyrics = gateway.get_lyrics("Song", "Artist", 0.0).await;
        assert_eq!(lyrics, Lyrics::placeholder());
    }

    #[tokio::test]
    async fn test_ai_tier_used_after_lrclib_miss() {
        let ai = FakeAi::replying(r#"[{"time": 10, "text": "la"}, {"time": 1, "text": "da"}]"#);
        let gateway = LyricsGateway::new(unreachable_lrclib(), Some(ai.clone()));

        let lyrics = gateway
            .get_lyrics("Shape of You (Official Video)", "Ed Sheeran", -1.0)
            .await;

        assert_eq!(lyrics.source, LyricsSource::Ai);
        assert_eq!(lyrics.lines[0].text, "da");

        let prompts = ai.calls.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"Shape of You\""));
        assert!(prompts[0].contains("200 seconds"));
    }

    #[test]
    fn test_cache_evicts_oldest_past_capacity() {
        let mut cache = LyricsCache::new(2);
        let lyrics = Lyrics {
            lines: vec![LyricLine::new(1.0, "x")],
            source: LyricsSource::LrcLib,
        };

        cache.insert("a|1".into(), lyrics.clone());
        cache.insert("b|2".into(), lyrics.clone());
        cache.insert("a|1".into(), lyrics.clone());
        cache.insert("c|3".into(), lyrics);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a|1").is_none());
        assert!(cache.get("b|2").is_some());
        assert!(cache.get("c|3").is_some());
    }

    #[tokio::test]
    async fn test_found_lyrics_are_cached() {
        let ai = FakeAi::replying(r#"[{"time": 1, "text": "hello"}]"#);
        let gateway = LyricsGateway::new(None, Some(ai.clone()));

        let first = gateway.get_lyrics("Hello", "Adele", 295.0).await;
        let second = gateway.get_lyrics("Hello [MV]", "Adele", 295.0).await;

        assert_eq!(first, second);
        assert_eq!(ai.calls.lock().len(), 1);
    }
}
