//! Track search.
//!
//! Queries go to the AI collaborator with web grounding. Without
//! credentials, or when a call fails, the static catalog answers instead.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::genai::{extract_json_array, GenAiClient, GenerateRequest, GroundingChunk};
use crate::metadata::{clean_metadata, extract_video_id, is_video_id, strip_artist_affixes, VIDEO_ID_LEN};
use crate::models::{dedup_tracks, Track, UNKNOWN_ARTIST, UNKNOWN_TITLE};

pub const RESULT_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Ai,
    Catalog,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub tracks: Vec<Track>,
    pub source: SearchSource,
}

pub struct SearchGateway {
    ai: Option<Arc<dyn GenAiClient>>,
    catalog: Catalog,
}

impl SearchGateway {
    pub fn new(ai: Option<Arc<dyn GenAiClient>>, catalog: Catalog) -> Self {
        if ai.is_none() {
            log::warn!("No AI credentials configured, search runs against the local catalog");
        }
        Self { ai, catalog }
    }

    /// True when there is no collaborator for the whole session.
    pub fn is_fallback_mode(&self) -> bool {
        self.ai.is_none()
    }

    pub async fn search(&self, query: &str) -> SearchResults {
        let query = query.trim();
        if query.is_empty() {
            return SearchResults {
                tracks: Vec::new(),
                source: SearchSource::Catalog,
            };
        }

        let Some(ai) = &self.ai else {
            return self.local(query);
        };

        let direct_id = extract_video_id(query);
        let request = match &direct_id {
            Some(id) => GenerateRequest::new(identify_prompt(id)),
            None => GenerateRequest::new(search_prompt(query)),
        }
        .with_web_search();

        let response = match ai.generate(request).await {
            Ok(r) => r,
            Err(e) => {
                log::error!("{} search failed: {:#}", ai.id(), e);
                return self.local(query);
            }
        };

        let mut tracks = parse_search_text(&response.text);
        if tracks.is_empty() {
            tracks = tracks_from_grounding(&response.grounding);
        }
        let mut tracks = dedup_tracks(tracks);

        if tracks.is_empty() {
            if let Some(id) = direct_id {
                tracks.push(Track::from_video_id(id, UNKNOWN_TITLE, UNKNOWN_ARTIST));
            }
        }

        log::info!("Search '{}' returned {} tracks", query, tracks.len());
        SearchResults {
            tracks,
            source: SearchSource::Ai,
        }
    }

    fn local(&self, query: &str) -> SearchResults {
        log::info!("Searching local catalog for: \"{}\"", query);
        SearchResults {
            tracks: self.catalog.search(query),
            source: SearchSource::Catalog,
        }
    }
}

fn identify_prompt(video_id: &str) -> String {
    format!(
        r#"You are a music metadata extractor.
Identify the Song Title and Artist for this YouTube video ID: "{id}".

Return a strictly valid JSON array containing exactly one object:
[
  {{
    "title": "Song Title",
    "artist": "Artist Name",
    "videoId": "{id}"
  }}
]

If you cannot identify it, use "{unknown_title}" and "{unknown_artist}".
Do NOT include "Official Video" in the title."#,
        id = video_id,
        unknown_title = UNKNOWN_TITLE,
        unknown_artist = UNKNOWN_ARTIST,
    )
}

fn search_prompt(query: &str) -> String {
    format!(
        r#"Search YouTube for "{query}".
Return a list of {count} top music video results.
Prefer "Official Audio" or "Lyric Video".

Return a strictly valid JSON array.
Each object must have:
- "title": string (The song title ONLY. Do NOT include the artist name.)
- "artist": string (The artist name ONLY.)
- "videoId": string (The {len}-character YouTube ID)

Example: [{{"title": "Song", "artist": "Artist", "videoId": "xxxxxxxxxxx"}}]"#,
        query = query,
        count = RESULT_COUNT,
        len = VIDEO_ID_LEN,
    )
}

pub fn parse_search_text(text: &str) -> Vec<Track> {
    let Some(items) = extract_json_array(text) else {
        log::warn!("Search response had no parsable JSON array");
        return Vec::new();
    };

    items.iter().filter_map(track_from_item).collect()
}

fn track_from_item(item: &Value) -> Option<Track> {
    let video_id = item
        .get("videoId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| item.get("url").and_then(Value::as_str).and_then(extract_video_id))?;

    if !is_video_id(&video_id) {
        return None;
    }

    let artist = clean_metadata(item.get("artist").and_then(Value::as_str).unwrap_or(UNKNOWN_ARTIST));
    let title = clean_metadata(item.get("title").and_then(Value::as_str).unwrap_or(""));
    let title = strip_artist_affixes(&title, &artist);

    Some(Track::from_video_id(
        video_id,
        non_empty_or(title, UNKNOWN_TITLE),
        non_empty_or(artist, UNKNOWN_ARTIST),
    ))
}

/// Builds tracks from the web sources the model cited, splitting
/// "Artist - Title" page titles.
pub fn tracks_from_grounding(chunks: &[GroundingChunk]) -> Vec<Track> {
    chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| c.uri.contains("youtube.com") || c.uri.contains("youtu.be"))
        .filter_map(|(i, chunk)| {
            let video_id = extract_video_id(&chunk.uri)?;
            let full_title = chunk
                .title
                .clone()
                .unwrap_or_else(|| format!("Result {}", i + 1));
            let full_title = full_title
                .trim_end_matches("- YouTube")
                .trim_end_matches("| Official Video")
                .trim_end_matches("| Official Audio")
                .trim();

            let (artist, title) = split_artist_title(full_title);
            Some(Track::from_video_id(
                video_id,
                non_empty_or(clean_metadata(&title), UNKNOWN_TITLE),
                non_empty_or(clean_metadata(&artist), UNKNOWN_ARTIST),
            ))
        })
        .collect()
}

fn split_artist_title(full: &str) -> (String, String) {
    let separator = if full.contains(" - ") {
        " - "
    } else if full.contains(" | ") {
        " | "
    } else {
        return (UNKNOWN_ARTIST.to_string(), full.to_string());
    };

    let mut parts = full.split(separator);
    let artist = parts.next().unwrap_or_default().trim().to_string();
    let title = parts.collect::<Vec<_>>().join(" ").trim().to_string();
    (artist, title)
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
