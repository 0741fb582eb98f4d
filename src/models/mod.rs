use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A playable item. `id` and `video_id` carry the same external reference;
/// two tracks are equal when their ids are.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail: String,
    pub video_id: String,
}

impl Track {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        let video_id = video_id.into();
        Self {
            id: video_id.clone(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: thumbnail.into(),
            video_id,
        }
    }

    /// Builds a track whose thumbnail is the platform's default still.
    pub fn from_video_id(
        video_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        let video_id = video_id.into();
        let thumbnail = thumbnail_url(&video_id);
        Self::new(video_id, title, artist, thumbnail)
    }

    /// Generated avatar used when the thumbnail fails to load.
    pub fn fallback_thumbnail(&self) -> String {
        format!(
            "https://ui-avatars.com/api/?name={}&background=333&color=fff",
            urlencoding::encode(&self.title)
        )
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

/// Keeps the first occurrence of every id, preserving order.
pub fn dedup_tracks(tracks: impl IntoIterator<Item = Track>) -> Vec<Track> {
    let mut seen = std::collections::HashSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_by_id() {
        let a = Track::from_video_id("abcdefghijk", "One", "X");
        let mut b = a.clone();
        b.title = "Other".into();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let x = Track::from_video_id("x", "X", "A");
        let y = Track::from_video_id("y", "Y", "A");
        let mut x2 = x.clone();
        x2.title = "X again".into();

        let out = dedup_tracks(vec![x.clone(), x2, y.clone()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "X");
        assert_eq!(out[1], y);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let t = Track::from_video_id("abc", "T", "A");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["videoId"], "abc");
        assert_eq!(json["thumbnail"], "https://img.youtube.com/vi/abc/hqdefault.jpg");
    }

    #[test]
    fn test_fallback_thumbnail_is_encoded() {
        let t = Track::from_video_id("abc", "Shape of You", "Ed Sheeran");
        assert!(t.fallback_thumbnail().contains("name=Shape%20of%20You"));
    }
}
