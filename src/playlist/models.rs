use serde::{Deserialize, Serialize};

use crate::models::Track;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub cover: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_custom")]
    pub custom: bool,
    #[serde(default)]
    pub created_at: String,
}

fn default_custom() -> bool {
    true
}

impl Playlist {
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
