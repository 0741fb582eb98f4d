//! Static catalog of known tracks.
//!
//! These entries are preferred lyric/audio uploads so the embedded player
//! does not reject them as restricted. The catalog also doubles as the
//! offline search corpus when the AI collaborator is unavailable.

use crate::models::{dedup_tracks, Track};

const INITIAL_SONGS: &[(&str, &str, &str)] = &[
    ("_dK2tDK9grQ", "Shape of You", "Ed Sheeran"),
    ("fHI8X4OXluQ", "Blinding Lights", "The Weeknd"),
    ("35y_h270-dY", "Levitating", "Dua Lipa"),
    ("i7e8a9f-F6k", "Peaches", "Justin Bieber"),
    ("yWRdK19bX9g", "Stay", "The Kid LAROI & Justin Bieber"),
    ("gJ9s3_91vKM", "Montero", "Lil Nas X"),
];

#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        let tracks = INITIAL_SONGS
            .iter()
            .map(|(id, title, artist)| {
                Track::new(
                    *id,
                    *title,
                    *artist,
                    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
                )
            })
            .collect();
        Self { tracks }
    }

    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks: dedup_tracks(tracks),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Case-insensitive substring match on title or artist.
    pub fn search(&self, query: &str) -> Vec<Track> {
        let needle = query.trim().to_lowercase();
        self.tracks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.artist.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Catalog followed by liked songs not already in it.
    pub fn with_liked(&self, liked: &[Track]) -> Vec<Track> {
        dedup_tracks(self.tracks.iter().chain(liked.iter()).cloned())
    }
}
