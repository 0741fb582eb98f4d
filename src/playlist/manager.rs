use chrono::Utc;
use uuid::Uuid;

use super::models::Playlist;
use crate::errors::AppError;
use crate::models::{dedup_tracks, Track};

const BUILTIN_PLAYLISTS: &[(&str, &str, &str)] = &[
    ("p1", "Chill Mix", "https://picsum.photos/300/300?random=10"),
    ("p2", "Top Hits", "https://picsum.photos/300/300?random=11"),
    ("p3", "Focus", "https://picsum.photos/300/300?random=12"),
    ("p4", "Workout", "https://picsum.photos/300/300?random=13"),
];

/// User playlists plus the read-only built-in mixes.
///
/// Only user playlists are persisted; built-ins are rebuilt from the
/// catalog on every start.
pub struct PlaylistManager {
    builtin: Vec<Playlist>,
    playlists: Vec<Playlist>,
}

impl PlaylistManager {
    pub fn new(playlists: Vec<Playlist>, builtin_tracks: &[Track]) -> Self {
        let builtin = BUILTIN_PLAYLISTS
            .iter()
            .map(|(id, title, cover)| Playlist {
                id: id.to_string(),
                title: title.to_string(),
                tracks: builtin_tracks.to_vec(),
                cover: Some(cover.to_string()),
                description: None,
                custom: false,
                created_at: String::new(),
            })
            .collect();

        let playlists = playlists.into_iter().filter(|p| p.custom).collect();

        Self { builtin, playlists }
    }

    /// User playlists, the slice that gets persisted.
    pub fn custom(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn builtin(&self) -> &[Playlist] {
        &self.builtin
    }

    pub fn all(&self) -> impl Iterator<Item = &Playlist> {
        self.builtin.iter().chain(self.playlists.iter())
    }

    pub fn get(&self, id: &str) -> Option<&Playlist> {
        self.all().find(|p| p.id == id)
    }

    pub fn create(&mut self, title: &str, initial_tracks: Option<Vec<Track>>) -> Playlist {
        let tracks = dedup_tracks(initial_tracks.unwrap_or_default());
        let cover = tracks.first().map(|t| t.thumbnail.clone());

        let playlist = Playlist {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            tracks,
            cover,
            description: None,
            custom: true,
            created_at: Utc::now().to_rfc3339(),
        };

        log::info!("Created playlist '{}' ({})", playlist.title, playlist.id);
        self.playlists.push(playlist.clone());
        playlist
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), AppError> {
        let playlist = self.custom_mut(id)?;
        playlist.title = title.trim().to_string();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<Playlist, AppError> {
        self.custom_mut(id)?;
        let index = self
            .playlists
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::PlaylistNotFound(id.to_string()))?;
        let removed = self.playlists.remove(index);
        log::info!("Deleted playlist '{}'", removed.title);
        Ok(removed)
    }

    /// Returns `false` when the track was already present.
    pub fn add_track(&mut self, id: &str, track: Track) -> Result<bool, AppError> {
        let playlist = self.custom_mut(id)?;
        if playlist.contains(&track.id) {
            return Ok(false);
        }

        // The cover is fixed by the first track a playlist ever received.
        if playlist.cover.is_none() {
            playlist.cover = Some(track.thumbnail.clone());
        }
        playlist.tracks.push(track);
        Ok(true)
    }

    /// Returns `false` when the track was not in the playlist.
    pub fn remove_track(&mut self, id: &str, track_id: &str) -> Result<bool, AppError> {
        let playlist = self.custom_mut(id)?;
        let before = playlist.tracks.len();
        playlist.tracks.retain(|t| t.id != track_id);
        Ok(playlist.tracks.len() != before)
    }

    fn custom_mut(&mut self, id: &str) -> Result<&mut Playlist, AppError> {
        if self.builtin.iter().any(|p| p.id == id) {
            return Err(AppError::ReadOnly(id.to_string()));
        }
        self.playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::PlaylistNotFound(id.to_string()))
    }
}
