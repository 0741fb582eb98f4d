//! Application facade.
//!
//! Owns the engine, gateways and user data, and persists each data slice
//! whenever it changes. Async lookups are tagged with a `RequestGuard`
//! ticket so a response for a superseded subject is dropped on arrival.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::artists::ArtistResolver;
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::engine::PlayerEngine;
use crate::errors::AppError;
use crate::genai::{GeminiClient, GenAiClient};
use crate::library::LibraryManager;
use crate::lyrics::{Lyrics, LyricsGateway};
use crate::models::Track;
use crate::player::{PlayerBridge, VideoWidget};
use crate::playlist::{Playlist, PlaylistManager};
use crate::queue::PlaybackState;
use crate::search::{SearchGateway, SearchResults};
use crate::storage::{JsonFileStore, KeyValueStore, Persistence};

/// Monotonic ticket counter. Only the latest ticket is current.
#[derive(Default)]
pub struct RequestGuard {
    latest: AtomicU64,
}

impl RequestGuard {
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

pub struct MusicApp {
    config: AppConfig,
    engine: Arc<PlayerEngine>,
    search: SearchGateway,
    lyrics: LyricsGateway,
    library: RwLock<LibraryManager>,
    playlists: RwLock<PlaylistManager>,
    persistence: Persistence,
    search_results: RwLock<Vec<Track>>,
    search_guard: RequestGuard,
    lyrics_guard: RequestGuard,
}

impl MusicApp {
    pub fn new(
        config: AppConfig,
        store: Box<dyn KeyValueStore>,
        ai: Option<Arc<dyn GenAiClient>>,
    ) -> Self {
        let persistence = Persistence::new(store);
        let catalog = Catalog::builtin();

        let library = LibraryManager::new(
            catalog.clone(),
            persistence.load_liked(),
            persistence.load_follows(),
            ArtistResolver::from_mapping(persistence.load_artist_mapping()),
        );
        let playlists = PlaylistManager::new(persistence.load_playlists(), catalog.tracks());

        log::info!(
            "Loaded {} liked songs, {} playlists",
            library.liked().len(),
            playlists.custom().len()
        );

        Self {
            search: SearchGateway::new(ai.clone(), catalog),
            lyrics: LyricsGateway::from_config(&config, ai),
            engine: Arc::new(PlayerEngine::new()),
            library: RwLock::new(library),
            playlists: RwLock::new(playlists),
            persistence,
            search_results: RwLock::new(Vec::new()),
            search_guard: RequestGuard::default(),
            lyrics_guard: RequestGuard::default(),
            config,
        }
    }

    /// File-backed store under `config.data_dir` and a Gemini client when
    /// an API key is configured.
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let store = JsonFileStore::new(&config.data_dir)?;

        let ai: Option<Arc<dyn GenAiClient>> = match GeminiClient::from_config(&config) {
            Some(Ok(client)) => Some(Arc::new(client)),
            Some(Err(e)) => {
                log::error!("Failed to initialize Gemini client: {:#}", e);
                None
            }
            None => None,
        };

        Ok(Self::new(config, Box::new(store), ai))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<PlayerEngine> {
        &self.engine
    }

    pub fn state(&self) -> PlaybackState {
        self.engine.snapshot()
    }

    pub fn is_fallback_mode(&self) -> bool {
        self.search.is_fallback_mode()
    }

    pub fn attach_widget<W: VideoWidget>(&self, widget: W) -> PlayerBridge<W> {
        PlayerBridge::with_max_auto_skips(self.engine.clone(), widget, self.config.max_auto_skips)
    }

    // Search

    /// `None` when a newer search started before this one finished.
    pub async fn search(&self, query: &str) -> Option<SearchResults> {
        let ticket = self.search_guard.begin();
        let results = self.search.search(query).await;

        if !self.search_guard.is_current(ticket) {
            log::debug!("Discarding stale results for '{}'", query);
            return None;
        }

        *self.search_results.write() = results.tracks.clone();
        Some(results)
    }

    /// Raw results of the latest search, unplayable tracks included.
    pub fn search_results(&self) -> Vec<Track> {
        self.search_results.read().clone()
    }

    pub fn visible_search_results(&self) -> Vec<Track> {
        self.engine.visible(&self.search_results.read())
    }

    // Lyrics

    /// Lyrics for the current track, or `None` if there is no current
    /// track or it changed while the lookup was in flight.
    pub async fn lyrics_for_current(&self) -> Option<Lyrics> {
        let state = self.engine.snapshot();
        let track = state.current?;
        let ticket = self.lyrics_guard.begin();

        let lyrics = self
            .lyrics
            .get_lyrics(&track.title, &track.artist, state.duration)
            .await;

        if !self.lyrics_guard.is_current(ticket) || !self.engine.snapshot().is_current(&track.id) {
            log::debug!("Discarding stale lyrics for {}", track.id);
            return None;
        }
        Some(lyrics)
    }

    pub async fn lyrics(&self, title: &str, artist: &str, duration: f64) -> Lyrics {
        self.lyrics.get_lyrics(title, artist, duration).await
    }

    // Playback

    pub fn play_track(&self, track: Track, context: Option<Vec<Track>>) -> PlaybackState {
        self.engine.play_track(track, context)
    }

    pub fn play_playlist(&self, id: &str) -> Result<PlaybackState, AppError> {
        let tracks = self
            .playlists
            .read()
            .get(id)
            .map(|p| self.engine.visible(&p.tracks))
            .ok_or_else(|| AppError::PlaylistNotFound(id.to_string()))?;

        match tracks.first().cloned() {
            Some(first) => Ok(self.engine.play_track(first, Some(tracks))),
            None => Ok(self.engine.snapshot()),
        }
    }

    // Library

    pub fn toggle_like(&self, track: Track) -> bool {
        let mut library = self.library.write();
        let liked = library.toggle_like(track);
        self.persistence.save_liked(library.liked());
        liked
    }

    pub fn is_liked(&self, track_id: &str) -> bool {
        self.library.read().is_liked(track_id)
    }

    pub fn liked_songs(&self) -> Vec<Track> {
        self.library.read().liked().to_vec()
    }

    pub fn all_songs(&self) -> Vec<Track> {
        let songs = self.library.read().all_songs();
        self.engine.visible(&songs)
    }

    pub fn toggle_follow(&self, artist: &str) -> bool {
        let mut library = self.library.write();
        let following = library.toggle_follow(artist);
        self.persistence.save_follows(library.follows());
        following
    }

    pub fn is_following(&self, artist: &str) -> bool {
        self.library.read().is_following(artist)
    }

    pub fn artists(&self) -> Vec<String> {
        self.library.read().artists()
    }

    pub fn artist_tracks(&self, master: &str) -> Vec<Track> {
        let tracks = self.library.read().artist_tracks(master);
        self.engine.visible(&tracks)
    }

    pub fn resolve_artist(&self, name: &str) -> String {
        self.library.read().resolver().resolve(name).to_string()
    }

    pub fn merge_artist(&self, alias: &str, target: &str) {
        let mut library = self.library.write();
        library.merge_artist(alias, target);
        self.persistence.save_artist_mapping(library.resolver().mapping());
        self.persistence.save_follows(library.follows());
    }

    pub fn unmerge_artist(&self, alias: &str) -> bool {
        let mut library = self.library.write();
        let removed = library.unmerge_artist(alias);
        if removed {
            self.persistence.save_artist_mapping(library.resolver().mapping());
        }
        removed
    }

    // Playlists

    pub fn playlists(&self) -> Vec<Playlist> {
        self.playlists.read().all().cloned().collect()
    }

    pub fn playlist(&self, id: &str) -> Option<Playlist> {
        self.playlists.read().get(id).cloned()
    }

    pub fn create_playlist(&self, title: &str, initial_tracks: Option<Vec<Track>>) -> Playlist {
        let mut playlists = self.playlists.write();
        let created = playlists.create(title, initial_tracks);
        self.persistence.save_playlists(playlists.custom());
        created
    }

    pub fn rename_playlist(&self, id: &str, title: &str) -> Result<(), AppError> {
        self.edit_playlists(|p| p.rename(id, title))
    }

    pub fn delete_playlist(&self, id: &str) -> Result<(), AppError> {
        self.edit_playlists(|p| p.delete(id).map(|_| ()))
    }

    pub fn add_to_playlist(&self, id: &str, track: Track) -> Result<bool, AppError> {
        self.edit_playlists(|p| p.add_track(id, track))
    }

    pub fn remove_from_playlist(&self, id: &str, track_id: &str) -> Result<bool, AppError> {
        self.edit_playlists(|p| p.remove_track(id, track_id))
    }

    fn edit_playlists<T>(
        &self,
        edit: impl FnOnce(&mut PlaylistManager) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut playlists = self.playlists.write();
        let result = edit(&mut playlists)?;
        self.persistence.save_playlists(playlists.custom());
        Ok(result)
    }
}
