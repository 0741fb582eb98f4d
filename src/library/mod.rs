use std::collections::BTreeSet;

use crate::artists::ArtistResolver;
use crate::catalog::Catalog;
use crate::models::Track;

/// Liked songs, followed artists and the artist alias map, plus the views
/// derived from them.
pub struct LibraryManager {
    catalog: Catalog,
    liked: Vec<Track>,
    follows: Vec<String>,
    artists: ArtistResolver,
}

impl LibraryManager {
    pub fn new(
        catalog: Catalog,
        liked: Vec<Track>,
        follows: Vec<String>,
        artists: ArtistResolver,
    ) -> Self {
        Self {
            catalog,
            liked,
            follows,
            artists,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Most recently liked first.
    pub fn liked(&self) -> &[Track] {
        &self.liked
    }

    pub fn is_liked(&self, track_id: &str) -> bool {
        self.liked.iter().any(|t| t.id == track_id)
    }

    /// Returns whether the track is liked afterwards.
    pub fn toggle_like(&mut self, track: Track) -> bool {
        if let Some(index) = self.liked.iter().position(|t| t.id == track.id) {
            self.liked.remove(index);
            log::debug!("Unliked {}", track.id);
            false
        } else {
            log::debug!("Liked {}", track.id);
            self.liked.insert(0, track);
            true
        }
    }

    pub fn follows(&self) -> &[String] {
        &self.follows
    }

    pub fn is_following(&self, artist: &str) -> bool {
        let master = self.artists.resolve(artist);
        self.follows.iter().any(|f| f == master)
    }

    /// Follows are stored by master name. Returns whether the artist is
    /// followed afterwards.
    pub fn toggle_follow(&mut self, artist: &str) -> bool {
        let master = self.artists.resolve(artist).to_string();
        if let Some(index) = self.follows.iter().position(|f| *f == master) {
            self.follows.remove(index);
            false
        } else {
            self.follows.push(master);
            true
        }
    }

    pub fn resolver(&self) -> &ArtistResolver {
        &self.artists
    }

    pub fn merge_artist(&mut self, alias: &str, target: &str) {
        self.artists.merge(alias, target);
        self.rebind_follows();
    }

    pub fn unmerge_artist(&mut self, alias: &str) -> bool {
        self.artists.unmerge(alias)
    }

    /// Catalog plus liked songs, deduplicated by id.
    pub fn all_songs(&self) -> Vec<Track> {
        self.catalog.with_liked(&self.liked)
    }

    /// Distinct master artist names over all songs, sorted.
    pub fn artists(&self) -> Vec<String> {
        self.all_songs()
            .iter()
            .map(|t| self.artists.resolve(&t.artist).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn artist_tracks(&self, master: &str) -> Vec<Track> {
        self.all_songs()
            .into_iter()
            .filter(|t| self.artists.resolve(&t.artist) == master)
            .collect()
    }

    // A followed alias that just got merged now follows its master.
    fn rebind_follows(&mut self) {
        let mut seen = BTreeSet::new();
        let resolver = &self.artists;
        self.follows = self
            .follows
            .iter()
            .map(|f| resolver.resolve(f).to_string())
            .filter(|f| seen.insert(f.clone()))
            .collect();
    }
}
