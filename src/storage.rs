//! Keyed string persistence for the four user-data slices.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use crate::errors::AppError;
use crate::models::Track;
use crate::playlist::Playlist;

pub const LIKED_SONGS_KEY: &str = "uMusic_likedSongs";
pub const PLAYLISTS_KEY: &str = "uMusic_playlists";
pub const FOLLOWS_KEY: &str = "uMusic_follows";
pub const ARTIST_MAPPING_KEY: &str = "uMusic_artistMapping";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// One `<key>.json` file per key.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        // Temp file plus rename keeps the previous slice intact on failure.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed load/save on top of a `KeyValueStore`. Loads never fail and
/// saves never surface errors; state simply stays in memory.
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load_liked(&self) -> Vec<Track> {
        self.load(LIKED_SONGS_KEY)
    }

    pub fn save_liked(&self, liked: &[Track]) {
        self.save(LIKED_SONGS_KEY, liked)
    }

    pub fn load_playlists(&self) -> Vec<Playlist> {
        self.load(PLAYLISTS_KEY)
    }

    pub fn save_playlists(&self, playlists: &[Playlist]) {
        self.save(PLAYLISTS_KEY, playlists)
    }

    pub fn load_follows(&self) -> Vec<String> {
        self.load(FOLLOWS_KEY)
    }

    pub fn save_follows(&self, follows: &[String]) {
        self.save(FOLLOWS_KEY, follows)
    }

    pub fn load_artist_mapping(&self) -> BTreeMap<String, String> {
        self.load(ARTIST_MAPPING_KEY)
    }

    pub fn save_artist_mapping(&self, mapping: &BTreeMap<String, String>) {
        self.save(ARTIST_MAPPING_KEY, mapping)
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.store.get(key) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding corrupt data under {}: {}", key, e);
                T::default()
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(AppError::from)
            .and_then(|json| self.store.set(key, &json));

        if let Err(e) = result {
            log::error!("Failed to persist {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::Storage("disk full".into()))
        }
    }

    #[test]
    fn test_missing_keys_load_defaults() {
        let persistence = Persistence::new(Box::new(MemoryStore::new()));
        assert!(persistence.load_liked().is_empty());
        assert!(persistence.load_playlists().is_empty());
        assert!(persistence.load_follows().is_empty());
        assert!(persistence.load_artist_mapping().is_empty());
    }

    #[test]
    fn test_corrupt_data_loads_default() {
        let store = MemoryStore::new();
        store.set(LIKED_SONGS_KEY, "{not json").unwrap();
        store.set(FOLLOWS_KEY, r#"{"wrong": "shape"}"#).unwrap();

        let persistence = Persistence::new(Box::new(store));
        assert!(persistence.load_liked().is_empty());
        assert!(persistence.load_follows().is_empty());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let persistence = Persistence::new(Box::new(BrokenStore));
        persistence.save_follows(&["Adele".to_string()]);
        assert!(persistence.load_follows().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data")).unwrap();
        let persistence = Persistence::new(Box::new(store));

        let liked = vec![Track::from_video_id("abcdefghijk", "Song", "Artist")];
        let mut mapping = BTreeMap::new();
        mapping.insert("Weeknd".to_string(), "The Weeknd".to_string());

        persistence.save_liked(&liked);
        persistence.save_artist_mapping(&mapping);

        let reopened = Persistence::new(Box::new(JsonFileStore::new(dir.path().join("data")).unwrap()));
        assert_eq!(reopened.load_liked(), liked);
        assert_eq!(reopened.load_artist_mapping(), mapping);
        assert!(dir.path().join("data").join("uMusic_likedSongs.json").exists());
    }

    #[test]
    fn test_liked_songs_wire_format() {
        let store = MemoryStore::new();
        store
            .set(
                LIKED_SONGS_KEY,
                r#"[{"id":"abcdefghijk","title":"T","artist":"A","thumbnail":"x","videoId":"abcdefghijk"}]"#,
            )
            .unwrap();
        let liked = Persistence::new(Box::new(store)).load_liked();
        assert_eq!(liked[0].video_id, "abcdefghijk");
    }
}
