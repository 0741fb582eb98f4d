//! State container for playback.
//!
//! Every operation is a `PlayerAction` run through `PlaybackState::reduce`
//! and committed as a whole-state replacement. Consumers hold an
//! `Arc<PlayerEngine>` and either read snapshots or subscribe to changes.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;

use crate::models::Track;
use crate::queue::{PlaybackState, PlayerAction, SeekCommand};

pub struct PlayerEngine {
    state: watch::Sender<PlaybackState>,
    rng: Mutex<StdRng>,
}

impl Default for PlayerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic shuffle order, mostly for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let (state, _) = watch::channel(PlaybackState::new());
        Self {
            state,
            rng: Mutex::new(rng),
        }
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// Receivers are notified only when an action actually changed state.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: PlayerAction) -> PlaybackState {
        let mut rng = self.rng.lock();
        log::debug!("Dispatching {}", action_name(&action));

        self.state.send_if_modified(|state| {
            let next = state.reduce(action, &mut *rng);
            if next == *state {
                false
            } else {
                *state = next;
                true
            }
        });
        self.snapshot()
    }

    pub fn play_track(&self, track: Track, context: Option<Vec<Track>>) -> PlaybackState {
        log::info!("Playing: {} - {}", track.artist, track.title);
        self.dispatch(PlayerAction::PlayTrack { track, context })
    }

    pub fn set_queue(&self, tracks: Vec<Track>) -> PlaybackState {
        self.dispatch(PlayerAction::SetQueue(tracks))
    }

    pub fn toggle_play(&self) -> PlaybackState {
        self.dispatch(PlayerAction::TogglePlay)
    }

    pub fn stop(&self) -> PlaybackState {
        self.dispatch(PlayerAction::Stop)
    }

    pub fn play_next(&self) -> PlaybackState {
        self.dispatch(PlayerAction::Next)
    }

    pub fn play_previous(&self) -> PlaybackState {
        self.dispatch(PlayerAction::Previous)
    }

    pub fn track_ended(&self) -> PlaybackState {
        self.dispatch(PlayerAction::TrackEnded)
    }

    /// Advance after a playback failure without counting as a user action.
    pub fn skip_unplayable(&self) -> PlaybackState {
        self.dispatch(PlayerAction::SkipUnplayable)
    }

    pub fn update_progress(&self, elapsed: f64, duration: f64) -> PlaybackState {
        self.dispatch(PlayerAction::UpdateProgress { elapsed, duration })
    }

    pub fn seek_to(&self, seconds: f64) -> PlaybackState {
        self.dispatch(PlayerAction::SeekTo(seconds))
    }

    pub fn clear_seek_signal(&self, seq: u64) -> PlaybackState {
        self.dispatch(PlayerAction::ClearSeek(seq))
    }

    /// Returns the pending seek, if any, and marks it consumed in the same
    /// state transition.
    pub fn take_seek(&self) -> Option<SeekCommand> {
        let mut rng = self.rng.lock();
        let mut taken = None;
        self.state.send_if_modified(|state| {
            let pending = state.seek.pending().cloned();
            match pending {
                Some(cmd) => {
                    *state = state.reduce(PlayerAction::ClearSeek(cmd.seq), &mut *rng);
                    taken = Some(cmd);
                    true
                }
                None => false,
            }
        });
        taken
    }

    pub fn set_volume(&self, volume: u8) -> PlaybackState {
        self.dispatch(PlayerAction::SetVolume(volume))
    }

    pub fn toggle_shuffle(&self) -> PlaybackState {
        self.dispatch(PlayerAction::ToggleShuffle)
    }

    pub fn toggle_repeat(&self) -> PlaybackState {
        self.dispatch(PlayerAction::ToggleRepeat)
    }

    pub fn mark_unplayable(&self, video_id: impl Into<String>) -> PlaybackState {
        let video_id = video_id.into();
        log::warn!("Marking {} as unplayable", video_id);
        self.dispatch(PlayerAction::MarkUnplayable(video_id))
    }

    pub fn toggle_lyrics(&self) -> PlaybackState {
        self.dispatch(PlayerAction::ToggleLyrics)
    }

    pub fn toggle_queue(&self) -> PlaybackState {
        self.dispatch(PlayerAction::ToggleQueue)
    }

    pub fn visible(&self, tracks: &[Track]) -> Vec<Track> {
        self.state.borrow().visible(tracks)
    }
}

fn action_name(action: &PlayerAction) -> &'static str {
    match action {
        PlayerAction::PlayTrack { .. } => "PlayTrack",
        PlayerAction::SetQueue(_) => "SetQueue",
        PlayerAction::TogglePlay => "TogglePlay",
        PlayerAction::Stop => "Stop",
        PlayerAction::Next => "Next",
        PlayerAction::Previous => "Previous",
        PlayerAction::TrackEnded => "TrackEnded",
        PlayerAction::SkipUnplayable => "SkipUnplayable",
        PlayerAction::UpdateProgress { .. } => "UpdateProgress",
        PlayerAction::SeekTo(_) => "SeekTo",
        PlayerAction::ClearSeek(_) => "ClearSeek",
        PlayerAction::SetVolume(_) => "SetVolume",
        PlayerAction::ToggleShuffle => "ToggleShuffle",
        PlayerAction::ToggleRepeat => "ToggleRepeat",
        PlayerAction::SetRepeat(_) => "SetRepeat",
        PlayerAction::MarkUnplayable(_) => "MarkUnplayable",
        PlayerAction::ToggleLyrics => "ToggleLyrics",
        PlayerAction::ToggleQueue => "ToggleQueue",
    }
}
