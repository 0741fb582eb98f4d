use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{dedup_tracks, Track};

/// Pressing "previous" later than this restarts the current track instead.
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;
pub const DEFAULT_VOLUME: u8 = 80;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// off -> all -> one -> off
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeekCommand {
    pub seq: u64,
    pub seconds: f64,
}

/// Single-slot seek request. A new request overwrites an unconsumed one;
/// a consumed request stays visible for inspection but is never handed
/// out again.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeekSlot {
    command: Option<SeekCommand>,
    consumed: bool,
    next_seq: u64,
}

impl SeekSlot {
    fn request(&mut self, seconds: f64) -> u64 {
        self.next_seq += 1;
        self.command = Some(SeekCommand {
            seq: self.next_seq,
            seconds: seconds.max(0.0),
        });
        self.consumed = false;
        self.next_seq
    }

    /// Marks the request `seq` as consumed. Clearing an older sequence
    /// number leaves a newer pending request alone.
    fn consume(&mut self, seq: u64) -> bool {
        match &self.command {
            Some(cmd) if cmd.seq == seq && !self.consumed => {
                self.consumed = true;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<&SeekCommand> {
        if self.consumed {
            None
        } else {
            self.command.as_ref()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }
}

#[derive(Clone, Debug)]
pub enum PlayerAction {
    PlayTrack {
        track: Track,
        context: Option<Vec<Track>>,
    },
    SetQueue(Vec<Track>),
    TogglePlay,
    Stop,
    Next,
    Previous,
    /// The widget reported the end of the media.
    TrackEnded,
    /// Advance past a track the widget refused to play. Unlike `Next`
    /// this is not a user action.
    SkipUnplayable,
    UpdateProgress {
        elapsed: f64,
        duration: f64,
    },
    SeekTo(f64),
    ClearSeek(u64),
    SetVolume(u8),
    ToggleShuffle,
    ToggleRepeat,
    SetRepeat(RepeatMode),
    MarkUnplayable(String),
    ToggleLyrics,
    ToggleQueue,
}

impl PlayerAction {
    /// Transport actions the user triggers directly.
    pub fn is_user_transport(&self) -> bool {
        matches!(
            self,
            PlayerAction::PlayTrack { .. }
                | PlayerAction::TogglePlay
                | PlayerAction::Next
                | PlayerAction::Previous
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current: Option<Track>,
    pub playing: bool,
    pub queue: Vec<Track>,
    pub volume: u8,
    pub duration: f64,
    pub elapsed: f64,
    pub seek: SeekSlot,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub unplayable: HashSet<String>,
    pub lyrics_visible: bool,
    pub queue_visible: bool,
    /// Bumped by every user transport action that changed the state.
    pub user_intent: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current: None,
            playing: false,
            queue: Vec::new(),
            volume: DEFAULT_VOLUME,
            duration: 0.0,
            elapsed: 0.0,
            seek: SeekSlot::default(),
            shuffle: false,
            repeat: RepeatMode::Off,
            unplayable: HashSet::new(),
            lyrics_visible: false,
            queue_visible: false,
            user_intent: 0,
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of the current track already played, 0..=100.
    pub fn progress(&self) -> f64 {
        progress_percent(self.elapsed, self.duration)
    }

    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.queue.iter().position(|t| t.id == current.id)
    }

    pub fn is_current(&self, track_id: &str) -> bool {
        self.current.as_ref().is_some_and(|t| t.id == track_id)
    }

    pub fn is_unplayable(&self, video_id: &str) -> bool {
        self.unplayable.contains(video_id)
    }

    /// Tracks that have not failed to play this session.
    pub fn visible(&self, tracks: &[Track]) -> Vec<Track> {
        tracks
            .iter()
            .filter(|t| !self.is_unplayable(&t.video_id))
            .cloned()
            .collect()
    }

    /// Pure transition: returns the state after `action`. The receiver is
    /// never modified.
    pub fn reduce<R: Rng>(&self, action: PlayerAction, rng: &mut R) -> PlaybackState {
        let mut next = self.clone();
        let user_transport = action.is_user_transport();
        match action {
            PlayerAction::PlayTrack { track, context } => next.play_track(track, context),
            PlayerAction::SetQueue(tracks) => next.queue = dedup_tracks(tracks),
            PlayerAction::TogglePlay => {
                if next.current.is_some() {
                    next.playing = !next.playing;
                }
            }
            PlayerAction::Stop => next.playing = false,
            PlayerAction::Next | PlayerAction::SkipUnplayable => next.advance(rng),
            PlayerAction::Previous => next.retreat(rng),
            PlayerAction::TrackEnded => {
                if next.current.is_some() && next.repeat == RepeatMode::One {
                    next.restart_current();
                } else {
                    next.advance(rng);
                }
            }
            PlayerAction::UpdateProgress { elapsed, duration } => {
                next.elapsed = elapsed.max(0.0);
                next.duration = duration.max(0.0);
            }
            PlayerAction::SeekTo(seconds) => {
                next.seek.request(seconds);
            }
            PlayerAction::ClearSeek(seq) => {
                next.seek.consume(seq);
            }
            PlayerAction::SetVolume(volume) => next.volume = volume.min(100),
            PlayerAction::ToggleShuffle => next.shuffle = !next.shuffle,
            PlayerAction::ToggleRepeat => next.repeat = next.repeat.cycle(),
            PlayerAction::SetRepeat(mode) => next.repeat = mode,
            PlayerAction::MarkUnplayable(video_id) => {
                next.unplayable.insert(video_id);
            }
            PlayerAction::ToggleLyrics => next.lyrics_visible = !next.lyrics_visible,
            PlayerAction::ToggleQueue => next.queue_visible = !next.queue_visible,
        }
        if user_transport && next != *self {
            next.user_intent += 1;
        }
        next
    }

    fn play_track(&mut self, track: Track, context: Option<Vec<Track>>) {
        let same_track = self.is_current(&track.id);

        match context {
            Some(context) => self.queue = dedup_tracks(context),
            None => {
                if !self.queue.iter().any(|t| t.id == track.id) {
                    self.queue.insert(0, track.clone());
                }
            }
        }

        if same_track {
            // Already loaded: resume if paused, never restart.
            self.playing = true;
            return;
        }

        self.set_current(track);
    }

    fn set_current(&mut self, track: Track) {
        self.current = Some(track);
        self.playing = true;
        self.elapsed = 0.0;
        self.duration = 0.0;
    }

    fn restart_current(&mut self) {
        self.seek.request(0.0);
        self.elapsed = 0.0;
        self.playing = true;
    }

    fn advance<R: Rng>(&mut self, rng: &mut R) {
        if self.current.is_none() || self.queue.is_empty() {
            return;
        }

        let len = self.queue.len();
        let current = self.current_index();

        let next_index = if self.shuffle && len > 1 {
            Some(random_other_index(len, current, rng))
        } else {
            let candidate = current.map(|i| i + 1).unwrap_or(0);
            if candidate < len {
                Some(candidate)
            } else if self.repeat == RepeatMode::All {
                Some(0)
            } else {
                None
            }
        };

        match next_index {
            Some(index) => self.move_to(index),
            None => {
                // End of queue: keep the track and queue so the UI can show "ended".
                self.playing = false;
                self.elapsed = 0.0;
            }
        }
    }

    fn retreat<R: Rng>(&mut self, rng: &mut R) {
        if self.current.is_none() {
            return;
        }

        if self.elapsed > RESTART_THRESHOLD_SECS {
            self.restart_current();
            return;
        }

        if self.queue.is_empty() {
            return;
        }

        let len = self.queue.len();
        let current = self.current_index();

        let prev_index = if self.shuffle && len > 1 {
            random_other_index(len, current, rng)
        } else {
            match current {
                Some(0) | None => {
                    if self.repeat == RepeatMode::All {
                        len - 1
                    } else {
                        0
                    }
                }
                Some(i) => i - 1,
            }
        };

        if Some(prev_index) == current {
            return;
        }
        self.move_to(prev_index);
    }

    fn move_to(&mut self, index: usize) {
        let track = self.queue[index].clone();
        if self.is_current(&track.id) {
            self.restart_current();
        } else {
            self.set_current(track);
        }
    }
}

pub fn progress_percent(elapsed: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        (elapsed / duration * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Uniform pick over `0..len` excluding `current` (requires `len > 1`).
fn random_other_index<R: Rng>(len: usize, current: Option<usize>, rng: &mut R) -> usize {
    match current {
        Some(cur) => {
            let pick = rng.random_range(0..len - 1);
            if pick >= cur {
                pick + 1
            } else {
                pick
            }
        }
        None => rng.random_range(0..len),
    }
}
