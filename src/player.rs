//! Glue between the playback engine and an embedded video widget.
//!
//! The widget only knows how to load, play, pause and seek a single video.
//! `PlayerBridge` pushes engine state into it (`sync`), pulls progress back
//! out of it (`poll`) and turns widget events into engine actions.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::MAX_AUTO_SKIPS;
use crate::engine::PlayerEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl WidgetState {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => WidgetState::Ended,
            1 => WidgetState::Playing,
            2 => WidgetState::Paused,
            3 => WidgetState::Buffering,
            5 => WidgetState::Cued,
            _ => WidgetState::Unstarted,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, WidgetState::Playing | WidgetState::Buffering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    Ready,
    StateChanged(i32),
    Error(i32),
}

pub trait VideoWidget: Send {
    fn load(&mut self, video_id: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: u8);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn state(&self) -> WidgetState;
}

struct BridgeInner<W> {
    widget: W,
    loaded: Option<String>,
    applied_playing: Option<bool>,
    applied_volume: Option<u8>,
    auto_skips: u32,
    seen_intent: u64,
}

impl<W> BridgeInner<W> {
    /// A user transport action since the last look re-arms auto-skipping.
    fn observe_intent(&mut self, user_intent: u64) {
        if user_intent != self.seen_intent {
            self.seen_intent = user_intent;
            if self.auto_skips > 0 {
                log::debug!("User action, clearing {} auto-skips", self.auto_skips);
            }
            self.auto_skips = 0;
        }
    }
}

pub struct PlayerBridge<W: VideoWidget> {
    engine: Arc<PlayerEngine>,
    inner: Mutex<BridgeInner<W>>,
    max_auto_skips: u32,
}

impl<W: VideoWidget> PlayerBridge<W> {
    pub fn new(engine: Arc<PlayerEngine>, widget: W) -> Self {
        Self::with_max_auto_skips(engine, widget, MAX_AUTO_SKIPS)
    }

    pub fn with_max_auto_skips(engine: Arc<PlayerEngine>, widget: W, max_auto_skips: u32) -> Self {
        Self {
            engine,
            inner: Mutex::new(BridgeInner {
                widget,
                loaded: None,
                applied_playing: None,
                applied_volume: None,
                auto_skips: 0,
                seen_intent: 0,
            }),
            max_auto_skips,
        }
    }

    pub fn engine(&self) -> &Arc<PlayerEngine> {
        &self.engine
    }

    pub fn auto_skips(&self) -> u32 {
        self.inner.lock().auto_skips
    }

    /// Called on explicit user action so a fresh run of errors may skip again.
    pub fn reset_auto_skips(&self) {
        self.inner.lock().auto_skips = 0;
    }

    pub fn handle_event(&self, event: WidgetEvent) {
        match event {
            WidgetEvent::Ready => {
                self.reset_auto_skips();
            }
            WidgetEvent::StateChanged(code) => match WidgetState::from_code(code) {
                WidgetState::Ended => {
                    self.engine.track_ended();
                }
                WidgetState::Playing => self.reset_auto_skips(),
                _ => {}
            },
            WidgetEvent::Error(code) => self.handle_error(code),
        }
        self.sync();
    }

    fn handle_error(&self, code: i32) {
        let state = self.engine.snapshot();
        let Some(current) = state.current else {
            return;
        };
        log::warn!("Widget error {} for {}", code, current.video_id);
        self.engine.mark_unplayable(current.video_id.clone());

        let skips = {
            let mut inner = self.inner.lock();
            inner.observe_intent(state.user_intent);
            inner.auto_skips += 1;
            inner.auto_skips
        };

        if skips > self.max_auto_skips {
            log::error!(
                "Giving up after {} consecutive unplayable tracks",
                self.max_auto_skips
            );
            self.engine.stop();
        } else {
            self.engine.skip_unplayable();
        }
    }

    /// Pushes the engine's current track, play state and volume into the widget.
    pub fn sync(&self) {
        let state = self.engine.snapshot();
        let mut inner = self.inner.lock();
        inner.observe_intent(state.user_intent);

        let wanted = state.current.as_ref().map(|t| t.video_id.clone());
        if wanted != inner.loaded {
            match &wanted {
                Some(id) => {
                    log::debug!("Loading video {}", id);
                    inner.widget.load(id);
                }
                None => inner.widget.pause(),
            }
            inner.loaded = wanted;
            inner.applied_playing = None;
        }

        if inner.loaded.is_some() && inner.applied_playing != Some(state.playing) {
            if state.playing {
                inner.widget.play();
            } else {
                inner.widget.pause();
            }
            inner.applied_playing = Some(state.playing);
        }

        if inner.applied_volume != Some(state.volume) {
            inner.widget.set_volume(state.volume);
            inner.applied_volume = Some(state.volume);
        }
    }

    /// Applies a pending seek and reports progress while the widget is
    /// playing or buffering.
    pub fn poll(&self) {
        if let Some(command) = self.engine.take_seek() {
            self.inner.lock().widget.seek(command.seconds);
        }

        let (active, elapsed, duration) = {
            let inner = self.inner.lock();
            (
                inner.widget.state().is_active(),
                inner.widget.current_time(),
                inner.widget.duration(),
            )
        };

        if active {
            self.engine.update_progress(elapsed, duration);
        }
    }
}

/// Runs `sync` and `poll` every `interval` until the handle is aborted.
pub fn spawn_poller<W>(bridge: Arc<PlayerBridge<W>>, interval: Duration) -> JoinHandle<()>
where
    W: VideoWidget + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            bridge.sync();
            bridge.poll();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;

    #[derive(Default)]
    struct FakeWidget {
        log: Arc<Mutex<Vec<String>>>,
        time: f64,
        length: f64,
        state: Option<WidgetState>,
    }

    impl FakeWidget {
        fn record(&self, entry: String) {
            self.log.lock().push(entry);
        }
    }

    impl VideoWidget for FakeWidget {
        fn load(&mut self, video_id: &str) {
            self.record(format!("load {}", video_id));
        }
        fn play(&mut self) {
            self.state = Some(WidgetState::Playing);
            self.record("play".into());
        }
        fn pause(&mut self) {
            self.state = Some(WidgetState::Paused);
            self.record("pause".into());
        }
        fn seek(&mut self, seconds: f64) {
            self.time = seconds;
            self.record(format!("seek {}", seconds));
        }
        fn set_volume(&mut self, volume: u8) {
            self.record(format!("volume {}", volume));
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn duration(&self) -> f64 {
            self.length
        }
        fn state(&self) -> WidgetState {
            self.state.unwrap_or(WidgetState::Unstarted)
        }
    }

    fn track(id: &str) -> Track {
        Track::from_video_id(id, id, "Artist")
    }

    fn setup(ids: &[&str]) -> (Arc<PlayerBridge<FakeWidget>>, Arc<Mutex<Vec<String>>>) {
        let engine = Arc::new(PlayerEngine::with_seed(3));
        let queue: Vec<Track> = ids.iter().map(|id| track(id)).collect();
        engine.play_track(queue[0].clone(), Some(queue));

        let log = Arc::new(Mutex::new(Vec::new()));
        let widget = FakeWidget {
            log: log.clone(),
            length: 200.0,
            ..Default::default()
        };
        (Arc::new(PlayerBridge::new(engine, widget)), log)
    }

    #[test]
    fn test_sync_loads_and_plays_once() {
        let (bridge, log) = setup(&["a", "b"]);
        bridge.sync();
        bridge.sync();

        assert_eq!(*log.lock(), vec!["load a", "play", "volume 80"]);

        bridge.engine().toggle_play();
        bridge.sync();
        assert_eq!(log.lock().last().map(String::as_str), Some("pause"));
    }

    #[test]
    fn test_ended_event_advances() {
        let (bridge, log) = setup(&["a", "b"]);
        bridge.sync();
        bridge.handle_event(WidgetEvent::StateChanged(0));

        assert!(bridge.engine().snapshot().is_current("b"));
        assert!(log.lock().contains(&"load b".to_string()));
    }

    #[test]
    fn test_errors_skip_then_give_up() {
        let (bridge, _log) = setup(&["a", "b", "c", "d", "e"]);
        bridge.sync();

        for _ in 0..3 {
            bridge.handle_event(WidgetEvent::Error(150));
        }
        let state = bridge.engine().snapshot();
        assert!(state.is_current("d"));
        assert!(state.playing);
        assert_eq!(state.unplayable.len(), 3);

        bridge.handle_event(WidgetEvent::Error(150));
        let state = bridge.engine().snapshot();
        assert!(state.is_current("d"));
        assert!(!state.playing);
        assert!(state.is_unplayable("d"));
    }

    #[test]
    fn test_user_pick_after_giving_up_rearms_skipping() {
        let (bridge, _log) = setup(&["a", "b", "c", "d", "e", "f", "g"]);
        bridge.sync();
        for _ in 0..4 {
            bridge.handle_event(WidgetEvent::Error(150));
        }
        assert!(!bridge.engine().snapshot().playing);

        bridge.engine().play_track(track("e"), None);
        bridge.sync();
        assert_eq!(bridge.auto_skips(), 0);

        bridge.handle_event(WidgetEvent::Error(150));
        let state = bridge.engine().snapshot();
        assert!(state.is_current("f"));
        assert!(state.playing);
        assert_eq!(bridge.auto_skips(), 1);
    }

    #[test]
    fn test_user_pick_counts_even_before_sync() {
        let (bridge, _log) = setup(&["a", "b", "c", "d", "e", "f"]);
        for _ in 0..4 {
            bridge.handle_event(WidgetEvent::Error(150));
        }

        bridge.engine().play_next();
        bridge.handle_event(WidgetEvent::Error(150));
        assert!(bridge.engine().snapshot().is_current("f"));
        assert_eq!(bridge.auto_skips(), 1);
    }

    #[test]
    fn test_playing_state_resets_skip_counter() {
        let (bridge, _log) = setup(&["a", "b", "c"]);
        bridge.handle_event(WidgetEvent::Error(100));
        assert_eq!(bridge.auto_skips(), 1);

        bridge.handle_event(WidgetEvent::StateChanged(1));
        assert_eq!(bridge.auto_skips(), 0);
    }

    #[test]
    fn test_poll_reports_progress_and_applies_seek() {
        let (bridge, log) = setup(&["a"]);
        bridge.sync();
        bridge.engine().seek_to(42.0);
        bridge.poll();

        let state = bridge.engine().snapshot();
        assert_eq!(state.elapsed, 42.0);
        assert_eq!(state.duration, 200.0);
        assert!(!state.seek.is_pending());
        assert!(log.lock().contains(&"seek 42".to_string()));
    }

    #[test]
    fn test_poll_ignores_paused_widget() {
        let (bridge, _log) = setup(&["a"]);
        bridge.engine().toggle_play();
        bridge.sync();
        bridge.poll();
        assert_eq!(bridge.engine().snapshot().elapsed, 0.0);
    }

    #[tokio::test]
    async fn test_poller_runs_until_aborted() {
        let (bridge, log) = setup(&["a"]);
        let handle = spawn_poller(bridge.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();

        assert!(log.lock().contains(&"load a".to_string()));
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
