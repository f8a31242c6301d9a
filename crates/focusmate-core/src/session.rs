//! A running focus session.
//!
//! [`FocusSession`] applies the engine's transitions: it persists counters,
//! plays the cue, fires the notification and points the audio channel at
//! the next phase's track, in that order, before the next tick is read.
//! [`run_session`] is the cooperative loop that feeds it ticks and user
//! commands on a single task.

use chrono::Utc;
use rand::Rng;
use rand_pcg::Mcg128Xsl64;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::audio::AudioPlayer;
use crate::events::Event;
use crate::notify::NotificationGateway;
use crate::storage::{SessionStore, Settings};
use crate::timer::{Cadence, PhaseEngine, SessionCounters, TickSource, Transition};

/// Volume change applied by `VolumeUp` / `VolumeDown`.
pub const VOLUME_STEP: u8 = 10;

/// User input while the timer view is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    TogglePause,
    /// Focus track by URL.
    SetMusic(String),
    /// Track for the current phase by 1-based index or URL.
    SelectTrack(String),
    SetVolume(u8),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    End,
}

/// Passed to the `run_session` observer after each tick or command.
#[derive(Debug, Clone, Copy)]
pub enum Update<'a> {
    /// A tick that did not complete the phase.
    Tick,
    /// A tick that completed the phase.
    Transition(&'a Transition),
    /// A command that changed observable state.
    Event(&'a Event),
    /// A command with no event of its own, such as a volume change.
    Command,
}

/// What the user sees when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub sessions_completed_today: u32,
    pub cycles_completed: u32,
    pub log: Vec<String>,
}

pub struct FocusSession<R = Mcg128Xsl64> {
    engine: PhaseEngine<R>,
    audio: AudioPlayer,
    gateway: NotificationGateway,
    store: SessionStore,
    settings: Settings,
    ended: bool,
}

impl FocusSession<Mcg128Xsl64> {
    pub fn start_with_entropy(
        store: SessionStore,
        settings: Settings,
        cadence: Cadence,
        audio: AudioPlayer,
        gateway: NotificationGateway,
    ) -> Self {
        use rand::SeedableRng;
        Self::start(store, settings, cadence, audio, gateway, Mcg128Xsl64::from_entropy())
    }
}

impl<R: Rng> FocusSession<R> {
    /// Begin a session at the top of a focus phase.
    ///
    /// Saves `settings` as the next defaults, asks for notification
    /// permission when the user opted in, and starts the focus track.
    pub fn start(
        store: SessionStore,
        settings: Settings,
        cadence: Cadence,
        audio: AudioPlayer,
        gateway: NotificationGateway,
        rng: R,
    ) -> Self {
        let catalog = *store.catalog();
        let settings = Settings {
            music: catalog.resolve_focus_url(&settings.music).to_string(),
            notifications: settings.notifications,
        };
        if let Err(e) = store.save_settings(&settings) {
            warn!(error = %e, "failed to save settings");
        }
        gateway.request_permission(settings.notifications);

        let counters = store.load_counters();
        let engine = PhaseEngine::new(cadence, catalog, counters, &settings, rng);
        let mut session = Self {
            engine,
            audio,
            gateway,
            store,
            settings,
            ended: false,
        };
        session.sync_audio();
        info!(
            music = %session.settings.music,
            notifications = session.settings.notifications,
            sessions = counters.sessions_completed_today,
            "session started"
        );
        session
    }

    pub fn started_event(&self) -> Event {
        Event::SessionStarted {
            music: self.settings.music.clone(),
            notifications: self.settings.notifications,
            at: Utc::now(),
        }
    }

    pub fn engine(&self) -> &PhaseEngine<R> {
        &self.engine
    }

    pub fn audio(&self) -> &AudioPlayer {
        &self.audio
    }

    pub fn gateway(&self) -> &NotificationGateway {
        &self.gateway
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn counters(&self) -> SessionCounters {
        self.engine.counters()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Advance one second and apply any resulting transition.
    pub fn tick(&mut self) -> Option<Transition> {
        if self.ended {
            return None;
        }
        let transition = self.engine.tick()?;

        if let Some(counters) = transition.counters {
            if let Err(e) = self.store.save(&counters) {
                warn!(error = %e, "failed to persist counters");
            }
        }
        self.audio.play_cue(transition.cue);
        if let Some(body) = transition.notification {
            self.gateway.notify(body);
        }
        self.sync_audio();

        info!(
            from = ?transition.from,
            to = ?transition.to,
            sessions = self.engine.counters().sessions_completed_today,
            cycles = self.engine.counters().cycles_completed,
            "phase complete"
        );
        Some(transition)
    }

    pub fn toggle_pause(&mut self) -> Event {
        let paused = self.engine.toggle_pause();
        if paused {
            self.audio.pause();
        } else {
            self.audio.resume();
        }
        let seconds_remaining = self.engine.seconds_remaining();
        if paused {
            Event::TimerPaused {
                seconds_remaining,
                at: Utc::now(),
            }
        } else {
            Event::TimerResumed {
                seconds_remaining,
                at: Utc::now(),
            }
        }
    }

    /// Change the focus track. Returns `None` when nothing changed.
    pub fn set_music(&mut self, url: &str) -> Option<Event> {
        if !self.engine.set_music(url) {
            return None;
        }
        self.settings.music = self.engine.focus_url().to_string();
        self.sync_audio();
        Some(Event::MusicChanged {
            url: self.settings.music.clone(),
            at: Utc::now(),
        })
    }

    /// Replace the rolled track of the current break.
    pub fn set_break_track(&mut self, url: &str) -> Option<Event> {
        if !self.engine.set_break_track(url) {
            return None;
        }
        self.sync_audio();
        Some(Event::MusicChanged {
            url: self.engine.current_url().to_string(),
            at: Utc::now(),
        })
    }

    /// Pick a track for the current phase from its own list. Focus picks
    /// become the saved default; break picks last until the break ends.
    pub fn select_track(&mut self, selector: &str) -> Option<Event> {
        let phase = self.engine.phase();
        let Some(track) = self.engine.catalog().lookup(phase, selector) else {
            warn!(selector, ?phase, "no such track for this phase");
            return None;
        };
        if phase.is_break() {
            self.set_break_track(track.url)
        } else {
            self.set_music(track.url)
        }
    }

    pub fn set_volume(&mut self, percent: u8) {
        self.audio.set_volume(percent);
    }

    pub fn volume_up(&mut self) {
        self.audio
            .set_volume(self.audio.volume().saturating_add(VOLUME_STEP));
    }

    pub fn volume_down(&mut self) {
        self.audio
            .set_volume(self.audio.volume().saturating_sub(VOLUME_STEP));
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.audio.toggle_mute()
    }

    /// Stop the session and release the audio channel. Safe to call twice.
    pub fn end(&mut self) -> SessionSummary {
        if !self.ended {
            self.ended = true;
            self.audio.release();
            info!("session ended");
        }
        let counters = self.engine.counters();
        SessionSummary {
            sessions_completed_today: counters.sessions_completed_today,
            cycles_completed: counters.cycles_completed,
            log: self.engine.log().to_vec(),
        }
    }

    pub fn ended_event(&self) -> Event {
        let counters = self.engine.counters();
        Event::SessionEnded {
            sessions_completed_today: counters.sessions_completed_today,
            cycles_completed: counters.cycles_completed,
            at: Utc::now(),
        }
    }

    /// Apply a command and return the event it produced, if any.
    pub fn apply(&mut self, command: SessionCommand) -> Option<Event> {
        match command {
            SessionCommand::TogglePause => Some(self.toggle_pause()),
            SessionCommand::SetMusic(url) => self.set_music(&url),
            SessionCommand::SelectTrack(selector) => self.select_track(&selector),
            SessionCommand::SetVolume(percent) => {
                self.set_volume(percent);
                None
            }
            SessionCommand::VolumeUp => {
                self.volume_up();
                None
            }
            SessionCommand::VolumeDown => {
                self.volume_down();
                None
            }
            SessionCommand::ToggleMute => {
                self.toggle_mute();
                None
            }
            SessionCommand::End => {
                self.end();
                Some(self.ended_event())
            }
        }
    }

    fn sync_audio(&mut self) {
        let url = self.engine.current_url();
        self.audio.sync(url, self.engine.is_paused());
    }
}

/// Drive `session` until the user ends it or the tick source runs dry.
///
/// Commands are handled before ticks when both are ready. `on_update` is
/// called after every tick and every command with an [`Update`] saying what
/// happened. The tick source is stopped and the session ended before
/// returning.
pub async fn run_session<R, T, F>(
    session: &mut FocusSession<R>,
    ticker: &mut T,
    commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
    mut on_update: F,
) -> SessionSummary
where
    R: Rng,
    T: TickSource,
    F: FnMut(&FocusSession<R>, Update<'_>),
{
    ticker.start();
    let mut commands_open = true;
    loop {
        tokio::select! {
            biased;
            command = commands.recv(), if commands_open => {
                match command {
                    Some(command) => {
                        let event = session.apply(command);
                        on_update(&*session, event.as_ref().map_or(Update::Command, Update::Event));
                        if session.is_ended() {
                            break;
                        }
                    }
                    // Input closed; keep ticking until the source stops.
                    None => commands_open = false,
                }
            }
            ticked = ticker.next_tick() => {
                if !ticked {
                    break;
                }
                let transition = session.tick();
                on_update(&*session, transition.as_ref().map_or(Update::Tick, Update::Transition));
            }
        }
    }
    ticker.stop();
    session.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Cue, MediaChannel};
    use crate::catalog::{Catalog, FOCUS_TRACKS, SHORT_BREAK_TRACKS};
    use crate::error::{NotifyError, PlaybackError};
    use crate::notify::{Notifier, Permission};
    use crate::storage::{KvStore, MemoryKv, SESSIONS_KEY, SETTINGS_KEY};
    use crate::timer::{ManualTicker, Phase};
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Channel {
        loads: Rc<RefCell<Vec<String>>>,
        cues: Rc<RefCell<Vec<Cue>>>,
        playing: Rc<RefCell<bool>>,
        released: Rc<RefCell<bool>>,
    }

    impl MediaChannel for Channel {
        fn load(&mut self, url: &str) {
            *self.playing.borrow_mut() = false;
            self.loads.borrow_mut().push(url.to_string());
        }
        fn play(&mut self) -> Result<(), PlaybackError> {
            *self.playing.borrow_mut() = true;
            Ok(())
        }
        fn pause(&mut self) {
            *self.playing.borrow_mut() = false;
        }
        fn set_volume(&mut self, _volume: f32) {}
        fn set_muted(&mut self, _muted: bool) {}
        fn set_looping(&mut self, _looping: bool) {}
        fn play_cue(&mut self, cue: Cue) -> Result<(), PlaybackError> {
            self.cues.borrow_mut().push(cue);
            Ok(())
        }
        fn release(&mut self) {
            *self.released.borrow_mut() = true;
            *self.playing.borrow_mut() = false;
        }
    }

    #[derive(Default)]
    struct Inbox {
        shown: Mutex<Vec<String>>,
    }

    impl Notifier for Inbox {
        fn request_permission(&self) -> Permission {
            Permission::Granted
        }
        fn show(&self, _title: &str, body: &str) -> Result<(), NotifyError> {
            self.shown.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    struct Rig {
        session: FocusSession,
        kv: MemoryKv,
        channel: Channel,
        inbox: Arc<Inbox>,
    }

    fn rig(cadence: Cadence, notifications: bool) -> Rig {
        let kv = MemoryKv::new();
        let channel = Channel::default();
        let inbox = Arc::new(Inbox::default());
        let store = SessionStore::new(Box::new(kv.clone()), Catalog::builtin());
        let session = FocusSession::start(
            store,
            Settings {
                music: FOCUS_TRACKS[1].url.to_string(),
                notifications,
            },
            cadence,
            AudioPlayer::new(Box::new(channel.clone()), 70),
            NotificationGateway::new(inbox.clone(), "FocusMate"),
            Mcg128Xsl64::seed_from_u64(11),
        );
        Rig {
            session,
            kv,
            channel,
            inbox,
        }
    }

    fn short() -> Cadence {
        Cadence {
            focus_secs: 3,
            short_break_secs: 2,
            long_break_secs: 4,
            sessions_before_long_break: 4,
        }
    }

    #[test]
    fn start_saves_settings_and_plays_focus_track() {
        let rig = rig(short(), true);
        let saved = rig.kv.get(SETTINGS_KEY).unwrap().unwrap();
        assert!(saved.contains(FOCUS_TRACKS[1].url));
        assert_eq!(rig.channel.loads.borrow().as_slice(), [FOCUS_TRACKS[1].url]);
        assert!(*rig.channel.playing.borrow());
        assert_eq!(rig.session.gateway().permission(), Permission::Granted);
    }

    #[test]
    fn focus_completion_persists_cues_notifies_and_switches_track() {
        let mut rig = rig(short(), true);
        let mut transition = None;
        for _ in 0..3 {
            transition = rig.session.tick();
        }
        let t = transition.expect("focus completes on the third tick");
        assert_eq!(t.to, Phase::ShortBreak);
        assert_eq!(rig.kv.get(SESSIONS_KEY).unwrap().as_deref(), Some("1"));
        assert_eq!(rig.channel.cues.borrow().as_slice(), [Cue::FocusComplete]);
        assert_eq!(rig.inbox.shown.lock().unwrap().len(), 1);

        let roll = rig.session.engine().break_roll().unwrap();
        assert_eq!(rig.session.audio().source(), Some(roll.track.url));
        assert_eq!(rig.channel.loads.borrow().len(), 2);
    }

    #[test]
    fn disabled_notifications_still_transition() {
        let mut rig = rig(short(), false);
        for _ in 0..5 {
            rig.session.tick();
        }
        assert_eq!(rig.session.engine().phase(), Phase::Focus);
        assert_eq!(rig.session.counters().sessions_completed_today, 1);
        assert!(rig.inbox.shown.lock().unwrap().is_empty());
        assert_eq!(
            rig.channel.cues.borrow().as_slice(),
            [Cue::FocusComplete, Cue::BreakOver]
        );
    }

    #[test]
    fn pause_halts_playback_and_countdown() {
        let mut rig = rig(short(), false);
        rig.session.tick();
        assert!(matches!(rig.session.toggle_pause(), Event::TimerPaused { seconds_remaining: 2, .. }));
        assert!(!*rig.channel.playing.borrow());
        for _ in 0..10 {
            assert!(rig.session.tick().is_none());
        }
        assert_eq!(rig.session.engine().seconds_remaining(), 2);
        assert!(matches!(rig.session.toggle_pause(), Event::TimerResumed { .. }));
        assert!(*rig.channel.playing.borrow());
    }

    #[test]
    fn set_music_with_current_track_does_not_reload() {
        let mut rig = rig(short(), false);
        assert!(rig.session.set_music(FOCUS_TRACKS[1].url).is_none());
        assert_eq!(rig.channel.loads.borrow().len(), 1);
        assert!(rig.session.set_music(FOCUS_TRACKS[4].url).is_some());
        assert_eq!(rig.channel.loads.borrow().len(), 2);
        assert_eq!(rig.session.settings().music, FOCUS_TRACKS[4].url);
    }

    #[test]
    fn break_track_selection_uses_the_break_list() {
        let mut rig = rig(short(), false);
        assert!(rig.session.select_track("3").is_some());
        assert_eq!(rig.session.settings().music, FOCUS_TRACKS[2].url);
        for _ in 0..3 {
            rig.session.tick();
        }
        assert_eq!(rig.session.engine().phase(), Phase::ShortBreak);
        let rolled = rig.session.engine().break_roll().unwrap().track;
        let index = SHORT_BREAK_TRACKS.iter().position(|t| *t != rolled).unwrap();
        let loads = rig.channel.loads.borrow().len();

        match rig.session.select_track(&(index + 1).to_string()) {
            Some(Event::MusicChanged { url, .. }) => assert_eq!(url, SHORT_BREAK_TRACKS[index].url),
            other => panic!("Expected MusicChanged, got {other:?}"),
        }
        assert_eq!(rig.session.audio().source(), Some(SHORT_BREAK_TRACKS[index].url));
        assert_eq!(rig.channel.loads.borrow().len(), loads + 1);
        assert_eq!(rig.session.engine().seconds_remaining(), 2);
        assert!(rig.session.select_track("99").is_none());
        assert!(rig.session.set_music(FOCUS_TRACKS[0].url).is_none());
        assert_eq!(rig.session.settings().music, FOCUS_TRACKS[2].url);
        let saved = rig.kv.get(SETTINGS_KEY).unwrap().unwrap();
        assert!(saved.contains(FOCUS_TRACKS[2].url));

        for _ in 0..2 {
            rig.session.tick();
        }
        assert_eq!(rig.session.audio().source(), Some(FOCUS_TRACKS[2].url));
    }

    #[test]
    fn counters_at_the_limit_survive_a_completed_focus() {
        let kv = MemoryKv::new();
        kv.set(SESSIONS_KEY, &u32::MAX.to_string()).unwrap();
        let store = SessionStore::new(Box::new(kv.clone()), Catalog::builtin());
        let mut session = FocusSession::start(
            store,
            Settings::defaults(&Catalog::builtin()),
            Cadence {
                focus_secs: 1,
                ..short()
            },
            AudioPlayer::silent(),
            NotificationGateway::new(Arc::new(Inbox::default()), "FocusMate"),
            Mcg128Xsl64::seed_from_u64(3),
        );
        let t = session.tick().expect("one-second focus completes");
        assert_eq!(t.to, Phase::ShortBreak);
        assert_eq!(session.counters().sessions_completed_today, u32::MAX);
        assert_eq!(kv.get(SESSIONS_KEY).unwrap(), Some(u32::MAX.to_string()));
    }

    #[test]
    fn volume_steps_are_clamped() {
        let mut rig = rig(short(), false);
        for _ in 0..5 {
            rig.session.volume_up();
        }
        assert_eq!(rig.session.audio().volume(), 100);
        rig.session.set_volume(5);
        rig.session.volume_down();
        assert_eq!(rig.session.audio().volume(), 0);
    }

    #[test]
    fn end_releases_audio_and_stops_ticking() {
        let mut rig = rig(short(), false);
        for _ in 0..3 {
            rig.session.tick();
        }
        let summary = rig.session.end();
        assert!(*rig.channel.released.borrow());
        assert_eq!(summary.sessions_completed_today, 1);
        assert_eq!(summary.log, ["Session 1 completed"]);
        assert!(rig.session.tick().is_none());
        assert_eq!(rig.session.end(), summary);
    }

    #[tokio::test]
    async fn run_session_drives_ticks_until_end_command() {
        let mut rig = rig(short(), false);
        let (mut ticker, handle) = ManualTicker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(handle.tick_n(3));

        let mut transitions = Vec::new();
        let summary = run_session(&mut rig.session, &mut ticker, &mut rx, |_, update| {
            if let Update::Transition(t) = update {
                transitions.push(t.to);
                tx.send(SessionCommand::End).unwrap();
            }
        })
        .await;

        assert_eq!(transitions, vec![Phase::ShortBreak]);
        assert_eq!(summary.sessions_completed_today, 1);
        assert!(rig.session.is_ended());
        assert!(!ticker.is_running());
        assert!(*rig.channel.released.borrow());
    }

    #[tokio::test]
    async fn run_session_reports_command_events() {
        let mut rig = rig(short(), false);
        let (mut ticker, _handle) = ManualTicker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(SessionCommand::TogglePause).unwrap();
        tx.send(SessionCommand::VolumeUp).unwrap();
        tx.send(SessionCommand::SetMusic(FOCUS_TRACKS[5].url.to_string()))
            .unwrap();
        tx.send(SessionCommand::TogglePause).unwrap();
        tx.send(SessionCommand::End).unwrap();

        let mut seen = Vec::new();
        run_session(&mut rig.session, &mut ticker, &mut rx, |_, update| {
            seen.push(match update {
                Update::Event(Event::TimerPaused { .. }) => "paused",
                Update::Event(Event::TimerResumed { .. }) => "resumed",
                Update::Event(Event::MusicChanged { .. }) => "music",
                Update::Event(Event::SessionEnded { .. }) => "ended",
                Update::Command => "command",
                _ => "other",
            });
        })
        .await;

        assert_eq!(seen, ["paused", "command", "music", "resumed", "ended"]);
        assert_eq!(rig.session.audio().volume(), 80);
    }

    #[tokio::test]
    async fn run_session_stops_when_ticks_run_out() {
        let mut rig = rig(short(), false);
        let (mut ticker, handle) = ManualTicker::new();
        let (_tx, mut rx) = mpsc::unbounded_channel();
        handle.tick_n(5);
        drop(handle);

        let mut updates = 0;
        let summary = run_session(&mut rig.session, &mut ticker, &mut rx, |_, update| {
            assert!(matches!(update, Update::Tick | Update::Transition(_)));
            updates += 1;
        })
        .await;
        assert_eq!(updates, 5);
        assert_eq!(ticker.delivered(), 5);
        assert_eq!(summary.sessions_completed_today, 1);
        assert_eq!(rig.session.engine().phase(), Phase::Focus);
    }
}
