//! End-to-end session scenarios against the SQLite store.

use focusmate_core::catalog::{Catalog, FOCUS_TRACKS};
use focusmate_core::{
    run_session, AudioPlayer, Cadence, Database, FocusSession, KvStore, ManualTicker,
    Event, NotificationGateway, Notifier, Permission, Phase, SessionCommand, SessionStore,
    Settings, TickSource, Update,
};
use focusmate_core::error::NotifyError;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;

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

fn open_store(dir: &TempDir) -> SessionStore {
    let db = Database::open_at(&dir.path().join("focusmate.db")).unwrap();
    SessionStore::new(Box::new(db), Catalog::builtin())
}

fn start(dir: &TempDir, cadence: Cadence, inbox: Arc<Inbox>) -> FocusSession {
    FocusSession::start(
        open_store(dir),
        Settings {
            music: FOCUS_TRACKS[3].url.to_string(),
            notifications: true,
        },
        cadence,
        AudioPlayer::silent(),
        NotificationGateway::new(inbox, "FocusMate"),
        Mcg128Xsl64::seed_from_u64(7),
    )
}

#[test]
fn default_focus_phase_completes_after_1500_ticks() {
    let dir = TempDir::new().unwrap();
    let inbox = Arc::new(Inbox::default());
    let mut session = start(&dir, Cadence::default(), inbox.clone());

    for _ in 0..1499 {
        assert!(session.tick().is_none());
    }
    let t = session.tick().expect("focus completes on tick 1500");
    assert_eq!(t.from, Phase::Focus);
    assert_eq!(t.to, Phase::ShortBreak);
    assert_eq!(session.engine().seconds_remaining(), 300);
    assert_eq!(session.counters().sessions_completed_today, 1);
    assert_eq!(inbox.shown.lock().unwrap().len(), 1);
}

#[test]
fn four_focus_phases_reach_a_long_break() {
    let dir = TempDir::new().unwrap();
    let cadence = Cadence {
        focus_secs: 2,
        short_break_secs: 1,
        long_break_secs: 3,
        sessions_before_long_break: 4,
    };
    let mut session = start(&dir, cadence, Arc::new(Inbox::default()));

    let mut entered = Vec::new();
    while entered.len() < 8 {
        if let Some(t) = session.tick() {
            entered.push(t.to);
        }
    }
    assert_eq!(
        entered,
        [
            Phase::ShortBreak,
            Phase::Focus,
            Phase::ShortBreak,
            Phase::Focus,
            Phase::ShortBreak,
            Phase::Focus,
            Phase::LongBreak,
            Phase::Focus,
        ]
    );
    assert_eq!(session.counters().sessions_completed_today, 4);
    assert_eq!(session.counters().cycles_completed, 1);
    let summary = session.end();
    assert_eq!(summary.log.last().map(String::as_str), Some("Session 4 completed"));
}

#[test]
fn counters_and_settings_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let cadence = Cadence {
        focus_secs: 1,
        short_break_secs: 1,
        long_break_secs: 1,
        sessions_before_long_break: 2,
    };
    {
        let mut session = start(&dir, cadence, Arc::new(Inbox::default()));
        for _ in 0..4 {
            session.tick();
        }
        session.end();
    }

    let state = open_store(&dir).load();
    assert_eq!(state.counters.sessions_completed_today, 2);
    assert_eq!(state.counters.cycles_completed, 1);
    assert_eq!(state.settings.music, FOCUS_TRACKS[3].url);
    assert!(state.settings.notifications);

    let session = start(&dir, cadence, Arc::new(Inbox::default()));
    assert_eq!(session.counters().sessions_completed_today, 2);
}

#[test]
fn counters_are_written_as_decimal_strings() {
    let dir = TempDir::new().unwrap();
    let cadence = Cadence {
        focus_secs: 1,
        ..Cadence::default()
    };
    let mut session = start(&dir, cadence, Arc::new(Inbox::default()));
    session.tick();
    session.end();

    let db = Database::open_at(&dir.path().join("focusmate.db")).unwrap();
    assert_eq!(db.get("sessionsToday").unwrap().as_deref(), Some("1"));
    assert_eq!(db.get("cyclesCompleted").unwrap().as_deref(), Some("0"));
}

#[tokio::test]
async fn paused_session_ignores_ticks_until_resumed() {
    let dir = TempDir::new().unwrap();
    let cadence = Cadence {
        focus_secs: 3,
        ..Cadence::default()
    };
    let mut session = start(&dir, cadence, Arc::new(Inbox::default()));
    let (mut ticker, handle) = ManualTicker::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    tx.send(SessionCommand::TogglePause).unwrap();
    handle.tick_n(10);

    let mut updates = 0;
    let mut phases = Vec::new();
    let summary = run_session(&mut session, &mut ticker, &mut rx, |s, update| {
        updates += 1;
        if updates == 1 {
            assert!(matches!(
                update,
                Update::Event(Event::TimerPaused { seconds_remaining: 3, .. })
            ));
        }
        // One pause command plus ten frozen ticks.
        if updates == 11 {
            assert!(s.engine().is_paused());
            assert_eq!(s.engine().seconds_remaining(), 3);
            tx.send(SessionCommand::TogglePause).unwrap();
            handle.tick_n(3);
        }
        if let Update::Transition(t) = update {
            phases.push(t.to);
            tx.send(SessionCommand::End).unwrap();
        }
    })
    .await;

    assert_eq!(phases, [Phase::ShortBreak]);
    assert_eq!(summary.sessions_completed_today, 1);
    assert!(!ticker.is_running());
}

#[tokio::test]
async fn ending_mid_phase_keeps_completed_counts() {
    let dir = TempDir::new().unwrap();
    let cadence = Cadence {
        focus_secs: 2,
        ..Cadence::default()
    };
    let mut session = start(&dir, cadence, Arc::new(Inbox::default()));
    let (mut ticker, handle) = ManualTicker::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    handle.tick_n(3);
    let mut ticks = 0;
    let summary = run_session(&mut session, &mut ticker, &mut rx, |_, _| {
        ticks += 1;
        if ticks == 3 {
            tx.send(SessionCommand::End).unwrap();
        }
    })
    .await;

    assert_eq!(summary.sessions_completed_today, 1);
    assert!(session.is_ended());
    assert_eq!(open_store(&dir).load_counters().sessions_completed_today, 1);
}
