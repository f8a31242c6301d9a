use std::io::Write;

use clap::Args;
use focusmate_core::catalog::focus_phrase;
use focusmate_core::{
    format_clock, run_session, AudioPlayer, Catalog, Config, FocusSession, IntervalTicker,
    Event, NotificationGateway, ProcessChannel, SessionCommand, Settings, SilentChannel,
    Transition, Update,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use super::{open_store, CliResult};

const BAR_WIDTH: usize = 24;

#[derive(Args)]
pub struct StartArgs {
    /// Focus track: 1-based index from `focusmate tracks`, or its URL
    #[arg(long)]
    music: Option<String>,
    /// Enable desktop notifications
    #[arg(long, overrides_with = "no_notifications")]
    notifications: bool,
    /// Disable desktop notifications
    #[arg(long)]
    no_notifications: bool,
    /// Emit events as JSON lines instead of the status display
    #[arg(long)]
    json: bool,
}

pub fn run(args: StartArgs) -> CliResult {
    let config = Config::load()?;
    config.validate()?;
    let catalog = Catalog::builtin();
    catalog.validate()?;

    let store = open_store()?;
    let saved = store.load_settings();
    let settings = Settings {
        music: match args.music.as_deref() {
            Some(selector) => match catalog.lookup_focus(selector) {
                Some(track) => track.url.to_string(),
                None => {
                    warn!(selector, "unknown track, using the first focus track");
                    catalog.default_focus_url().to_string()
                }
            },
            None => saved.music,
        },
        notifications: if args.notifications {
            true
        } else if args.no_notifications {
            false
        } else {
            saved.notifications
        },
    };

    let audio = build_audio(&config);
    let gateway = NotificationGateway::desktop(config.notifications.title.clone());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let json = args.json;
    let summary = rt.block_on(async move {
        let mut session =
            FocusSession::start_with_entropy(store, settings, config.cadence(), audio, gateway);
        if json {
            emit(&session.started_event());
        } else {
            print_header(&session);
            render(&session);
        }

        let (tx, mut commands) = mpsc::unbounded_channel();
        tokio::spawn(read_commands(tx));

        let mut ticker = IntervalTicker::every_second();
        let mut ended_emitted = false;
        let summary = run_session(&mut session, &mut ticker, &mut commands, |session, update| {
            if json {
                match update {
                    Update::Transition(t) => emit(&t.event(session.counters())),
                    Update::Event(event) => {
                        emit(event);
                        if matches!(event, Event::SessionEnded { .. }) {
                            ended_emitted = true;
                            return;
                        }
                    }
                    Update::Tick | Update::Command => {}
                }
                emit(&session.engine().snapshot());
                return;
            }
            match update {
                Update::Transition(t) => announce(session, t),
                Update::Event(Event::MusicChanged { url, .. }) => {
                    let catalog = session.store().catalog();
                    println!();
                    println!("Now playing: {}", catalog.track_name(url).unwrap_or("unknown"));
                }
                _ => {}
            }
            render(session);
        })
        .await;
        if json && !ended_emitted {
            emit(&session.ended_event());
        }
        summary
    });
    // The stdin reader may still be parked in a blocking read.
    rt.shutdown_background();

    if json {
        return Ok(());
    }

    println!();
    println!();
    println!("Session ended.");
    println!("Sessions completed today: {}", summary.sessions_completed_today);
    println!("Cycles completed:         {}", summary.cycles_completed);
    if !summary.log.is_empty() {
        println!();
        for entry in &summary.log {
            println!("  {entry}");
        }
    }
    Ok(())
}

fn build_audio(config: &Config) -> AudioPlayer {
    let player = config.audio.player.trim();
    if player.is_empty() {
        return AudioPlayer::new(Box::new(SilentChannel), config.audio.volume);
    }
    let channel = ProcessChannel::new(player, config.cue_dir());
    AudioPlayer::new(Box::new(channel), config.audio.volume)
}

async fn read_commands(tx: mpsc::UnboundedSender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        let Some(command) = parse_command(&line) else {
            continue;
        };
        let end = command == SessionCommand::End;
        if tx.send(command).is_err() || end {
            break;
        }
    }
}

/// Map one line of keyboard input to a session command. Track selectors
/// are resolved by the session against the list for the current phase.
fn parse_command(line: &str) -> Option<SessionCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return line.contains(' ').then_some(SessionCommand::TogglePause);
    }
    let mut parts = trimmed.split_whitespace();
    let head = parts.next()?;
    let arg = parts.next();
    match (head, arg) {
        ("q" | "quit" | "end", _) => Some(SessionCommand::End),
        ("p" | "pause", _) => Some(SessionCommand::TogglePause),
        ("+", _) => Some(SessionCommand::VolumeUp),
        ("-", _) => Some(SessionCommand::VolumeDown),
        ("m" | "mute", _) => Some(SessionCommand::ToggleMute),
        ("v", Some(n)) => n
            .parse::<u8>()
            .ok()
            .map(|percent| SessionCommand::SetVolume(percent.min(100))),
        ("t", Some(selector)) => Some(SessionCommand::SelectTrack(selector.to_string())),
        _ => None,
    }
}

fn emit(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to encode event"),
    }
}

fn print_header(session: &FocusSession) {
    let catalog = session.store().catalog();
    let name = catalog
        .track_name(&session.settings().music)
        .unwrap_or("unknown");
    println!("FocusMate");
    println!("Music: {name}");
    println!(
        "Notifications: {}",
        if session.settings().notifications { "on" } else { "off" }
    );
    println!("Controls: p pause | + / - volume | m mute | t <n> track | q end");
    println!();
}

fn announce(session: &FocusSession, transition: &Transition) {
    println!();
    if let Some(entry) = &transition.log_entry {
        println!("{entry}");
    }
    let engine = session.engine();
    if !transition.to.is_break() {
        println!("Back to focus.");
        return;
    }
    match engine.break_roll() {
        Some(roll) => {
            println!("{}: {}", transition.to.label(), roll.message);
            println!("Now playing: {}", roll.track.name);
            println!("Swap the break track with t <n>, see `focusmate tracks`.");
        }
        None => println!("{}", transition.to.label()),
    }
}

fn render(session: &FocusSession) {
    let engine = session.engine();
    let filled = ((engine.progress() * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    let banner = match engine.break_roll() {
        Some(roll) if engine.phase().is_break() => roll.message,
        _ => focus_phrase(engine.elapsed_secs()),
    };
    let audio = session.audio();
    let volume = if audio.is_muted() {
        "muted".to_string()
    } else {
        format!("vol {}%", audio.volume())
    };
    let counters = engine.counters();

    let mut out = std::io::stdout().lock();
    let _ = write!(
        out,
        "\r\x1b[2K{:<11} {} [{}] {:>3.0}%  {}  #{} | {}",
        engine.label(),
        format_clock(engine.seconds_remaining()),
        bar,
        engine.progress() * 100.0,
        volume,
        counters.sessions_completed_today,
        banner,
    );
    let _ = out.flush();
}
