//! Static track lists and message sets.
//!
//! Focus tracks are user-selectable; break tracks are rolled at random each
//! time a break phase is entered and may be swapped for another entry of the
//! same list during the break. The break catalogs share no entries with
//! the focus catalog.

use serde::Serialize;

use crate::error::ConfigError;
use crate::timer::Phase;

/// A named audio resource. URLs are opaque to FocusMate and handed to the
/// host's media player as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Track {
    pub name: &'static str,
    pub url: &'static str,
}

macro_rules! track {
    ($name:expr, $file:expr) => {
        Track {
            name: $name,
            url: concat!(
                "https://incompetech.com/music/royalty-free/mp3-royaltyfree/",
                $file
            ),
        }
    };
}

pub const FOCUS_TRACKS: &[Track] = &[
    track!("Cipher - Focused Coding (28 min)", "Cipher.mp3"),
    track!("Hypnothis - Electronic Focus (26 min)", "Hypnothis.mp3"),
    track!("Digital Lemonade - Upbeat Study (25 min)", "Digital%20Lemonade.mp3"),
    track!("Airport Lounge - Smooth Productivity (30 min)", "Airport%20Lounge.mp3"),
    track!("Comfortable Mystery 2 - Deep Work (24 min)", "Comfortable%20Mystery%202.mp3"),
    track!("Floating Cities - Ambient Coding (30 min)", "Floating%20Cities.mp3"),
    track!("Quasi Motion - Active Study (29 min)", "Quasi%20Motion.mp3"),
];

pub const SHORT_BREAK_TRACKS: &[Track] = &[
    track!("Meditation Impromptu 01 - Deep Rest (7 min)", "Meditation%20Impromptu%2001.mp3"),
    track!("Atlantean Twilight - Peaceful Waves (5.5 min)", "Atlantean%20Twilight.mp3"),
];

pub const LONG_BREAK_TRACKS: &[Track] = &[
    track!("Echoes of Time v2 - Extended Rest (12 min)", "Echoes%20of%20Time%20v2.mp3"),
    track!("Soaring - Uplifting Ambient (13 min)", "Soaring.mp3"),
    track!("Lightless Dawn - Deep Meditation (16 min)", "Lightless%20Dawn.mp3"),
    track!("Meditation Impromptu 02 - Long Rest (8 min)", "Meditation%20Impromptu%2002.mp3"),
];

/// Notification bodies for a completed focus phase. One is picked at random.
pub const FOCUS_COMPLETE_MESSAGES: &[&str] = &[
    "Session finished - take a 5-minute break.",
    "Great work! Time for a short rest.",
    "Pomodoro complete! Stretch and relax.",
];

pub const SHORT_BREAK_OVER_MESSAGE: &str = "Break is over - let's focus again!";
pub const LONG_BREAK_OVER_MESSAGE: &str = "Long break finished! Ready for the next cycle?";

/// Shown for the whole of a short break.
pub const SHORT_BREAK_MESSAGES: &[&str] = &[
    "Stand up for a quick stretch and loosen your shoulders.",
    "Drink some water and let your eyes rest on a distant point.",
    "Take a short walk around the room to reset your energy.",
    "Pause for slow breaths in and out, then reset your posture.",
    "Step away from the desk for a moment and clear your head.",
];

/// Shown for the whole of a long break.
pub const LONG_BREAK_MESSAGES: &[&str] = &[
    "Excellent streak! Take a longer break and relax fully.",
    "Four pomodoros complete - treat yourself before the next round.",
    "Deep work achieved. Use this time to recharge properly.",
    "Make this long break count with movement, fuel, and rest.",
];

/// Rotating banner phrases for the focus phase.
pub const FOCUS_PHRASES: &[&str] = &[
    "Keep going, you're doing great.",
    "Deep focus = real progress.",
    "Breathe. Stay calm. You've got this.",
    "Every minute counts.",
    "You're one Pomodoro closer to your goals.",
    "Focus is a muscle - you're training it now.",
    "Silence the noise. Just create.",
    "Small steps. Big results.",
    "Your future self will thank you.",
    "Progress over perfection.",
    "Stay focused. Stay hungry.",
    "Discipline is choosing what you want most over what you want now.",
    "The work you put in today builds tomorrow.",
    "Excellence is a habit, not an act.",
    "Champions are made when no one is watching.",
];

/// Seconds each banner phrase stays on screen.
pub const BANNER_ROTATION_SECS: u32 = 15;

/// Banner phrase for a point in the focus phase.
pub fn focus_phrase(elapsed_secs: u32) -> &'static str {
    let index = (elapsed_secs / BANNER_ROTATION_SECS) as usize % FOCUS_PHRASES.len();
    FOCUS_PHRASES[index]
}

/// The set of track lists a session draws from.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub focus: &'static [Track],
    pub short_break: &'static [Track],
    pub long_break: &'static [Track],
}

impl Catalog {
    pub const fn builtin() -> Self {
        Self {
            focus: FOCUS_TRACKS,
            short_break: SHORT_BREAK_TRACKS,
            long_break: LONG_BREAK_TRACKS,
        }
    }

    /// Reject catalogs that would leave a phase without music.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.focus.is_empty() {
            return Err(ConfigError::EmptyCatalog("focus"));
        }
        if self.short_break.is_empty() {
            return Err(ConfigError::EmptyCatalog("short_break"));
        }
        if self.long_break.is_empty() {
            return Err(ConfigError::EmptyCatalog("long_break"));
        }
        Ok(())
    }

    pub fn default_focus_url(&self) -> &'static str {
        self.focus.first().map(|t| t.url).unwrap_or_default()
    }

    pub fn focus_by_url(&self, url: &str) -> Option<&'static Track> {
        let focus: &'static [Track] = self.focus;
        focus.iter().find(|t| t.url == url)
    }

    /// Map a stored or user-supplied URL onto a catalog entry. Empty or
    /// unknown URLs fall back to the first focus track.
    pub fn resolve_focus_url(&self, url: &str) -> &'static str {
        self.focus_by_url(url)
            .map(|t| t.url)
            .unwrap_or_else(|| self.default_focus_url())
    }

    /// Resolve a `--music` argument: a 1-based index into the focus list or
    /// a URL from it.
    pub fn lookup_focus(&self, selector: &str) -> Option<&'static Track> {
        self.lookup(Phase::Focus, selector)
    }

    /// Tracks a phase can play. The focus phase draws from the focus list.
    pub fn tracks_for(&self, phase: Phase) -> &'static [Track] {
        match phase {
            Phase::Focus => self.focus,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }

    /// Resolve a track selector against the list for `phase`: a 1-based
    /// index or a URL from that list.
    pub fn lookup(&self, phase: Phase, selector: &str) -> Option<&'static Track> {
        let tracks = self.tracks_for(phase);
        if let Ok(n) = selector.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| tracks.get(i));
        }
        tracks.iter().find(|t| t.url == selector)
    }

    /// Display name for any URL in the catalog.
    pub fn track_name(&self, url: &str) -> Option<&'static str> {
        self.focus
            .iter()
            .chain(self.short_break)
            .chain(self.long_break)
            .find(|t| t.url == url)
            .map(|t| t.name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
