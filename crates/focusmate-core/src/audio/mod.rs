//! Playback coordination.
//!
//! One [`MediaChannel`] carries the background track for the active phase.
//! [`AudioPlayer`] decides when that channel is reloaded, started or
//! paused; the channel only talks to the host's media stack. Playback
//! failures are logged and dropped here so they never reach the phase
//! engine.

mod process;

pub use process::ProcessChannel;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PlaybackError;

/// One-shot sounds played on phase boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Focus phase finished.
    FocusComplete,
    /// Short break finished.
    BreakOver,
    /// Long break finished.
    LongBreakOver,
}

impl Cue {
    pub fn file_name(self) -> &'static str {
        match self {
            Cue::FocusComplete => "ding.mp3",
            Cue::BreakOver => "come_back.mp3",
            Cue::LongBreakOver => "long_break_bell.mp3",
        }
    }
}

/// A single playback channel provided by the host platform.
pub trait MediaChannel {
    /// Replace the loaded source. Stops anything currently playing.
    fn load(&mut self, url: &str);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    /// Normalized volume, 0.0 ..= 1.0.
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn set_looping(&mut self, looping: bool);
    fn play_cue(&mut self, cue: Cue) -> Result<(), PlaybackError>;
    /// Stop everything and drop host resources.
    fn release(&mut self);
}

/// Channel that plays nothing. Used when no player is configured.
#[derive(Debug, Default)]
pub struct SilentChannel;

impl MediaChannel for SilentChannel {
    fn load(&mut self, _url: &str) {}

    fn play(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn play_cue(&mut self, _cue: Cue) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn release(&mut self) {}
}

pub struct AudioPlayer {
    channel: Box<dyn MediaChannel>,
    source: Option<String>,
    volume: u8,
    muted: bool,
    playing: bool,
}

impl AudioPlayer {
    pub fn new(mut channel: Box<dyn MediaChannel>, volume: u8) -> Self {
        let volume = volume.min(100);
        channel.set_looping(true);
        channel.set_volume(normalize(volume));
        Self {
            channel,
            source: None,
            volume,
            muted: false,
            playing: false,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentChannel), 0)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Point the channel at `url` and match the paused flag.
    ///
    /// The source is only reassigned when `url` differs from what is
    /// loaded, so repeated calls with the same track never restart it.
    pub fn sync(&mut self, url: &str, paused: bool) {
        if self.source.as_deref() != Some(url) {
            if self.playing {
                self.channel.pause();
                self.playing = false;
            }
            self.channel.load(url);
            self.source = Some(url.to_string());
        }
        self.channel.set_looping(true);
        self.channel.set_volume(normalize(self.volume));

        if paused {
            self.pause();
        } else {
            self.resume();
        }
    }

    pub fn pause(&mut self) {
        if self.playing {
            self.channel.pause();
            self.playing = false;
        }
    }

    /// Start the loaded source if it is not already playing. A rejected
    /// start leaves the player stopped; the next resume retries.
    pub fn resume(&mut self) {
        if self.playing || self.source.is_none() {
            return;
        }
        match self.channel.play() {
            Ok(()) => self.playing = true,
            Err(e) => debug!(error = %e, "playback did not start"),
        }
    }

    /// Set the volume percentage, clamped to 0-100.
    pub fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
        self.channel.set_volume(normalize(self.volume));
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.channel.set_muted(muted);
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    pub fn play_cue(&mut self, cue: Cue) {
        if let Err(e) = self.channel.play_cue(cue) {
            debug!(?cue, error = %e, "cue sound skipped");
        }
    }

    /// Stop playback and free the channel.
    pub fn release(&mut self) {
        self.channel.release();
        self.playing = false;
        self.source = None;
    }
}

fn normalize(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}
