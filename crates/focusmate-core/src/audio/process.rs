//! Playback through an external player process (mpv, ffplay, ...).
//!
//! The channel keeps at most one background child alive. Volume and mute
//! changes restart that child with new arguments, since a plain process
//! exposes no live controls. Cue sounds are fire-and-forget children that
//! are reaped lazily.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::{Cue, MediaChannel};
use crate::error::PlaybackError;

#[derive(Debug)]
pub struct ProcessChannel {
    template: Vec<String>,
    cue_dir: Option<PathBuf>,
    url: Option<String>,
    volume: f32,
    muted: bool,
    looping: bool,
    /// Whether the caller wants the background track audible.
    active: bool,
    child: Option<Child>,
    cues: Vec<Child>,
}

impl ProcessChannel {
    /// `template` is a whitespace-separated command line with `{url}`,
    /// `{volume}` (0-100) and `{loop}` (`inf` or `no`) placeholders.
    pub fn new(template: &str, cue_dir: Option<PathBuf>) -> Self {
        Self {
            template: template.split_whitespace().map(str::to_string).collect(),
            cue_dir,
            url: None,
            volume: 1.0,
            muted: false,
            looping: true,
            active: false,
            child: None,
            cues: Vec::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.template.is_empty()
    }

    fn command(&self, url: &str, looping: bool) -> Result<Command, PlaybackError> {
        let volume = ((self.volume * 100.0).round() as u32).to_string();
        let loop_arg = if looping { "inf" } else { "no" };
        let mut args = self.template.iter().map(|part| {
            part.replace("{url}", url)
                .replace("{volume}", &volume)
                .replace("{loop}", loop_arg)
        });
        let program = args.next().ok_or(PlaybackError::NoPlayer)?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(cmd)
    }

    fn spawn(&self, url: &str, looping: bool) -> Result<Child, PlaybackError> {
        let mut cmd = self.command(url, looping)?;
        cmd.spawn().map_err(|source| PlaybackError::Spawn {
            command: self.template.first().cloned().unwrap_or_default(),
            source,
        })
    }

    fn start_child(&mut self) -> Result<(), PlaybackError> {
        self.stop_child();
        if self.muted {
            return Ok(());
        }
        let url = self
            .url
            .clone()
            .ok_or_else(|| PlaybackError::NoSource("nothing loaded".into()))?;
        self.child = Some(self.spawn(&url, self.looping)?);
        Ok(())
    }

    fn restart_if_active(&mut self) {
        if self.active {
            if let Err(e) = self.start_child() {
                debug!(error = %e, "player restart failed");
            }
        }
    }

    fn stop_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn reap_cues(&mut self) {
        self.cues
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl MediaChannel for ProcessChannel {
    fn load(&mut self, url: &str) {
        self.stop_child();
        self.active = false;
        self.url = Some(url.to_string());
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.active = true;
        let result = self.start_child();
        if result.is_err() {
            self.active = false;
        }
        result
    }

    fn pause(&mut self) {
        self.active = false;
        self.stop_child();
    }

    fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if (self.volume - volume).abs() > f32::EPSILON {
            self.volume = volume;
            self.restart_if_active();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            self.restart_if_active();
        }
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn play_cue(&mut self, cue: Cue) -> Result<(), PlaybackError> {
        self.reap_cues();
        if self.muted {
            return Ok(());
        }
        let path = self
            .cue_dir
            .as_ref()
            .map(|dir| dir.join(cue.file_name()))
            .filter(|path| path.exists())
            .ok_or_else(|| PlaybackError::NoSource(cue.file_name().into()))?;
        let child = self.spawn(&path.to_string_lossy(), false)?;
        self.cues.push(child);
        Ok(())
    }

    fn release(&mut self) {
        self.active = false;
        self.stop_child();
        for mut child in self.cues.drain(..) {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn template_placeholders_are_substituted() {
        let mut channel = ProcessChannel::new("mpv --volume={volume} --loop-file={loop} {url}", None);
        channel.set_volume(0.35);
        let cmd = channel.command("https://example.com/a.mp3", true).unwrap();
        assert_eq!(cmd.get_program(), "mpv");
        assert_eq!(
            args_of(&cmd),
            vec!["--volume=35", "--loop-file=inf", "https://example.com/a.mp3"]
        );
    }

    #[test]
    fn empty_template_reports_no_player() {
        let mut channel = ProcessChannel::new("   ", None);
        assert!(!channel.is_configured());
        channel.load("a.mp3");
        assert!(matches!(channel.play(), Err(PlaybackError::NoPlayer)));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let mut channel = ProcessChannel::new("focusmate-no-such-player {url}", None);
        channel.load("a.mp3");
        assert!(matches!(channel.play(), Err(PlaybackError::Spawn { .. })));
    }

    #[test]
    fn play_without_source_fails() {
        let mut channel = ProcessChannel::new("mpv {url}", None);
        assert!(matches!(channel.play(), Err(PlaybackError::NoSource(_))));
    }

    #[test]
    fn muted_play_spawns_nothing() {
        let mut channel = ProcessChannel::new("focusmate-no-such-player {url}", None);
        channel.set_muted(true);
        channel.load("a.mp3");
        assert!(channel.play().is_ok());
        assert!(channel.child.is_none());
    }

    #[test]
    fn cue_without_directory_is_skipped() {
        let mut channel = ProcessChannel::new("mpv {url}", None);
        assert!(matches!(
            channel.play_cue(Cue::BreakOver),
            Err(PlaybackError::NoSource(_))
        ));
    }
}
