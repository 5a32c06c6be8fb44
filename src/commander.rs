//! Playback commands.
//!
//! Every command goes to whichever application currently holds now playing
//! focus. The returned bool is the framework's acceptance of the command,
//! not confirmation that the application acted on it.

use crate::config::NowPlayingConfig;
use crate::error::NowPlayingError;
use log::{debug, warn};
use np_remote::{Command, CommandOptions, MediaRemoteBackend, create_backend};
use std::sync::Arc;

#[derive(Clone)]
pub struct Commander {
    backend: Arc<dyn MediaRemoteBackend>,
}

impl Commander {
    /// Load the framework as configured at the default config location.
    pub fn new() -> Result<Self, NowPlayingError> {
        Self::with_config(&NowPlayingConfig::from_default_location())
    }

    pub fn with_config(config: &NowPlayingConfig) -> Result<Self, NowPlayingError> {
        config.validate()?;
        let backend = create_backend(&config.framework_options())?;
        Ok(Self::with_backend(backend))
    }

    pub fn with_backend(backend: Arc<dyn MediaRemoteBackend>) -> Self {
        Self { backend }
    }

    /// Send any command. `options` only matters for rate, like, dislike
    /// and bookmark.
    pub fn send(&self, command: Command, options: Option<&CommandOptions>) -> bool {
        let options = options.filter(|o| !o.is_empty());
        if options.is_some() && !command.takes_options() {
            debug!("{:?} ignores its options", command);
        }
        let options = options.filter(|_| command.takes_options());

        let accepted = self.backend.send_command(command, options);
        if accepted {
            debug!("Sent {:?}", command);
        } else {
            warn!("{:?} was not accepted", command);
        }
        accepted
    }

    pub fn play(&self) -> bool {
        self.send(Command::Play, None)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause, None)
    }

    pub fn toggle_play_pause(&self) -> bool {
        self.send(Command::TogglePlayPause, None)
    }

    pub fn stop(&self) -> bool {
        self.send(Command::Stop, None)
    }

    pub fn next_track(&self) -> bool {
        self.send(Command::NextTrack, None)
    }

    pub fn previous_track(&self) -> bool {
        self.send(Command::PreviousTrack, None)
    }

    pub fn skip_forward(&self) -> bool {
        self.send(Command::SkipForward, None)
    }

    pub fn skip_backward(&self) -> bool {
        self.send(Command::SkipBackward, None)
    }

    pub fn advance_shuffle_mode(&self) -> bool {
        self.send(Command::AdvanceShuffleMode, None)
    }

    pub fn advance_repeat_mode(&self) -> bool {
        self.send(Command::AdvanceRepeatMode, None)
    }

    pub fn like_track(&self, options: &CommandOptions) -> bool {
        self.send(Command::LikeTrack, Some(options))
    }

    pub fn dislike_track(&self, options: &CommandOptions) -> bool {
        self.send(Command::DislikeTrack, Some(options))
    }

    pub fn bookmark_track(&self, options: &CommandOptions) -> bool {
        self.send(Command::BookmarkTrack, Some(options))
    }

    /// Move playback to `seconds`. The effect is neither confirmed nor
    /// immediate. Non-finite positions are dropped.
    pub fn seek_to(&self, seconds: f64) {
        if !seconds.is_finite() {
            warn!("Ignoring seek to {}", seconds);
            return;
        }
        debug!("Seeking to {:.2}s", seconds);
        self.backend.set_elapsed_time(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use np_remote::mock::MockRemote;

    fn commander() -> (Arc<MockRemote>, Commander) {
        let mock = Arc::new(MockRemote::new());
        let commander = Commander::with_backend(mock.clone());
        (mock, commander)
    }

    #[test]
    fn test_each_command_is_one_dispatch() {
        let (mock, commander) = commander();

        assert!(commander.play());
        assert!(commander.pause());
        assert!(commander.toggle_play_pause());
        assert!(commander.next_track());
        assert!(commander.previous_track());

        let sent: Vec<_> = mock.commands().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            sent,
            vec![
                Command::Play,
                Command::Pause,
                Command::TogglePlayPause,
                Command::NextTrack,
                Command::PreviousTrack,
            ]
        );
    }

    #[test]
    fn test_rejected_command_reports_false_once() {
        let (mock, commander) = commander();
        mock.set_accept_commands(false);

        assert!(!commander.next_track());
        assert_eq!(mock.commands().len(), 1);
    }

    #[test]
    fn test_like_track_carries_options() {
        let (mock, commander) = commander();
        let options = CommandOptions::for_track("track-42");

        assert!(commander.like_track(&options));

        let sent = mock.commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Command::LikeTrack);
        assert_eq!(sent[0].1.as_ref(), Some(&options));
    }

    #[test]
    fn test_empty_options_are_not_forwarded() {
        let (mock, commander) = commander();
        commander.send(Command::RateTrack, Some(&CommandOptions::default()));
        assert_eq!(mock.commands()[0].1, None);
    }

    #[test]
    fn test_options_dropped_for_commands_without_them() {
        let (mock, commander) = commander();
        let options = CommandOptions::for_track("track-7");

        commander.send(Command::Play, Some(&options));
        commander.send(Command::BookmarkTrack, Some(&options));

        let sent = mock.commands();
        assert_eq!(sent[0], (Command::Play, None));
        assert_eq!(sent[1], (Command::BookmarkTrack, Some(options)));
    }

    #[test]
    fn test_seek_to() {
        let (mock, commander) = commander();

        commander.seek_to(42.5);
        commander.seek_to(f64::NAN);
        commander.seek_to(f64::INFINITY);

        assert_eq!(mock.elapsed_times(), vec![42.5]);
        assert!(mock.commands().is_empty());
    }

    #[test]
    fn test_clones_share_backend() {
        let (mock, commander) = commander();
        let other = commander.clone();
        commander.stop();
        other.skip_forward();
        assert_eq!(mock.commands().len(), 2);
    }
}
