//! The media-state model.
//!
//! [`Mpc`] keeps a [`PlayerState`] in sync with the daemon. Queries replace
//! the whole state; control commands are fire-and-forget and update the
//! local copy optimistically without waiting for the daemon to confirm.

use super::status::{PlaybackStatus, PlayerState};
use crate::command::{InvalidModifier, Modifier, MpcCommand};
use crate::traits::CommandRunner;
use log::{debug, info, warn};

/// Errors surfaced by the media-state model.
///
/// Failures of the `mpc` process itself are never surfaced; they degrade
/// the state to its placeholder values instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    InvalidModifier(#[from] InvalidModifier),
}

/// One playlist entry as returned by [`Mpc::get_playlist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub name: String,
    /// 1-based playlist position, suitable for [`Mpc::play_track`].
    pub index: usize,
}

/// A reference to a playlist position: either a bare 1-based index or a
/// [`PlaylistEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackRef(pub usize);

impl From<usize> for TrackRef {
    fn from(index: usize) -> Self {
        TrackRef(index)
    }
}

impl From<&PlaylistEntry> for TrackRef {
    fn from(entry: &PlaylistEntry) -> Self {
        TrackRef(entry.index)
    }
}

/// Player state backed by an `mpc`-like [`CommandRunner`].
pub struct Mpc<R: CommandRunner> {
    runner: R,
    state: PlayerState,
}

impl<R: CommandRunner> Mpc<R> {
    /// Create the model and populate it with an initial status query.
    pub fn new(runner: R) -> Self {
        let mut mpc = Self {
            runner,
            state: PlayerState::default(),
        };
        mpc.refresh();
        mpc
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Query the daemon and replace the whole state with the answer.
    pub fn refresh(&mut self) {
        self.state = match self.runner.run(&MpcCommand::Status) {
            Ok(output) => PlayerState::parse(&output),
            Err(e) => {
                debug!("status query failed, using placeholder state: {}", e);
                PlayerState::default()
            }
        };
    }

    /// Advance the local song clock by `seconds`.
    ///
    /// Does nothing unless playing. When the clock reaches the end of the
    /// song the player has most likely moved on, so the state is refreshed.
    pub fn advance_time(&mut self, seconds: u32) {
        if !self.state.is_playing() {
            return;
        }
        if self.state.song_time.increase(seconds) {
            debug!("song finished, refreshing");
            self.refresh();
        }
    }

    /// Pause when playing, play otherwise.
    pub fn toggle_playback(&mut self) {
        self.state.status = match self.state.status {
            PlaybackStatus::Playing => PlaybackStatus::Paused,
            PlaybackStatus::Paused | PlaybackStatus::Stopped => PlaybackStatus::Playing,
        };
        self.fire(MpcCommand::Toggle);
    }

    /// Set the volume, clamped to `0..=100`. Unchanged values issue no
    /// command.
    pub fn set_volume(&mut self, volume: i32) {
        let volume = volume.clamp(0, 100) as u8;
        if volume == self.state.volume {
            return;
        }
        self.state.volume = volume;
        self.fire(MpcCommand::Volume(volume));
    }

    pub fn modifier(&self, modifier: Modifier) -> bool {
        self.state.modifiers.get(modifier)
    }

    pub fn set_modifier(&mut self, modifier: Modifier, value: bool) {
        self.fire(MpcCommand::SetModifier(modifier, value));
        self.state.modifiers.set(modifier, value);
    }

    pub fn toggle_modifier(&mut self, modifier: Modifier) {
        self.set_modifier(modifier, !self.modifier(modifier));
    }

    /// Like [`set_modifier`](Self::set_modifier), for a modifier given by
    /// name.
    pub fn set_modifier_named(&mut self, name: &str, value: bool) -> Result<(), PlayerError> {
        let modifier: Modifier = name.parse()?;
        self.set_modifier(modifier, value);
        Ok(())
    }

    pub fn toggle_modifier_named(&mut self, name: &str) -> Result<(), PlayerError> {
        let modifier: Modifier = name.parse()?;
        self.toggle_modifier(modifier);
        Ok(())
    }

    /// The current playlist, in order. Empty when the daemon is unreachable.
    pub fn get_playlist(&self) -> Vec<PlaylistEntry> {
        match self.runner.run(&MpcCommand::Playlist) {
            Ok(output) => output
                .lines()
                .enumerate()
                .map(|(i, name)| PlaylistEntry {
                    name: name.to_string(),
                    index: i + 1,
                })
                .collect(),
            Err(e) => {
                warn!("playlist query failed: {}", e);
                Vec::new()
            }
        }
    }

    pub fn play_track(&mut self, track: impl Into<TrackRef>) {
        let TrackRef(index) = track.into();
        info!("play track {}", index);
        self.fire(MpcCommand::Play(index));
        self.refresh();
    }

    pub fn next_track(&mut self) {
        self.fire(MpcCommand::Next);
        self.refresh();
    }

    pub fn previous_track(&mut self) {
        self.fire(MpcCommand::Prev);
        self.refresh();
    }

    /// `ARTIST - SONG [paused]` or `ARTIST - SONG [MM:SS / MM:SS]`.
    pub fn name_with_status(&self) -> String {
        let s = &self.state;
        if s.is_paused() {
            format!("{} - {} [paused]", s.artist, s.song)
        } else {
            format!("{} - {} [{}]", s.artist, s.song, s.song_time)
        }
    }

    fn fire(&self, command: MpcCommand) {
        if let Err(e) = self.runner.run(&command) {
            warn!("`mpc {}` failed: {}", command, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpd::song_time::SongTime;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    const PLAYING: &str = "Opeth - Ghost of Perdition\n\
        [playing] #2/5   10:28/10:30 (99%)\n\
        volume: 60%   repeat: off   random: off   single: off   consume: off\n";

    const NEXT_SONG: &str = "Opeth - The Baying of the Hounds\n\
        [playing] #3/5   0:00/10:41 (0%)\n\
        volume: 60%   repeat: off   random: off   single: off   consume: off\n";

    const PAUSED: &str = "Opeth - Ghost of Perdition\n\
        [paused]  #2/5   3:00/10:30 (28%)\n\
        volume: 60%   repeat: on    random: off   single: off   consume: off\n";

    /// Records every command; `status` answers come from a queue (the last
    /// one repeats), `playlist` from a fixed string.
    #[derive(Debug, Default)]
    struct RecorderRunner {
        log: RefCell<Vec<MpcCommand>>,
        statuses: RefCell<VecDeque<String>>,
        playlist: String,
        offline: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("daemon offline")]
    struct Offline;

    impl RecorderRunner {
        fn with_statuses(statuses: &[&str]) -> Self {
            Self {
                statuses: RefCell::new(statuses.iter().map(|s| s.to_string()).collect()),
                ..Self::default()
            }
        }

        fn commands(&self) -> Vec<MpcCommand> {
            self.log
                .borrow()
                .iter()
                .filter(|c| **c != MpcCommand::Status)
                .cloned()
                .collect()
        }

        fn status_queries(&self) -> usize {
            self.log
                .borrow()
                .iter()
                .filter(|c| **c == MpcCommand::Status)
                .count()
        }
    }

    impl CommandRunner for RecorderRunner {
        type Error = Offline;

        fn run(&self, command: &MpcCommand) -> Result<String, Offline> {
            self.log.borrow_mut().push(command.clone());
            if self.offline {
                return Err(Offline);
            }
            match command {
                MpcCommand::Status => {
                    let mut q = self.statuses.borrow_mut();
                    if q.len() > 1 {
                        Ok(q.pop_front().unwrap_or_default())
                    } else {
                        Ok(q.front().cloned().unwrap_or_default())
                    }
                }
                MpcCommand::Playlist => Ok(self.playlist.clone()),
                _ => Ok(String::new()),
            }
        }
    }

    #[test]
    fn new_queries_status() {
        let mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        assert_eq!(mpc.runner().status_queries(), 1);
        assert_eq!(mpc.state().song, "Ghost of Perdition");
        assert_eq!(mpc.state().volume, 60);
    }

    #[test]
    fn offline_daemon_gives_default_state() {
        let runner = RecorderRunner {
            offline: true,
            ..RecorderRunner::default()
        };
        let mpc = Mpc::new(runner);
        assert_eq!(*mpc.state(), PlayerState::default());
        assert!(mpc.get_playlist().is_empty());
    }

    #[test]
    fn advance_time_refreshes_when_song_ends() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING, NEXT_SONG]));
        mpc.advance_time(1);
        assert_eq!(mpc.state().song_time, SongTime::new(629, 630));
        assert_eq!(mpc.runner().status_queries(), 1);

        mpc.advance_time(1);
        assert_eq!(mpc.runner().status_queries(), 2);
        assert_eq!(mpc.state().song, "The Baying of the Hounds");
        assert_eq!(mpc.state().song_time, SongTime::new(0, 641));
    }

    #[test]
    fn advance_time_ignored_unless_playing() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PAUSED]));
        mpc.advance_time(1000);
        assert_eq!(mpc.state().song_time, SongTime::new(180, 630));
        assert_eq!(mpc.runner().status_queries(), 1);
    }

    #[test]
    fn toggle_playback_flips_locally() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        mpc.toggle_playback();
        assert_eq!(mpc.state().status, PlaybackStatus::Paused);
        mpc.toggle_playback();
        assert_eq!(mpc.state().status, PlaybackStatus::Playing);
        assert_eq!(
            mpc.runner().commands(),
            vec![MpcCommand::Toggle, MpcCommand::Toggle]
        );
        // No confirmation round-trip.
        assert_eq!(mpc.runner().status_queries(), 1);
    }

    #[test]
    fn toggle_from_stopped_plays() {
        let mut mpc = Mpc::new(RecorderRunner::default());
        assert_eq!(mpc.state().status, PlaybackStatus::Stopped);
        mpc.toggle_playback();
        assert_eq!(mpc.state().status, PlaybackStatus::Playing);
    }

    #[test]
    fn set_volume_clamps() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        mpc.set_volume(150);
        assert_eq!(mpc.state().volume, 100);
        mpc.set_volume(-5);
        assert_eq!(mpc.state().volume, 0);
        assert_eq!(
            mpc.runner().commands(),
            vec![MpcCommand::Volume(100), MpcCommand::Volume(0)]
        );
    }

    #[test]
    fn set_volume_unchanged_is_noop() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        mpc.set_volume(60);
        assert!(mpc.runner().commands().is_empty());
        mpc.set_volume(200);
        mpc.set_volume(101);
        assert_eq!(mpc.runner().commands(), vec![MpcCommand::Volume(100)]);
    }

    #[test]
    fn toggle_modifier_round_trip() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PAUSED]));
        assert!(mpc.modifier(Modifier::Repeat));
        mpc.toggle_modifier(Modifier::Repeat);
        assert!(!mpc.modifier(Modifier::Repeat));
        mpc.toggle_modifier(Modifier::Repeat);
        assert!(mpc.modifier(Modifier::Repeat));
        assert_eq!(
            mpc.runner().commands(),
            vec![
                MpcCommand::SetModifier(Modifier::Repeat, false),
                MpcCommand::SetModifier(Modifier::Repeat, true),
            ]
        );
    }

    #[test]
    fn named_modifiers() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        mpc.set_modifier_named("consume", true).unwrap();
        assert!(mpc.modifier(Modifier::Consume));
        mpc.toggle_modifier_named("random").unwrap();
        assert!(mpc.modifier(Modifier::Random));

        let err = mpc.set_modifier_named("crossfade", true).unwrap_err();
        assert_eq!(
            err,
            PlayerError::InvalidModifier(InvalidModifier("crossfade".into()))
        );
        assert!(mpc.toggle_modifier_named("").is_err());
        assert_eq!(mpc.runner().commands().len(), 2);
    }

    #[test]
    fn playlist_is_one_based() {
        let runner = RecorderRunner {
            playlist: "Opeth - Ghost of Perdition\nOpeth - Isolation Years\n".into(),
            ..RecorderRunner::default()
        };
        let mpc = Mpc::new(runner);
        let playlist = mpc.get_playlist();
        assert_eq!(
            playlist,
            vec![
                PlaylistEntry {
                    name: "Opeth - Ghost of Perdition".into(),
                    index: 1
                },
                PlaylistEntry {
                    name: "Opeth - Isolation Years".into(),
                    index: 2
                },
            ]
        );
    }

    #[test]
    fn play_track_accepts_index_or_entry() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        mpc.play_track(4);
        let entry = PlaylistEntry {
            name: "x".into(),
            index: 2,
        };
        mpc.play_track(&entry);
        assert_eq!(
            mpc.runner().commands(),
            vec![MpcCommand::Play(4), MpcCommand::Play(2)]
        );
        assert_eq!(mpc.runner().status_queries(), 3);
    }

    #[test]
    fn next_and_previous_refresh() {
        let mut mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING, NEXT_SONG, PLAYING]));
        mpc.next_track();
        assert_eq!(mpc.state().track_index, 3);
        mpc.previous_track();
        assert_eq!(mpc.state().track_index, 2);
        assert_eq!(
            mpc.runner().commands(),
            vec![MpcCommand::Next, MpcCommand::Prev]
        );
    }

    #[test]
    fn name_with_status() {
        let mpc = Mpc::new(RecorderRunner::with_statuses(&[PAUSED]));
        assert_eq!(mpc.name_with_status(), "Opeth - Ghost of Perdition [paused]");
        let mpc = Mpc::new(RecorderRunner::with_statuses(&[PLAYING]));
        assert_eq!(
            mpc.name_with_status(),
            "Opeth - Ghost of Perdition [10:28 / 10:30]"
        );
        let mpc = Mpc::new(RecorderRunner::default());
        assert_eq!(mpc.name_with_status(), "None - None [00:00 / 00:00]");
    }
}
