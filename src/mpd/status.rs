//! Player state and the parser for `mpc status` output.
//!
//! `mpc status` prints up to three lines:
//!
//! ```text
//! In Flames - Where the Dead Ships Dwell
//! [playing] #3/12   1:23/4:56 (28%)
//! volume: 80%   repeat: off   random: on    single: off   consume: off
//! ```
//!
//! When nothing is playing only the last line is printed. Anything the
//! parser cannot make sense of falls back to the placeholder values of
//! [`PlayerState::default`]; parsing never fails.

use super::song_time::SongTime;
use crate::command::Modifier;
use std::collections::HashMap;

/// Marker `mpc` prints when it cannot reach the daemon.
pub const MPD_ERROR_MARKER: &str = "mpd error:";

/// Placeholder for artist and song when nothing is known.
pub const UNKNOWN: &str = "None";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlaybackStatus {
    fn from_mpc(s: &str) -> Self {
        match s.trim_matches(|c| c == '[' || c == ']') {
            "playing" => PlaybackStatus::Playing,
            "paused" => PlaybackStatus::Paused,
            _ => PlaybackStatus::Stopped,
        }
    }
}

/// On/off state of the four playback modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub random: bool,
    pub single: bool,
    pub consume: bool,
    pub repeat: bool,
}

impl Modifiers {
    pub fn get(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Random => self.random,
            Modifier::Single => self.single,
            Modifier::Consume => self.consume,
            Modifier::Repeat => self.repeat,
        }
    }

    pub fn set(&mut self, modifier: Modifier, value: bool) {
        let slot = match modifier {
            Modifier::Random => &mut self.random,
            Modifier::Single => &mut self.single,
            Modifier::Consume => &mut self.consume,
            Modifier::Repeat => &mut self.repeat,
        };
        *slot = value;
    }
}

/// Snapshot of everything the status query reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub artist: String,
    pub song: String,
    pub status: PlaybackStatus,
    /// 1-based position of the current track in the playlist.
    pub track_index: u32,
    pub track_count: u32,
    pub song_time: SongTime,
    /// Volume in percent, `0..=100`.
    pub volume: u8,
    pub modifiers: Modifiers,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            artist: UNKNOWN.into(),
            song: UNKNOWN.into(),
            status: PlaybackStatus::Stopped,
            track_index: 0,
            track_count: 0,
            song_time: SongTime::default(),
            volume: 0,
            modifiers: Modifiers::default(),
        }
    }
}

impl PlayerState {
    /// Parse the output of `mpc status`.
    pub fn parse(output: &str) -> Self {
        if output.contains(MPD_ERROR_MARKER) {
            return Self::default();
        }

        let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
        let Some(options_line) = lines.last() else {
            return Self::default();
        };

        let mut state = Self::default();

        if lines.len() >= 2 {
            if let Some(head) = parse_head(lines[0], lines[1]) {
                state.artist = head.artist;
                state.song = head.song;
                state.status = head.status;
                state.track_index = head.track_index;
                state.track_count = head.track_count;
                state.song_time = head.song_time;
            }
        }

        let options = parse_options(options_line);
        state.volume = options
            .get("volume")
            .and_then(|v| v.trim_end_matches('%').parse::<u8>().ok())
            .map(|v| v.min(100))
            .unwrap_or(0);
        for m in Modifier::ALL {
            state
                .modifiers
                .set(m, options.get(m.as_str()).is_some_and(|v| *v == "on"));
        }

        state
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.status == PlaybackStatus::Paused
    }
}

struct Head {
    artist: String,
    song: String,
    status: PlaybackStatus,
    track_index: u32,
    track_count: u32,
    song_time: SongTime,
}

/// Parse the track line and the `[status] #N/M  MM:SS/MM:SS` line.
///
/// Both lines are accepted or rejected together.
fn parse_head(track_line: &str, status_line: &str) -> Option<Head> {
    let (artist, song) = track_line.split_once('-')?;

    let mut fields = status_line.split_whitespace();
    let status = fields.next()?;
    if !status.starts_with('[') {
        return None;
    }
    let (index, count) = fields.next()?.trim_start_matches('#').split_once('/')?;
    let (current, end) = fields.next()?.split_once('/')?;

    Some(Head {
        artist: artist.trim().to_string(),
        song: song.trim().to_string(),
        status: PlaybackStatus::from_mpc(status),
        track_index: index.parse().ok()?,
        track_count: count.parse().ok()?,
        song_time: SongTime::parse(current, end)?,
    })
}

/// Split `volume: 80%   repeat: off ...` into key/value pairs.
///
/// Accepts both `key: value` and `key:value`.
fn parse_options(line: &str) -> HashMap<&str, &str> {
    let mut options = HashMap::new();
    let mut pending = None;
    for token in line.split_whitespace() {
        match token.split_once(':') {
            Some((key, "")) => pending = Some(key),
            Some((key, value)) => {
                options.insert(key, value);
                pending = None;
            }
            None => {
                if let Some(key) = pending.take() {
                    options.insert(key, token);
                }
            }
        }
    }
    options
}
