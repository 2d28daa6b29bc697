//! Elapsed/total time of the current song.

use std::fmt;

/// Current position and length of a song, in whole seconds.
///
/// Built from the `MM:SS` pair `mpc status` prints and advanced locally
/// once per tick so the display keeps moving between status queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongTime {
    /// Seconds played so far.
    pub current: u32,
    /// Length of the song in seconds.
    pub end: u32,
}

impl SongTime {
    pub fn new(current: u32, end: u32) -> Self {
        Self { current, end }
    }

    /// Parse a pair of `MM:SS` (or `H:MM:SS`) timestamps.
    ///
    /// Returns `None` if either side is not a colon-separated list of
    /// non-negative integers.
    pub fn parse(current: &str, end: &str) -> Option<Self> {
        Some(Self {
            current: parse_clock(current)?,
            end: parse_clock(end)?,
        })
    }

    /// Advance the current position by `seconds`.
    ///
    /// Returns `true` once the position has reached or passed the end of
    /// the song, which means the caller should query the player again.
    pub fn increase(&mut self, seconds: u32) -> bool {
        self.current = self.current.saturating_add(seconds);
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.current >= self.end
    }

    /// `"MM:SS / MM:SS"`.
    pub fn as_progress_string(&self) -> String {
        format!("{} / {}", format_clock(self.current), format_clock(self.end))
    }

    /// How far along the song is, `0.0` when the length is unknown.
    pub fn as_fraction(&self) -> f64 {
        if self.end == 0 {
            return 0.0;
        }
        self.current as f64 / self.end as f64
    }
}

impl fmt::Display for SongTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_progress_string())
    }
}

fn parse_clock(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.split(':').try_fold(0u32, |acc, part| {
        let n: u32 = part.parse().ok()?;
        acc.checked_mul(60)?.checked_add(n)
    })
}

fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
