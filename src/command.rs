//! Commands and types shared between the `mpc` wrapper and the i3 IPC client.
//!
//! [`MpcCommand`] is the vocabulary of the music-player CLI, [`Modifier`]
//! names the four playback toggles, and [`Direction`] / [`OutputInfo`]
//! describe what the window manager reports and accepts.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// One of the four playback modifiers `mpc` can switch on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Random,
    Single,
    Consume,
    Repeat,
}

impl Modifier {
    /// All legal modifiers, in the order `mpc` prints them.
    pub const ALL: [Modifier; 4] = [
        Modifier::Repeat,
        Modifier::Random,
        Modifier::Single,
        Modifier::Consume,
    ];

    /// The name `mpc` uses for this modifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Random => "random",
            Modifier::Single => "single",
            Modifier::Consume => "consume",
            Modifier::Repeat => "repeat",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a modifier name is not one of `random`, `single`,
/// `consume` or `repeat`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal modifier {0:?}, expected one of [random, single, consume, repeat]")]
pub struct InvalidModifier(pub String);

impl FromStr for Modifier {
    type Err = InvalidModifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Modifier::Random),
            "single" => Ok(Modifier::Single),
            "consume" => Ok(Modifier::Consume),
            "repeat" => Ok(Modifier::Repeat),
            other => Err(InvalidModifier(other.to_string())),
        }
    }
}

/// Every `mpc` invocation the media-state model issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MpcCommand {
    Status,
    Toggle,
    Playlist,
    /// Play the track at a 1-based playlist position.
    Play(usize),
    Next,
    Prev,
    Volume(u8),
    SetModifier(Modifier, bool),
}

impl MpcCommand {
    /// Arguments passed to the `mpc` binary (without the program name).
    pub fn args(&self) -> Vec<String> {
        match self {
            MpcCommand::Status => vec!["status".into()],
            MpcCommand::Toggle => vec!["toggle".into()],
            MpcCommand::Playlist => vec!["playlist".into()],
            MpcCommand::Play(n) => vec!["play".into(), n.to_string()],
            MpcCommand::Next => vec!["next".into()],
            MpcCommand::Prev => vec!["prev".into()],
            MpcCommand::Volume(v) => vec!["volume".into(), v.to_string()],
            MpcCommand::SetModifier(m, on) => {
                vec![m.as_str().into(), if *on { "on" } else { "off" }.into()]
            }
        }
    }
}

impl fmt::Display for MpcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// Direction for moving a workspace between outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One output as reported by the window manager, in reply order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputInfo {
    /// Output name (e.g. `"DP-1"`, or `"xroot-0"` for i3's root pseudo-output).
    pub name: String,
    /// Whether the output is currently in use.
    #[serde(default)]
    pub active: bool,
    /// Name of the workspace visible on this output, if any.
    pub current_workspace: Option<String>,
}
