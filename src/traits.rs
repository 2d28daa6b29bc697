//! Core traits that decouple the widgets from the external programs they
//! drive.
//!
//! The media-state model only talks to a [`CommandRunner`] and the
//! workspace rotation only talks to a [`WindowManager`], so both can be
//! exercised against recording test doubles instead of a live `mpc` or i3.

use crate::command::{Direction, MpcCommand, OutputInfo};

/// Abstraction over the music-player control CLI.
///
/// An implementation might spawn `mpc` (see
/// [`MpcCli`](crate::mpd::cli::MpcCli)) or return canned output in tests.
pub trait CommandRunner {
    /// The error type produced when the command cannot be run or fails.
    type Error: std::error::Error + 'static;

    /// Run `command` synchronously and return its standard output.
    ///
    /// A non-zero exit (e.g. no daemon listening) must be reported as an
    /// error, not as output.
    fn run(&self, command: &MpcCommand) -> Result<String, Self::Error>;
}

/// Abstraction over a window manager that can list outputs and move
/// workspaces between them.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Return the outputs in the order the window manager reports them.
    fn outputs(&self) -> Result<Vec<OutputInfo>, Self::Error>;

    /// Focus the workspace named `workspace`.
    fn focus_workspace(&self, workspace: &str) -> Result<(), Self::Error>;

    /// Move the focused workspace to the output in `direction`.
    fn move_workspace_to_output(&self, direction: Direction) -> Result<(), Self::Error>;
}
