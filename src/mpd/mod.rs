//! Music Player Daemon support, driven through the `mpc` CLI.
//!
//! [`player::Mpc`] is the media-state model; [`cli::MpcCli`] is the
//! [`CommandRunner`](crate::traits::CommandRunner) that actually spawns
//! `mpc`. Nothing outside this module parses `mpc` output.

pub mod cli;
pub mod player;
pub mod song_time;
pub mod status;
