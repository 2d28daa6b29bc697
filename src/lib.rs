//! **barblocks** — popup widgets and helper scripts for i3/sway status bars.
//!
//! Status-bar blocks can only print text. barblocks adds the pieces needed
//! to open small interactive popups from a bar click, plus a couple of
//! window-manager helpers.
//!
//! # Architecture
//!
//! The crate is organised around two traits:
//!
//! * [`traits::CommandRunner`] — abstracts the `mpc` CLI so the media-state
//!   model ([`mpd::player::Mpc`]) can be tested without a daemon.
//! * [`traits::WindowManager`] — abstracts the window-manager IPC so the
//!   workspace rotation ([`rotate`]) is not coupled to a live i3.
//!
//! Popup placement ([`popup`]) and completion filtering ([`completion`])
//! are plain state machines; the GTK4 glue lives in [`widgets`].

pub mod command;
pub mod completion;
pub mod config;
pub mod i3;
pub mod mpd;
pub mod popup;
pub mod rotate;
pub mod traits;
pub mod widgets;
