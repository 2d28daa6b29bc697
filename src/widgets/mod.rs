//! GTK4 widgets.
//!
//! When the `widgets-gtk` feature is enabled these modules build the popup
//! window, the completion list and the music popup on top of the
//! toolkit-independent logic in [`popup`](crate::popup) and
//! [`completion`](crate::completion).

#[cfg(feature = "widgets-gtk")]
pub mod completion;
#[cfg(feature = "widgets-gtk")]
pub mod music;
#[cfg(feature = "widgets-gtk")]
pub mod window;
