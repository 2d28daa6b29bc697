//! The music control popup.
//!
//! # Widget tree
//!
//! ```text
//! PopupWindow content
//! ├ title label                 "ARTIST - SONG"
//! ├ progress bar + time label   "MM:SS / MM:SS"
//! ├ controls                    prev (.left-semi-circle) | toggle (.circular) | next (.right-semi-circle)
//! ├ volume scale
//! ├ modifier toggles            repeat | random | single | consume
//! └ search entry (.margin-fix)  with a CompletionPopup over the playlist
//! ```
//!
//! Everything runs on the GLib main loop. `mpc` calls block it for their
//! duration; a hung `mpc` hangs the popup.

use super::completion::CompletionPopup;
use super::window::{PopupWindow, Stylesheet, WidgetError};
use crate::command::Modifier;
use crate::config::Config;
use crate::mpd::player::Mpc;
use crate::mpd::status::PlayerState;
use crate::popup::LaunchArgs;
use crate::traits::CommandRunner;
use gtk4::prelude::*;
use gtk4::glib;
use log::info;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Labels and controls that mirror the player state.
struct MusicView {
    title: gtk4::Label,
    progress: gtk4::ProgressBar,
    time: gtk4::Label,
    toggle: gtk4::Button,
    volume: gtk4::Scale,
    modifiers: Vec<(Modifier, gtk4::ToggleButton)>,
}

impl MusicView {
    fn sync(&self, state: &PlayerState) {
        self.title
            .set_text(&format!("{} - {}", state.artist, state.song));
        self.progress.set_fraction(state.song_time.as_fraction().clamp(0.0, 1.0));
        self.time.set_text(&state.song_time.as_progress_string());
        self.toggle
            .set_label(if state.is_playing() { "⏸" } else { "▶" });
        // Setting the widgets re-enters the handlers below; the model
        // ignores unchanged values, so no command is issued.
        self.volume.set_value(state.volume as f64);
        for (m, button) in &self.modifiers {
            button.set_active(state.modifiers.get(*m));
        }
    }
}

/// Volume after a vertical scroll of `dy` steps: up raises, down lowers,
/// one `step` per notch. `None` for a zero delta.
fn scrolled_volume(current: u8, dy: f64, step: i32) -> Option<i32> {
    if dy == 0.0 || !dy.is_finite() {
        return None;
    }
    let notches = (dy.abs().round() as i32).max(1);
    Some(i32::from(current) - dy.signum() as i32 * notches * step)
}

/// Build the music popup into `window`, driven by `mpc`.
pub fn build<R: CommandRunner + 'static>(
    window: &PopupWindow,
    mpc: Rc<RefCell<Mpc<R>>>,
    config: &Config,
) {
    let content = window.content();

    let title = gtk4::Label::new(None);
    title.set_ellipsize(gtk4::pango::EllipsizeMode::End);
    title.set_max_width_chars(40);
    content.append(&title);

    let progress = gtk4::ProgressBar::new();
    let time = gtk4::Label::new(None);
    content.append(&progress);
    content.append(&time);

    let controls = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    controls.set_halign(gtk4::Align::Center);
    let prev = gtk4::Button::with_label("⏮");
    prev.add_css_class("left-semi-circle");
    let toggle = gtk4::Button::with_label("▶");
    toggle.add_css_class("circular");
    let next = gtk4::Button::with_label("⏭");
    next.add_css_class("right-semi-circle");
    controls.append(&prev);
    controls.append(&toggle);
    controls.append(&next);
    content.append(&controls);

    let volume = gtk4::Scale::with_range(gtk4::Orientation::Horizontal, 0.0, 100.0, 1.0);
    volume.set_draw_value(true);
    content.append(&volume);

    let modifier_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 4);
    modifier_box.set_halign(gtk4::Align::Center);
    let modifiers: Vec<(Modifier, gtk4::ToggleButton)> = Modifier::ALL
        .iter()
        .map(|m| {
            let button = gtk4::ToggleButton::with_label(m.as_str());
            modifier_box.append(&button);
            (*m, button)
        })
        .collect();
    content.append(&modifier_box);

    let search = gtk4::Entry::new();
    search.set_placeholder_text(Some("Search playlist"));
    search.add_css_class("margin-fix");
    content.append(&search);

    let view = Rc::new(MusicView {
        title,
        progress,
        time,
        toggle: toggle.clone(),
        volume: volume.clone(),
        modifiers: modifiers.clone(),
    });
    view.sync(mpc.borrow().state());

    //  Controls

    {
        let (mpc, view) = (mpc.clone(), view.clone());
        prev.connect_clicked(move |_| {
            mpc.borrow_mut().previous_track();
            view.sync(mpc.borrow().state());
        });
    }
    {
        let (mpc, view) = (mpc.clone(), view.clone());
        toggle.connect_clicked(move |_| {
            mpc.borrow_mut().toggle_playback();
            view.sync(mpc.borrow().state());
        });
    }
    {
        let (mpc, view) = (mpc.clone(), view.clone());
        next.connect_clicked(move |_| {
            mpc.borrow_mut().next_track();
            view.sync(mpc.borrow().state());
        });
    }
    {
        let mpc = mpc.clone();
        volume.connect_value_changed(move |scale| {
            if let Ok(mut mpc) = mpc.try_borrow_mut() {
                mpc.set_volume(scale.value().round() as i32);
            }
        });
    }
    {
        let mpc = mpc.clone();
        let step = config.music.volume_step;
        // DISCRETE makes GTK accumulate smooth-scroll deltas into whole steps.
        let scroll = gtk4::EventControllerScroll::new(
            gtk4::EventControllerScrollFlags::VERTICAL | gtk4::EventControllerScrollFlags::DISCRETE,
        );
        let volume = volume.clone();
        scroll.connect_scroll(move |_, _, dy| {
            let current = mpc.borrow().state().volume;
            let Some(target) = scrolled_volume(current, dy, step) else {
                return glib::Propagation::Proceed;
            };
            mpc.borrow_mut().set_volume(target);
            volume.set_value(mpc.borrow().state().volume as f64);
            glib::Propagation::Stop
        });
        window.window().add_controller(scroll);
    }
    for (m, button) in modifiers {
        let mpc = mpc.clone();
        button.connect_toggled(move |b| {
            let Ok(mut mpc) = mpc.try_borrow_mut() else {
                return;
            };
            if mpc.modifier(m) != b.is_active() {
                mpc.set_modifier(m, b.is_active());
            }
        });
    }

    //  Playlist search

    let playlist = Rc::new(mpc.borrow().get_playlist());
    let completion = CompletionPopup::new(window.window(), &search);
    completion.set_candidates(playlist.iter().map(|e| e.name.clone()).collect());
    {
        let (mpc, view, playlist) = (mpc.clone(), view.clone(), playlist.clone());
        completion.connect_commit(move |name| {
            if let Some(entry) = playlist.iter().find(|e| e.name == name) {
                mpc.borrow_mut().play_track(entry);
                view.sync(mpc.borrow().state());
            }
        });
    }

    //  Song clock

    let tick = config.music.tick_secs.max(1);
    glib::timeout_add_local(Duration::from_secs(u64::from(tick)), move || {
        mpc.borrow_mut().advance_time(tick);
        view.sync(mpc.borrow().state());
        glib::ControlFlow::Continue
    });
}

/// Initialise GTK, show the music popup and run until it is dismissed.
pub fn run<R: CommandRunner + 'static>(
    runner: R,
    args: &LaunchArgs,
    config: &Config,
    style: &Stylesheet,
) -> Result<(), WidgetError> {
    gtk4::init()?;
    info!("GTK4 initialised");

    let window = PopupWindow::new(&config.popup, args, style)?;
    let mpc = Rc::new(RefCell::new(Mpc::new(runner)));
    build(&window, mpc, config);

    let main_loop = glib::MainLoop::new(None, false);
    {
        let main_loop = main_loop.clone();
        window.connect_dismissed(move || main_loop.quit());
    }

    window.show();
    info!("entering GLib main loop");
    main_loop.run();
    info!("GLib main loop exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_up_raises_by_step() {
        assert_eq!(scrolled_volume(50, -1.0, 5), Some(55));
        assert_eq!(scrolled_volume(50, 1.0, 5), Some(45));
    }

    #[test]
    fn zero_delta_is_ignored() {
        assert_eq!(scrolled_volume(50, 0.0, 5), None);
        assert_eq!(scrolled_volume(50, -0.0, 5), None);
    }

    #[test]
    fn several_notches_move_several_steps() {
        assert_eq!(scrolled_volume(50, 3.0, 5), Some(35));
    }

    #[test]
    fn result_is_left_for_the_model_to_clamp() {
        assert_eq!(scrolled_volume(98, -1.0, 5), Some(103));
    }
}
