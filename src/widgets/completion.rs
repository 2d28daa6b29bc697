//! GTK4 completion list for an [`Entry`](gtk4::Entry).
//!
//! `GtkEntryCompletion` sizes its popup to fit the whole screen, so a long
//! playlist would spill far outside the popup window (and moving the
//! pointer onto it would dismiss the window). This list lives in a popover
//! below the entry instead, is exactly as wide as the entry, and never
//! grows past the bottom of the parent window.
//!
//! All decisions are made by [`CompletionState`] and [`ContentHeight`];
//! this module only wires signals and applies the results.

use crate::completion::{
    desired_height, CompletionKey, CompletionState, ContentHeight, KeyOutcome, Reflow,
};
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use log::debug;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct Inner {
    entry: gtk4::Entry,
    parent: gtk4::Window,
    popover: gtk4::Popover,
    scroll: gtk4::ScrolledWindow,
    list: gtk4::ListBox,
    state: RefCell<CompletionState>,
    height: Cell<ContentHeight>,
    available: Cell<i32>,
    on_commit: RefCell<Vec<Box<dyn Fn(&str)>>>,
}

/// Completion popup attached to `entry` inside `parent`.
#[derive(Clone)]
pub struct CompletionPopup {
    inner: Rc<Inner>,
}

impl CompletionPopup {
    pub fn new(parent: &gtk4::Window, entry: &gtk4::Entry) -> Self {
        let list = gtk4::ListBox::new();
        list.set_selection_mode(gtk4::SelectionMode::Single);
        list.set_activate_on_single_click(true);

        let scroll = gtk4::ScrolledWindow::new();
        scroll.set_policy(gtk4::PolicyType::Never, gtk4::PolicyType::Automatic);
        scroll.set_propagate_natural_height(true);
        scroll.set_min_content_height(0);
        scroll.set_child(Some(&list));

        let frame = gtk4::Frame::new(None);
        frame.set_child(Some(&scroll));

        let popover = gtk4::Popover::new();
        popover.set_child(Some(&frame));
        popover.set_parent(entry);
        popover.set_position(gtk4::PositionType::Bottom);
        popover.set_has_arrow(false);
        popover.set_autohide(false);
        popover.set_can_focus(false);

        let inner = Rc::new(Inner {
            entry: entry.clone(),
            parent: parent.clone(),
            popover,
            scroll,
            list,
            state: RefCell::new(CompletionState::new()),
            height: Cell::new(ContentHeight::default()),
            available: Cell::new(0),
            on_commit: RefCell::new(Vec::new()),
        });

        connect_keys(&inner);
        connect_changed(&inner);
        connect_row_activated(&inner);

        {
            let popover = inner.popover.clone();
            entry.connect_destroy(move |_| popover.unparent());
        }

        Self { inner }
    }

    /// Replace the candidates and show them all, unfiltered.
    pub fn set_candidates(&self, candidates: Vec<String>) {
        debug!("{} completion candidates", candidates.len());
        self.inner.state.borrow_mut().set_candidates(candidates);
        self.inner.rebuild_rows();
        self.inner.update_height();
    }

    /// Register `f` to receive every committed completion.
    pub fn connect_commit<F: Fn(&str) + 'static>(&self, f: F) {
        self.inner.on_commit.borrow_mut().push(Box::new(f));
    }
}

impl Inner {
    /// Pin the width to the entry, recompute the space left below it and
    /// pop up.
    fn show(&self) {
        let entry_width = self.entry.width();
        self.scroll.set_min_content_width(entry_width);
        self.scroll.set_max_content_width(entry_width);

        if let Some(bounds) = self.entry.compute_bounds(&self.parent) {
            let entry_bottom = (bounds.y() + bounds.height()).ceil() as i32;
            self.available.set(self.parent.height() - entry_bottom);
        }

        self.update_height();
        self.popover.popup();
    }

    fn rebuild_rows(&self) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        for text in self.state.borrow().visible() {
            let label = gtk4::Label::new(Some(text.as_str()));
            label.set_xalign(0.0);
            label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
            self.list.append(&label);
        }
    }

    fn row_height(&self) -> i32 {
        self.list
            .row_at_index(0)
            .map(|row| row.measure(gtk4::Orientation::Vertical, -1).1)
            .unwrap_or(0)
    }

    fn update_height(&self) {
        let rows = self.state.borrow().visible().len();
        let height = desired_height(self.row_height(), rows, self.available.get());

        let mut tracker = self.height.get();
        let reflow = tracker.update(height);
        self.height.set(tracker);

        match reflow {
            Some(Reflow::Grow { max, min }) => {
                self.scroll.set_max_content_height(max);
                self.scroll.set_min_content_height(min);
            }
            Some(Reflow::Shrink { min, max }) => {
                self.scroll.set_min_content_height(min);
                self.scroll.set_max_content_height(max);
            }
            None => {}
        }
    }

    fn sync_selection(&self) {
        let selected = self.state.borrow().selected();
        match selected.and_then(|i| self.list.row_at_index(i as i32)) {
            Some(row) => self.list.select_row(Some(&row)),
            None => self.list.unselect_all(),
        }
    }

    fn apply(&self, outcome: KeyOutcome) -> glib::Propagation {
        match outcome {
            KeyOutcome::Select(_) => self.sync_selection(),
            KeyOutcome::FocusInput => {
                self.list.unselect_all();
                self.entry.grab_focus_without_selecting();
            }
            KeyOutcome::Commit(text) => {
                debug!("completion commit: {}", text);
                self.entry.set_text(&text);
                self.entry.set_position(-1);
                self.popover.popdown();
                for cb in self.on_commit.borrow().iter() {
                    cb(&text);
                }
            }
            KeyOutcome::Ignored => return glib::Propagation::Proceed,
        }
        glib::Propagation::Stop
    }
}

//  Signal wiring

fn completion_key(key: gdk::Key) -> CompletionKey {
    if key == gdk::Key::Down || key == gdk::Key::KP_Down {
        CompletionKey::Down
    } else if key == gdk::Key::Up || key == gdk::Key::KP_Up {
        CompletionKey::Up
    } else if key == gdk::Key::Return || key == gdk::Key::KP_Enter {
        CompletionKey::Return
    } else {
        CompletionKey::Other
    }
}

fn connect_keys(inner: &Rc<Inner>) {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    let keys = gtk4::EventControllerKey::new();
    // Capture phase, so arrow keys reach us before the entry moves its caret.
    keys.set_propagation_phase(gtk4::PropagationPhase::Capture);
    keys.connect_key_pressed(move |_, key, _, _| {
        let Some(inner) = weak.upgrade() else {
            return glib::Propagation::Proceed;
        };
        inner.show();
        let outcome = inner.state.borrow_mut().on_key(completion_key(key));
        inner.apply(outcome)
    });
    inner.entry.add_controller(keys);
}

fn connect_changed(inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    inner.entry.connect_changed(move |entry| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        inner.state.borrow_mut().on_text_changed(&entry.text());
        inner.rebuild_rows();
        inner.update_height();
        inner.sync_selection();
    });
}

fn connect_row_activated(inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    inner.list.connect_row_activated(move |_, row| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let Ok(index) = usize::try_from(row.index()) else {
            return;
        };
        let outcome = {
            let mut state = inner.state.borrow_mut();
            if !state.select(index) {
                return;
            }
            state.on_key(CompletionKey::Return)
        };
        inner.apply(outcome);
    });
}
