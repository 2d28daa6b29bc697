//! GTK4 + layer-shell popup window.
//!
//! The window is a borderless overlay surface anchored to the top-left of
//! its monitor; the [`Popup`] state machine decides the margins. GTK4 has
//! no API to move a toplevel, which is why layer-shell is used.
//!
//! # CSS classes
//!
//! | Class                | Used for                                 |
//! |----------------------|------------------------------------------|
//! | `.left-semi-circle`  | Left end of a button group               |
//! | `.right-semi-circle` | Right end of a button group              |
//! | `.circular`          | Round buttons                            |
//! | `.margin-fix`        | Widgets that need to line up with those  |

use crate::config::PopupConfig;
use crate::popup::{
    default_anchor, CrossingDetail, LaunchArgs, Popup, PopupAction, PopupEvent, Rect, Size,
};
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

//  Default CSS

pub const DEFAULT_CSS: &str = r#"
.left-semi-circle {
    border-top-left-radius: 25px;
    border-bottom-left-radius: 25px;
}

.right-semi-circle {
    border-top-right-radius: 25px;
    border-bottom-right-radius: 25px;
}

.circular {
    margin-top: 10px;
}

.margin-fix {
    margin-top: 15px;
}
"#;

/// The popup takes the keyboard as soon as it is mapped, so Escape and the
/// search entry work without a click first.
pub const KEYBOARD_MODE: KeyboardMode = KeyboardMode::Exclusive;

/// Stylesheet handed to [`PopupWindow::new`].
#[derive(Debug, Clone)]
pub struct Stylesheet(String);

impl Default for Stylesheet {
    fn default() -> Self {
        Self(DEFAULT_CSS.to_string())
    }
}

impl Stylesheet {
    /// Read `path` if it exists, otherwise use the built-in stylesheet.
    pub fn load(path: Option<&Path>) -> Self {
        match path.filter(|p| p.exists()) {
            Some(p) => match std::fs::read_to_string(p) {
                Ok(content) => {
                    info!("user CSS: {} ({} bytes)", p.display(), content.len());
                    Self(content)
                }
                Err(e) => {
                    warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                    Self::default()
                }
            },
            None => {
                debug!("no user CSS, using built-in default");
                Self::default()
            }
        }
    }

    pub fn css(&self) -> &str {
        &self.0
    }
}

/// Errors from building GTK widgets.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("failed to initialise GTK4: {0}")]
    Init(#[from] glib::BoolError),
    #[error("no GDK display")]
    NoDisplay,
    #[error("no monitor found")]
    NoMonitor,
}

type Callbacks = RefCell<Vec<Box<dyn Fn()>>>;

struct Inner {
    window: gtk4::Window,
    popup: RefCell<Popup>,
    monitor: Rect,
    fallback_size: Size,
    on_dismissed: Callbacks,
}

impl Inner {
    fn size(&self) -> Size {
        let (w, h) = (self.window.width(), self.window.height());
        if w > 0 && h > 0 {
            Size::new(w, h)
        } else {
            self.fallback_size
        }
    }

    fn dispatch(&self, event: PopupEvent) {
        let size = self.size();
        let action = self.popup.borrow_mut().handle(event, size);
        match action {
            PopupAction::Move(g) => {
                debug!("popup {}x{} at ({}, {})", size.width, size.height, g.x, g.y);
                self.window.set_margin(Edge::Left, g.x - self.monitor.x);
                self.window.set_margin(Edge::Top, g.y - self.monitor.y);
            }
            PopupAction::Hide => {
                info!("popup dismissed");
                self.window.set_visible(false);
                for cb in self.on_dismissed.borrow().iter() {
                    cb();
                }
            }
            PopupAction::Nothing => {}
        }
    }
}

/// Borderless always-on-top popup placed next to a status-bar click.
///
/// Hides on Escape or when the pointer leaves it for good. Put content into
/// [`content`](Self::content).
#[derive(Clone)]
pub struct PopupWindow {
    inner: Rc<Inner>,
    content: gtk4::Box,
}

impl PopupWindow {
    /// Build the window. GTK must already be initialised.
    pub fn new(
        config: &PopupConfig,
        args: &LaunchArgs,
        style: &Stylesheet,
    ) -> Result<Self, WidgetError> {
        let display = gdk::Display::default().ok_or(WidgetError::NoDisplay)?;
        apply_stylesheet(&display, style);

        let monitors = monitors(&display);
        let (monitor, geometry, anchor) = match args.anchor {
            Some((x, y)) => {
                let (m, g) = monitors
                    .iter()
                    .find(|(_, g)| g.contains_point(x, y))
                    .or_else(|| monitors.first())
                    .cloned()
                    .ok_or(WidgetError::NoMonitor)?;
                (m, g, (x, y))
            }
            None => {
                let (m, g) = monitors.first().cloned().ok_or(WidgetError::NoMonitor)?;
                (m, g, default_anchor(g))
            }
        };
        let bar_height = args.bar_height.unwrap_or(config.bar_height);
        info!(
            "popup anchored at ({}, {}) on {}x{}+{}+{}, bar height {}",
            anchor.0, anchor.1, geometry.width, geometry.height, geometry.x, geometry.y, bar_height
        );

        let window = gtk4::Window::new();
        window.init_layer_shell();
        window.set_layer(Layer::Overlay);
        window.set_namespace("barblocks");
        window.set_keyboard_mode(KEYBOARD_MODE);
        window.set_monitor(Some(&monitor));
        window.set_anchor(Edge::Top, true);
        window.set_anchor(Edge::Left, true);
        window.set_decorated(false);
        window.set_resizable(false);
        window.set_default_size(config.width, config.height);

        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
        content.set_margin_top(config.border_width);
        content.set_margin_bottom(config.border_width);
        content.set_margin_start(config.border_width);
        content.set_margin_end(config.border_width);
        window.set_child(Some(&content));

        let inner = Rc::new(Inner {
            window: window.clone(),
            popup: RefCell::new(Popup::new(anchor, geometry, bar_height, config.bar_gap)),
            monitor: geometry,
            fallback_size: Size::new(config.width, config.height),
            on_dismissed: RefCell::new(Vec::new()),
        });

        connect_escape(&window, &inner);
        connect_leave(&window, &inner);
        connect_resize(&window, &inner);

        Ok(Self { inner, content })
    }

    pub fn window(&self) -> &gtk4::Window {
        &self.inner.window
    }

    pub fn content(&self) -> &gtk4::Box {
        &self.content
    }

    pub fn show(&self) {
        self.inner.window.present();
        self.inner.dispatch(PopupEvent::Show);
    }

    /// Register `f` to run after the popup hid itself.
    pub fn connect_dismissed<F: Fn() + 'static>(&self, f: F) {
        self.inner.on_dismissed.borrow_mut().push(Box::new(f));
    }
}

//  Event wiring

fn connect_escape(window: &gtk4::Window, inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    let keys = gtk4::EventControllerKey::new();
    keys.connect_key_pressed(move |_, key, _, _| {
        if key != gdk::Key::Escape {
            return glib::Propagation::Proceed;
        }
        if let Some(inner) = weak.upgrade() {
            inner.dispatch(PopupEvent::Escape);
        }
        glib::Propagation::Stop
    });
    window.add_controller(keys);
}

fn connect_leave(window: &gtk4::Window, inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    let legacy = gtk4::EventControllerLegacy::new();
    legacy.connect_event(move |_, event| {
        if event.event_type() != gdk::EventType::LeaveNotify {
            return glib::Propagation::Proceed;
        }
        let (Some(crossing), Some(inner)) = (event.downcast_ref::<gdk::CrossingEvent>(), weak.upgrade())
        else {
            return glib::Propagation::Proceed;
        };
        // The event position is the last motion sample, so ask the seat
        // where the pointer is now.
        let pointer = match pointer_over(&inner.window) {
            PointerOver::Window(x, y) => Some((x, y)),
            PointerOver::Child => return glib::Propagation::Proceed,
            PointerOver::Elsewhere => None,
        };
        inner.dispatch(PopupEvent::Leave {
            detail: crossing_detail(crossing.detail()),
            pointer,
        });
        glib::Propagation::Proceed
    });
    window.add_controller(legacy);
}

/// Where the seat pointer is relative to a window.
enum PointerOver {
    /// Over the window surface, at surface-local coordinates.
    Window(f64, f64),
    /// Over a popover or menu surface parented to the window.
    Child,
    Elsewhere,
}

fn pointer_over(window: &gtk4::Window) -> PointerOver {
    let Some(ours) = window.surface() else {
        return PointerOver::Elsewhere;
    };
    let Some(pointer) = window.display().default_seat().and_then(|seat| seat.pointer()) else {
        return PointerOver::Elsewhere;
    };
    let (mut current, x, y) = pointer.surface_at_position();
    let mut nested = false;
    while let Some(surface) = current {
        if surface == ours {
            return if nested { PointerOver::Child } else { PointerOver::Window(x, y) };
        }
        current = surface.dynamic_cast_ref::<gdk::Popup>().and_then(|p| p.parent());
        nested = true;
    }
    PointerOver::Elsewhere
}

/// Re-place the popup whenever its allocated size changes.
fn connect_resize(window: &gtk4::Window, inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    let last = Cell::new((0, 0));
    window.add_tick_callback(move |w, _| {
        let Some(inner) = weak.upgrade() else {
            return glib::ControlFlow::Break;
        };
        let size = (w.width(), w.height());
        if size != last.get() {
            last.set(size);
            inner.dispatch(PopupEvent::Resize);
        }
        glib::ControlFlow::Continue
    });
}

fn crossing_detail(detail: gdk::NotifyType) -> CrossingDetail {
    match detail {
        gdk::NotifyType::Ancestor => CrossingDetail::Ancestor,
        gdk::NotifyType::Virtual => CrossingDetail::Virtual,
        gdk::NotifyType::Inferior => CrossingDetail::Inferior,
        gdk::NotifyType::Nonlinear => CrossingDetail::Nonlinear,
        gdk::NotifyType::NonlinearVirtual => CrossingDetail::NonlinearVirtual,
        _ => CrossingDetail::Unknown,
    }
}

//  Display helpers

/// All monitors with their geometry, in display order.
fn monitors(display: &gdk::Display) -> Vec<(gdk::Monitor, Rect)> {
    let list = display.monitors();
    (0..list.n_items())
        .filter_map(|i| list.item(i).and_downcast::<gdk::Monitor>())
        .map(|m| {
            let g = m.geometry();
            let rect = Rect::new(g.x(), g.y(), g.width(), g.height());
            (m, rect)
        })
        .collect()
}

fn apply_stylesheet(display: &gdk::Display, style: &Stylesheet) {
    let provider = gtk4::CssProvider::new();
    #[allow(deprecated)]
    provider.load_from_data(style.css());
    gtk4::style_context_add_provider_for_display(
        display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
    debug!("CSS registered on display");
}
