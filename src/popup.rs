//! Placement and dismissal logic for popups opened from a status bar.
//!
//! A popup is launched by a bar click handler with the click position and
//! the bar height on its command line ([`LaunchArgs`]). It centres itself
//! horizontally on the click, sits just above the bar (or below the click
//! when there is no room above), and goes away on Escape or when the
//! pointer really leaves it.
//!
//! [`Popup`] holds that state machine. It has no toolkit dependency; the
//! GTK glue in [`widgets::window`](crate::widgets) feeds it events and
//! applies the resulting [`PopupAction`]s.

use log::debug;
use std::num::ParseIntError;

/// An axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `(px, py)` lies strictly inside the rectangle. Points on the
    /// border count as outside.
    pub fn contains_strict(&self, px: f64, py: f64) -> bool {
        let (left, top) = (self.x as f64, self.y as f64);
        let (right, bottom) = (left + self.width as f64, top + self.height as f64);
        left < px && px < right && top < py && py < bottom
    }

    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Popup width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

//  Launch arguments

/// Positional `X Y BAR_HEIGHT` arguments passed by the bar's click handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    /// Absolute click position; `None` unless both X and Y were given.
    pub anchor: Option<(i32, i32)>,
    /// Bar height; `None` means "use the configured default".
    pub bar_height: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("argument {position} ({value:?}) is not a number: {source}")]
pub struct LaunchArgsError {
    pub position: usize,
    pub value: String,
    #[source]
    pub source: ParseIntError,
}

impl LaunchArgs {
    /// Parse up to three positional integers (program name excluded).
    /// Extra arguments are ignored.
    pub fn parse<I, S>(args: I) -> Result<Self, LaunchArgsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut numbers = [None; 3];
        for (i, arg) in args.into_iter().take(3).enumerate() {
            let arg = arg.as_ref();
            let n = arg.trim().parse::<i32>().map_err(|source| LaunchArgsError {
                position: i + 1,
                value: arg.to_string(),
                source,
            })?;
            numbers[i] = Some(n);
        }
        let [x, y, bar_height] = numbers;
        Ok(Self {
            anchor: x.zip(y),
            bar_height,
        })
    }
}

//  Placement

/// Where to put the popup: its top-left corner in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupGeometry {
    pub x: i32,
    pub y: i32,
}

/// The anchor used when no click position was passed: the bottom centre of
/// the work area.
pub fn default_anchor(workarea: Rect) -> (i32, i32) {
    (workarea.x + workarea.width / 2, workarea.y + workarea.height)
}

/// Compute the popup position for a click at `anchor`.
///
/// The popup's horizontal centre sits on the click, clamped so the popup
/// stays inside `workarea`. Its bottom edge sits `bar_height + gap` above
/// the click; if that pushes the top edge above the work area, the popup is
/// flipped below instead.
pub fn place(anchor: (i32, i32), workarea: Rect, size: Size, bar_height: i32, gap: i32) -> PopupGeometry {
    let half = size.width / 2;
    let centre_x = (anchor.0 - workarea.x)
        .min(workarea.width - half)
        .max(half);

    let mut bottom = (anchor.1 - workarea.y).min(workarea.height) - bar_height - gap;
    if bottom - size.height < 0 {
        bottom = size.height + bar_height + 2 * gap;
    }

    PopupGeometry {
        x: workarea.x + centre_x - half,
        y: workarea.y + bottom - size.height,
    }
}

//  Visibility state machine

/// Detail of a pointer-leave notification, as in X11 crossing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDetail {
    Ancestor,
    Virtual,
    Inferior,
    Nonlinear,
    NonlinearVirtual,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupVisibility {
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupEvent {
    Show,
    Resize,
    Escape,
    /// The pointer left the window. `pointer` is the window-local pointer
    /// position when the pointer is still over the window, `None` when it
    /// is over something else.
    Leave {
        detail: CrossingDetail,
        pointer: Option<(f64, f64)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Move(PopupGeometry),
    Hide,
    Nothing,
}

/// Popup placement and dismissal state.
#[derive(Debug, Clone)]
pub struct Popup {
    anchor: (i32, i32),
    workarea: Rect,
    bar_height: i32,
    gap: i32,
    visibility: PopupVisibility,
}

impl Popup {
    pub fn new(anchor: (i32, i32), workarea: Rect, bar_height: i32, gap: i32) -> Self {
        Self {
            anchor,
            workarea,
            bar_height,
            gap,
            visibility: PopupVisibility::Hidden,
        }
    }

    pub fn visibility(&self) -> PopupVisibility {
        self.visibility
    }

    pub fn anchor(&self) -> (i32, i32) {
        self.anchor
    }

    pub fn workarea(&self) -> Rect {
        self.workarea
    }

    /// Where a popup of `size` goes.
    pub fn geometry(&self, size: Size) -> PopupGeometry {
        place(self.anchor, self.workarea, size, self.bar_height, self.gap)
    }

    /// Feed one event; `size` is the popup's current size.
    pub fn handle(&mut self, event: PopupEvent, size: Size) -> PopupAction {
        match (self.visibility, event) {
            (_, PopupEvent::Show) => {
                self.visibility = PopupVisibility::Shown;
                PopupAction::Move(self.geometry(size))
            }
            (PopupVisibility::Hidden, _) => PopupAction::Nothing,
            (PopupVisibility::Shown, PopupEvent::Resize) => PopupAction::Move(self.geometry(size)),
            (PopupVisibility::Shown, PopupEvent::Escape) => {
                self.visibility = PopupVisibility::Hidden;
                PopupAction::Hide
            }
            (PopupVisibility::Shown, PopupEvent::Leave { detail, pointer }) => {
                // Leave notifications also fire when crossing into child
                // widgets or overlapping windows; only a nonlinear leave
                // with the pointer outside our bounds counts. Wayland
                // reports every crossing with an unknown detail.
                let bounds = Rect::new(0, 0, size.width, size.height);
                let nonlinear = matches!(detail, CrossingDetail::Nonlinear | CrossingDetail::Unknown);
                let outside = pointer.map_or(true, |(x, y)| !bounds.contains_strict(x, y));
                if nonlinear && outside {
                    self.visibility = PopupVisibility::Hidden;
                    PopupAction::Hide
                } else {
                    debug!("ignoring leave ({:?}, pointer {:?})", detail, pointer);
                    PopupAction::Nothing
                }
            }
        }
    }
}
