//! Entry completion that stays inside its parent window.
//!
//! A query matches a candidate when every whitespace-separated word of the
//! query occurs somewhere in the candidate, ignoring case and word order:
//! `in dead ships` matches `In Flames - Where the Dead Ships Dwell`.
//!
//! [`CompletionState`] owns the candidate list, the filtered view and the
//! selection; [`ContentHeight`] decides how the list is resized. The GTK
//! widget in [`widgets::completion`](crate::widgets) only forwards input and
//! renders what these say.

/// Whether every word in `query` occurs in `candidate`, case-insensitively.
///
/// An empty query matches everything.
pub fn matches(candidate: &str, query: &str) -> bool {
    let candidate = candidate.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .all(|token| candidate.contains(token))
}

/// Candidates matching `query`, in their original order.
pub fn filter(candidates: &[String], query: &str) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| matches(c, query))
        .cloned()
        .collect()
}

/// Keys the completion list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKey {
    Down,
    Up,
    Return,
    Other,
}

/// What the widget should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Highlight the row at this index. The key is consumed.
    Select(usize),
    /// Clear the selection and give focus back to the entry. The key is
    /// consumed.
    FocusInput,
    /// Put this text into the entry, move the caret to the end and hide the
    /// list. The key is consumed.
    Commit(String),
    /// Not ours; let the next handler see the key.
    Ignored,
}

impl KeyOutcome {
    pub fn is_consumed(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}

/// Candidate list, filtered view and selection.
#[derive(Debug, Clone, Default)]
pub struct CompletionState {
    candidates: Vec<String>,
    visible: Vec<String>,
    selected: Option<usize>,
}

impl CompletionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidates and show all of them, unfiltered.
    pub fn set_candidates(&mut self, candidates: Vec<String>) {
        self.visible = candidates.clone();
        self.candidates = candidates;
        self.selected = None;
    }

    /// Rebuild the visible list for `text` and select its first row.
    pub fn on_text_changed(&mut self, text: &str) {
        self.visible = filter(&self.candidates, text);
        self.selected = if self.visible.is_empty() { None } else { Some(0) };
    }

    pub fn on_key(&mut self, key: CompletionKey) -> KeyOutcome {
        match key {
            CompletionKey::Down => {
                let next = self.selected.map_or(0, |i| i + 1);
                self.select_or_release(next)
            }
            CompletionKey::Up => match self.selected {
                Some(i) if i > 0 => self.select_or_release(i - 1),
                _ => self.release(),
            },
            CompletionKey::Return => match self.selected_text() {
                Some(text) => {
                    let text = text.to_string();
                    self.selected = None;
                    KeyOutcome::Commit(text)
                }
                None => KeyOutcome::Ignored,
            },
            CompletionKey::Other => KeyOutcome::Ignored,
        }
    }

    /// Select the row at `index` directly (e.g. a mouse click).
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.visible.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.visible.get(i))
            .map(String::as_str)
    }

    fn select_or_release(&mut self, index: usize) -> KeyOutcome {
        if index < self.visible.len() {
            self.selected = Some(index);
            KeyOutcome::Select(index)
        } else {
            self.release()
        }
    }

    fn release(&mut self) -> KeyOutcome {
        self.selected = None;
        KeyOutcome::FocusInput
    }
}

//  Sizing

/// Slack kept between the minimum and maximum content height.
const MIN_HEIGHT_SLACK: i32 = 10;

/// Height of `rows` rows, capped at the space available below the entry.
pub fn desired_height(row_height: i32, rows: usize, available: i32) -> i32 {
    let rows = i32::try_from(rows).unwrap_or(i32::MAX);
    row_height.saturating_mul(rows).min(available).max(0)
}

/// Ordered bounds update for the scrolled list.
///
/// Growing raises the maximum before the minimum and shrinking lowers the
/// minimum before the maximum, so min never exceeds max mid-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflow {
    Grow { max: i32, min: i32 },
    Shrink { min: i32, max: i32 },
}

/// Tracks the last applied list height.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHeight {
    previous: i32,
}

impl ContentHeight {
    /// The bounds update for `height`, or `None` if it did not change.
    pub fn update(&mut self, height: i32) -> Option<Reflow> {
        let min = (height - MIN_HEIGHT_SLACK).max(0);
        let reflow = match height.cmp(&self.previous) {
            std::cmp::Ordering::Equal => return None,
            std::cmp::Ordering::Greater => Reflow::Grow { max: height, min },
            std::cmp::Ordering::Less => Reflow::Shrink { min, max: height },
        };
        self.previous = height;
        Some(reflow)
    }
}
