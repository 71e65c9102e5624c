//! Filter and cursor state for the version list.

use crate::tui::input::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Searching,
}

/// How the interactive loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed(String),
    Cancelled,
}

/// The full version list plus the live filter over it.
///
/// `filtered` always holds exactly the versions containing `query`
/// (case-sensitive), in manifest order. `cursor` is `None` iff `filtered`
/// is empty, and returns to the first row whenever `query` changes.
#[derive(Debug, Clone)]
pub struct SelectionState {
    all: Vec<String>,
    query: String,
    filtered: Vec<usize>,
    cursor: Option<usize>,
    mode: Mode,
}

impl SelectionState {
    pub fn new(all: Vec<String>) -> Self {
        let mut state = Self {
            all,
            query: String::new(),
            filtered: Vec::new(),
            cursor: None,
            mode: Mode::Browsing,
        };
        state.refilter();
        state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.all.len()
    }

    pub fn filtered(&self) -> Vec<&str> {
        self.filtered.iter().map(|&i| self.all[i].as_str()).collect()
    }

    pub fn selected(&self) -> Option<&str> {
        let row = self.cursor?;
        self.filtered.get(row).map(|&i| self.all[i].as_str())
    }

    /// Apply one key. Returns `Some` when the loop should stop.
    pub fn handle_key(&mut self, key: Key) -> Option<Outcome> {
        match (self.mode, key) {
            (_, Key::Interrupt) => return Some(Outcome::Cancelled),
            (_, Key::Up) => self.move_up(),
            (_, Key::Down) => self.move_down(),
            // Enter confirms from either mode so a narrowed list can be picked
            (_, Key::Enter) => {
                if let Some(id) = self.selected() {
                    return Some(Outcome::Confirmed(id.to_string()));
                }
            }

            (Mode::Browsing, Key::Char('f' | 'F')) => self.mode = Mode::Searching,
            (Mode::Browsing, Key::Escape) => return Some(Outcome::Cancelled),
            (Mode::Browsing, _) => {}

            (Mode::Searching, Key::Escape) => {
                self.mode = Mode::Browsing;
                if !self.query.is_empty() {
                    self.query.clear();
                    self.refilter();
                }
            }
            (Mode::Searching, Key::Backspace) => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
            }
            (Mode::Searching, Key::Char(c)) if !c.is_control() => {
                self.query.push(c);
                self.refilter();
            }
            (Mode::Searching, Key::Char(_)) => {}
        }
        None
    }

    fn refilter(&mut self) {
        self.filtered = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, v)| v.contains(self.query.as_str()))
            .map(|(i, _)| i)
            .collect();
        self.cursor = if self.filtered.is_empty() { None } else { Some(0) };
    }

    fn move_up(&mut self) {
        if let Some(row) = self.cursor {
            self.cursor = Some(row.saturating_sub(1));
        }
    }

    fn move_down(&mut self) {
        if let Some(row) = self.cursor {
            if row + 1 < self.filtered.len() {
                self.cursor = Some(row + 1);
            }
        }
    }
}
