use std::io::{self, Write};
use std::ops::Range;

use crossterm::style::{self, Stylize};
use crossterm::{cursor, queue, terminal};

use crate::tui::selection::{Mode, SelectionState};

const TITLE: &str =
    "Versions (Press 'F' to search, 'Esc' to exit search, 'Enter' to download)";
const RULE: &str = "+-----------------+";
const HEADER: &str = "|     Version     |";

/// Rows `[start, end)` of the filtered list to draw, roughly centred on the cursor.
pub fn visible_window(cursor: Option<usize>, len: usize, window_size: usize) -> Range<usize> {
    let start = cursor.unwrap_or(0).saturating_sub(window_size / 2);
    let end = len.min(start + window_size);
    start.min(end)..end
}

/// Clear the screen and draw the current state. Lines end in `\r\n` so the
/// output is the same in raw and cooked mode.
pub fn render(out: &mut impl Write, state: &SelectionState, window_size: usize) -> io::Result<()> {
    queue!(
        out,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    )?;

    line(out, TITLE)?;
    line(out, "")?;

    if state.mode() == Mode::Searching {
        line(out, &format!("Search: {}_", state.query()))?;
        line(out, "")?;
    }

    line(out, RULE)?;
    line(out, HEADER)?;
    line(out, RULE)?;

    let filtered = state.filtered();
    if filtered.is_empty() {
        line(out, "    (no matches)")?;
    }
    for row in visible_window(state.cursor(), filtered.len(), window_size) {
        let version = filtered[row];
        if state.cursor() == Some(row) {
            queue!(
                out,
                style::PrintStyledContent(format!("   {version}   ").black().on_yellow())
            )?;
            line(out, "")?;
        } else {
            line(out, &format!("    {version}"))?;
        }
    }

    line(out, RULE)?;
    line(out, &format!("{}/{} versions", filtered.len(), state.total()))?;
    out.flush()
}

fn line(out: &mut impl Write, text: &str) -> io::Result<()> {
    queue!(out, style::Print(text), style::Print("\r\n"))
}
