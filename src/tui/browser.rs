use std::io::Write;

use tracing::debug;

use crate::core::error::BrowserResult;
use crate::tui::input::KeySource;
use crate::tui::render::render;
use crate::tui::selection::{Outcome, SelectionState};

/// Run the interactive list until a version is confirmed or the user leaves.
pub fn browse(
    mut state: SelectionState,
    keys: &mut dyn KeySource,
    out: &mut impl Write,
    window_size: usize,
) -> BrowserResult<Outcome> {
    render(out, &state, window_size)?;
    loop {
        let key = keys.read_key()?;
        if let Some(outcome) = state.handle_key(key) {
            debug!("Browser finished: {:?}", outcome);
            return Ok(outcome);
        }
        render(out, &state, window_size)?;
    }
}
