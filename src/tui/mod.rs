// ─── Terminal UI ───
//   input      — normalised keys + terminal / byte-stream sources
//   selection  — filter + cursor state machine
//   render     — windowed list drawing
//   prompt     — yes/no question
//   browser    — loop wiring input → selection → render

pub mod browser;
pub mod input;
pub mod prompt;
pub mod render;
pub mod selection;

pub use browser::browse;
pub use input::{open_keys, Key, KeySource};
pub use selection::{Mode, Outcome, SelectionState};
