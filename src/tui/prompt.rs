use std::io::Write;

use crate::core::error::{BrowserError, BrowserResult};
use crate::tui::input::{Key, KeySource};

/// Ask a yes/no question, re-asking until `y` or `n` (either case) is pressed.
pub fn confirm(keys: &mut dyn KeySource, out: &mut impl Write, question: &str) -> BrowserResult<bool> {
    write!(out, "{question} [y/n] ")?;
    out.flush()?;

    loop {
        let answer = match keys.read_key()? {
            Key::Char('y' | 'Y') => true,
            Key::Char('n' | 'N') => false,
            Key::Interrupt => return Err(BrowserError::Interrupted),
            _ => {
                write!(out, "\r\n{question} [y/n] ")?;
                out.flush()?;
                continue;
            }
        };
        write!(out, "{}\r\n", if answer { "y" } else { "n" })?;
        out.flush()?;
        return Ok(answer);
    }
}
