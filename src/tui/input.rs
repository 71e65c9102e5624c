//! Keyboard input normalised to a small set of symbolic keys.
//!
//! Two sources exist: [`TerminalKeys`] reads crossterm events from a real
//! terminal in raw mode, and [`ByteKeys`] decodes a plain byte stream (piped
//! stdin), folding the ANSI and DOS arrow-key encodings into `Up`/`Down`.
//! Callers only ever see [`Key`].

use std::collections::VecDeque;
use std::io::{self, IsTerminal, Read};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::core::error::{BrowserError, BrowserResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Up,
    Down,
    /// Ctrl-C.
    Interrupt,
}

pub trait KeySource {
    /// Block until one key is available.
    fn read_key(&mut self) -> BrowserResult<Key>;
}

/// Pick the key source for this process: the terminal when stdin is a TTY,
/// otherwise a byte decoder over stdin.
pub fn open_keys() -> BrowserResult<Box<dyn KeySource>> {
    if io::stdin().is_terminal() {
        Ok(Box::new(TerminalKeys::enter()?))
    } else {
        Ok(Box::new(ByteKeys::new(io::stdin())))
    }
}

// ── Terminal ─────────────────────────────────────────────

/// Keys from the controlling terminal. Raw mode is held for the lifetime of
/// this value and restored on drop.
pub struct TerminalKeys {
    _private: (),
}

impl TerminalKeys {
    pub fn enter() -> BrowserResult<Self> {
        terminal::enable_raw_mode().map_err(BrowserError::TerminalSetup)?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl KeySource for TerminalKeys {
    fn read_key(&mut self) -> BrowserResult<Key> {
        loop {
            if let Event::Key(key) = event::read()? {
                if let Some(key) = normalize_event(key) {
                    return Ok(key);
                }
            }
        }
    }
}

/// Map a crossterm key event to a [`Key`]; `None` for anything the browser ignores.
pub fn normalize_event(event: KeyEvent) -> Option<Key> {
    // Windows reports both press and release
    if event.kind == KeyEventKind::Release {
        return None;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Key::Interrupt),
            _ => None,
        };
    }
    match event.code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Backspace | KeyCode::Delete => Some(Key::Backspace),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        _ => None,
    }
}

// ── Byte stream ──────────────────────────────────────────

const ESC: u8 = 0x1b;
const ETX: u8 = 0x03;
const BS: u8 = 0x08;
const DEL: u8 = 0x7f;
const DOS_EXTENDED: u8 = 0xe0;
const DOS_NUL: u8 = 0x00;

/// Decodes keys from raw bytes, one read at a time.
pub struct ByteKeys<R> {
    reader: R,
    pending: VecDeque<u8>,
}

impl<R: Read> ByteKeys<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    fn next_byte(&mut self) -> BrowserResult<Option<u8>> {
        if let Some(b) = self.pending.pop_front() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn unread(&mut self, byte: u8) {
        self.pending.push_front(byte);
    }

    /// After ESC: `[A`/`OA` style arrows, anything else means a bare Escape.
    fn decode_escape(&mut self) -> BrowserResult<Option<Key>> {
        let Some(intro) = self.next_byte()? else {
            return Ok(Some(Key::Escape));
        };
        if intro != b'[' && intro != b'O' {
            self.unread(intro);
            return Ok(Some(Key::Escape));
        }
        // Consume parameter bytes up to the final byte of the sequence
        loop {
            let Some(b) = self.next_byte()? else {
                return Ok(None);
            };
            match b {
                b'A' => return Ok(Some(Key::Up)),
                b'B' => return Ok(Some(Key::Down)),
                0x40..=0x7e => return Ok(None),
                _ => continue,
            }
        }
    }

    fn decode_utf8(&mut self, lead: u8) -> BrowserResult<Option<Key>> {
        let len = match lead {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Ok(None),
        };
        let mut bytes = vec![lead];
        for _ in 1..len {
            match self.next_byte()? {
                Some(b) => bytes.push(b),
                None => return Ok(None),
            }
        }
        Ok(std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char))
    }
}

impl<R: Read> KeySource for ByteKeys<R> {
    fn read_key(&mut self) -> BrowserResult<Key> {
        loop {
            let Some(byte) = self.next_byte()? else {
                return Err(BrowserError::InputClosed);
            };
            let key = match byte {
                ESC => self.decode_escape()?,
                DOS_EXTENDED | DOS_NUL => match self.next_byte()? {
                    Some(b'H') => Some(Key::Up),
                    Some(b'P') => Some(Key::Down),
                    // 0xE0 is also a UTF-8 lead byte
                    Some(cont @ 0x80..=0xbf) if byte == DOS_EXTENDED => {
                        self.unread(cont);
                        self.decode_utf8(byte)?
                    }
                    _ => None,
                },
                b'\r' | b'\n' => Some(Key::Enter),
                BS | DEL => Some(Key::Backspace),
                ETX => Some(Key::Interrupt),
                b if b.is_ascii_control() => None,
                b if b.is_ascii() => Some(Key::Char(b as char)),
                b => self.decode_utf8(b)?,
            };
            if let Some(key) = key {
                return Ok(key);
            }
        }
    }
}

/// Replays a fixed list of keys; reports a closed input once exhausted.
#[cfg(test)]
pub struct ScriptedKeys(pub VecDeque<Key>);

#[cfg(test)]
impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self(keys.into_iter().collect())
    }
}

#[cfg(test)]
impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> BrowserResult<Key> {
        self.0.pop_front().ok_or(BrowserError::InputClosed)
    }
}
