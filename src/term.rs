//! Terminal event acquisition (crossterm backend)
//!
//! The only place that touches the terminal. Everything past this boundary
//! speaks the crate's own event types.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode as CtKeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::key::{KeyCode, KeyEvent, Modifiers, TerminalEvent};

/// Put the terminal into raw mode for key-by-key input.
pub fn init() -> io::Result<()> {
    terminal::enable_raw_mode()
}

/// Restore the terminal. Safe to call more than once.
pub fn shutdown() -> io::Result<()> {
    terminal::disable_raw_mode()
}

/// Current terminal dimensions, with a sane fallback.
pub fn size() -> (usize, usize) {
    terminal::size()
        .map(|(w, h)| (w as usize, h as usize))
        .unwrap_or((80, 24))
}

/// Wait up to `timeout` for the next event.
pub fn read_event(timeout: Duration) -> io::Result<Option<TerminalEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate_event(event::read()?))
}

/// Translate a crossterm event into the crate's event type. Events the
/// editor does not consume map to `None`.
pub fn translate_event(event: CtEvent) -> Option<TerminalEvent> {
    match event {
        CtEvent::Key(key) if key.kind != KeyEventKind::Release => {
            translate_key(key).map(TerminalEvent::Key)
        }
        CtEvent::Resize(width, height) => Some(TerminalEvent::Resize {
            width: width as usize,
            height: height as usize,
        }),
        _ => None,
    }
}

fn translate_key(key: event::KeyEvent) -> Option<KeyEvent> {
    let mods = Modifiers {
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    };

    let code = match key.code {
        CtKeyCode::Char(c) if mods.ctrl => match c {
            'c' => KeyCode::CtrlC,
            'd' => KeyCode::CtrlD,
            'u' => KeyCode::CtrlU,
            _ => return None,
        },
        CtKeyCode::Char(c) => {
            return Some(KeyEvent {
                code: KeyCode::Rune,
                rune: Some(c),
                mods,
            })
        }
        CtKeyCode::Esc => KeyCode::Escape,
        CtKeyCode::Backspace => KeyCode::Backspace,
        CtKeyCode::Tab => KeyCode::Tab,
        CtKeyCode::Enter => KeyCode::Enter,
        CtKeyCode::Delete => KeyCode::Delete,
        CtKeyCode::Up => KeyCode::ArrowUp,
        CtKeyCode::Down => KeyCode::ArrowDown,
        CtKeyCode::Left => KeyCode::ArrowLeft,
        CtKeyCode::Right => KeyCode::ArrowRight,
        CtKeyCode::Home => KeyCode::Home,
        CtKeyCode::End => KeyCode::End,
        CtKeyCode::PageUp => KeyCode::PageUp,
        CtKeyCode::PageDown => KeyCode::PageDown,
        _ => return None,
    };

    Some(KeyEvent {
        code,
        rune: None,
        mods,
    })
}
