//! Key representation for editor input

/// Key codes recognized by the input interpreter.
///
/// Printable characters use `Rune` with the character carried alongside in
/// [`KeyEvent`]. Control chords that the editor binds get their own codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Printable character
    Rune,
    Escape,
    Backspace,
    Tab,
    Enter,
    Delete,
    /// Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Navigation keys
    Home,
    End,
    PageUp,
    PageDown,
    /// Control chords
    CtrlC,
    CtrlD,
    CtrlU,
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// A single key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    /// Present only when `code == KeyCode::Rune`.
    pub rune: Option<char>,
    pub mods: Modifiers,
}

impl KeyEvent {
    /// A printable character key press.
    pub fn rune(c: char) -> Self {
        KeyEvent {
            code: KeyCode::Rune,
            rune: Some(c),
            mods: Modifiers::default(),
        }
    }

    /// A non-printable key press.
    pub fn key(code: KeyCode) -> Self {
        KeyEvent {
            code,
            rune: None,
            mods: Modifiers::default(),
        }
    }
}

/// Terminal events consumed by the input interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize { width: usize, height: usize },
}
