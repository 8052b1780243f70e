//! Centralized error definitions for Sable
//!
//! Only recoverable errors live here. Invariant violations (token overlap,
//! malformed bytecode, capture misuse) are programming errors and panic at
//! the point of detection.

use thiserror::Error;

/// Errors produced while parsing a regular expression.
///
/// These surface at tokenizer construction time, never during tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegexError {
    #[error("unexpected end of regular expression")]
    UnexpectedEnd,

    #[error("unexpected closing paren")]
    UnexpectedCloseParen,

    #[error("expected closing paren")]
    ExpectedCloseParen,

    /// A quantifier or union with nothing to apply to (e.g. `*ab`, `|ab`).
    #[error("expected characters before {0}")]
    MissingOperand(&'static str),

    #[error("invalid escape sequence")]
    InvalidEscape,

    #[error("unrecognized escape sequence in character class")]
    InvalidClassEscape,

    #[error("expected closing bracket")]
    ExpectedClosingBracket,
}

/// Errors produced by configuration validation.
///
/// The editor falls back to the default for the invalid field and shows
/// the error as a status message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("tabSize must be greater than zero")]
    TabSizeZero,

    #[error("lineWrap must be either \"character\" or \"word\"")]
    InvalidLineWrap,

    #[error("menu command {name:?} must have mode set to either \"silent\", \"terminal\", \"insert\", \"insertChoice\", or \"fileLocations\"")]
    InvalidMenuMode { name: String },
}
