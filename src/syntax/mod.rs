//! Incremental syntax tokenization
//!
//! A combinator-built tokenizer consumes runes from the buffer and emits
//! tokens into a persistent [`TokenTree`]. Each run records `(position,
//! state)` checkpoints at loop boundaries; after an edit, tokenization
//! restarts from the latest checkpoint whose kept prefix the edit cannot
//! have influenced, and the reparsed suffix is joined onto that prefix.

pub mod languages;
pub mod nfa;
pub mod parse_func;
pub mod regexp;
pub mod rules;
pub mod token_tree;

use std::cell::Cell;
use std::rc::Rc;

use crate::buffer::TextBuffer;
use crate::error::RegexError;

pub use languages::xml::XmlParseState;
pub use parse_func::LanguageTokenizer;
pub use token_tree::{TokenIter, TokenTree};

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Comment,
    Keyword,
    Number,
    String,
    /// Language-specific roles, styled via configuration.
    Custom(u8),
}

/// A tokenized span of the buffer.
///
/// Invariant: `start_pos < end_pos <= lookahead_pos`. The lookahead is the
/// furthest position the tokenizer examined while deciding this token and
/// bounds how far ahead an edit can invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start_pos: usize,
    pub end_pos: usize,
    pub lookahead_pos: usize,
    pub role: TokenRole,
}

/// Parser state threaded through combinator runs, enumerated across all
/// supported languages so equality stays structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Plaintext,
    Json,
    Xml(XmlParseState),
}

/// A supported syntax language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Plaintext,
    Json,
    Xml,
}

impl Language {
    /// Look up a language by its configuration name.
    pub fn from_name(name: &str) -> Option<Language> {
        match name {
            "plaintext" => Some(Language::Plaintext),
            "json" => Some(Language::Json),
            "xml" => Some(Language::Xml),
            _ => None,
        }
    }

    /// Construct the language's tokenizer. Rule-driven languages can fail
    /// here if a pattern is malformed; they never fail during tokenization.
    pub fn tokenizer(&self) -> Result<LanguageTokenizer, RegexError> {
        match self {
            Language::Plaintext => Ok(languages::plaintext_tokenizer()),
            Language::Json => languages::json::json_tokenizer(),
            Language::Xml => Ok(languages::xml::xml_tokenizer()),
        }
    }
}

/// A restartable tokenization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    pos: usize,
    state: ParserState,
}

/// The result of a tokenizer run over the buffer.
#[derive(Debug, Clone)]
pub struct ParseRun {
    pub tree: TokenTree,
    checkpoints: Vec<Checkpoint>,
}

impl ParseRun {
    pub fn empty(tokenizer: &LanguageTokenizer) -> Self {
        ParseRun {
            tree: TokenTree::new(),
            checkpoints: vec![Checkpoint {
                pos: 0,
                state: tokenizer.initial_state,
            }],
        }
    }
}

/// Tokenize the whole buffer.
pub fn tokenize(tokenizer: &LanguageTokenizer, buffer: &TextBuffer) -> ParseRun {
    run_from(
        tokenizer,
        buffer,
        Checkpoint {
            pos: 0,
            state: tokenizer.initial_state,
        },
        TokenTree::new(),
        Vec::new(),
    )
}

/// Re-tokenize after an edit whose leftmost affected position is
/// `edit_start`.
///
/// Tokens that ended and stopped looking ahead before the edit are kept
/// verbatim; everything from the chosen restart checkpoint on is reparsed
/// against the edited buffer and joined onto the preserved prefix.
pub fn retokenize(
    tokenizer: &LanguageTokenizer,
    prev: &ParseRun,
    buffer: &TextBuffer,
    edit_start: usize,
) -> ParseRun {
    let tokens: Vec<Token> = prev.tree.iter().collect();

    // Highest lookahead among tokens ending at or before each prefix end.
    let restart = choose_restart(tokenizer, &prev.checkpoints, &tokens, edit_start);

    let mut prefix = TokenTree::new();
    for token in tokens.iter().take_while(|t| t.end_pos <= restart.pos) {
        prefix = prefix.insert(*token);
    }

    let kept_checkpoints: Vec<Checkpoint> = prev
        .checkpoints
        .iter()
        .copied()
        .take_while(|c| c.pos <= restart.pos)
        .collect();

    run_from(tokenizer, buffer, restart, prefix, kept_checkpoints)
}

fn choose_restart(
    tokenizer: &LanguageTokenizer,
    checkpoints: &[Checkpoint],
    tokens: &[Token],
    edit_start: usize,
) -> Checkpoint {
    let initial = Checkpoint {
        pos: 0,
        state: tokenizer.initial_state,
    };
    for checkpoint in checkpoints.iter().rev() {
        if checkpoint.pos > edit_start {
            continue;
        }
        let prefix_ok = tokens
            .iter()
            .take_while(|t| t.end_pos <= checkpoint.pos)
            .all(|t| t.lookahead_pos <= edit_start);
        if prefix_ok {
            return *checkpoint;
        }
    }
    initial
}

fn run_from(
    tokenizer: &LanguageTokenizer,
    buffer: &TextBuffer,
    start: Checkpoint,
    prefix: TokenTree,
    mut checkpoints: Vec<Checkpoint>,
) -> ParseRun {
    if checkpoints.is_empty() {
        checkpoints.push(start);
    }

    let num_chars = buffer.num_chars();
    let base = start.pos;
    let runes: Rc<Vec<char>> = Rc::new(buffer.runes_forward(base).collect());

    let mut tree = TokenTree::new();
    let mut pos = start.pos;
    let mut state = start.state;
    while pos < num_chars {
        let tracker = Rc::new(Cell::new(pos));
        let reader =
            parse_func::TrackingReader::new(runes.clone(), base, pos - base, tracker.clone());

        match tokenizer.parse.run(reader, state) {
            Some(result) if result.num_consumed > 0 => {
                let lookahead = tracker.get();
                for computed in &result.tokens {
                    let start_pos = pos + computed.offset;
                    let end_pos = start_pos + computed.length;
                    tree = tree.insert(Token {
                        start_pos,
                        end_pos,
                        lookahead_pos: lookahead.max(end_pos),
                        role: computed.role,
                    });
                }
                pos += result.num_consumed;
                if !result.tokens.is_empty() || result.next_state != state {
                    state = result.next_state;
                    checkpoints.push(Checkpoint { pos, state });
                } else {
                    state = result.next_state;
                }
            }
            _ => {
                // No rule applies here; skip one rune and try again.
                pos += 1;
            }
        }
    }

    ParseRun {
        tree: prefix.join(&tree),
        checkpoints,
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
