//! Parser combinators for building tokenizers
//!
//! A parse function consumes runes from a [`TrackingReader`] and either
//! fails or reports how many runes it consumed, which tokens it computed,
//! and the parser state to continue with. Combinators compose by wrapping.
//!
//! The reader records the furthest position examined, shared across clones;
//! that bound becomes each emitted token's lookahead position and limits how
//! much an edit invalidates.

use std::cell::Cell;
use std::rc::Rc;

use super::{ParserState, TokenRole};

/// A token computed by a parse function, relative to the read start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedToken {
    pub offset: usize,
    pub length: usize,
    pub role: TokenRole,
}

/// Successful parse outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub num_consumed: usize,
    pub tokens: Vec<ComputedToken>,
    pub next_state: ParserState,
}

/// Rune reader with a shared high-water mark for lookahead tracking.
///
/// Clones share the same tracker, so a combinator that reads ahead and then
/// backtracks still contributes to the lookahead bound.
#[derive(Clone)]
pub struct TrackingReader {
    runes: Rc<Vec<char>>,
    base: usize,
    offset: usize,
    tracker: Rc<Cell<usize>>,
}

impl TrackingReader {
    pub fn new(runes: Rc<Vec<char>>, base: usize, offset: usize, tracker: Rc<Cell<usize>>) -> Self {
        Self {
            runes,
            base,
            offset,
            tracker,
        }
    }

    /// Absolute character position of the next rune.
    pub fn position(&self) -> usize {
        self.base + self.offset
    }

    pub fn next_rune(&mut self) -> Option<char> {
        let rune = *self.runes.get(self.offset)?;
        self.offset += 1;
        let abs = self.base + self.offset;
        if abs > self.tracker.get() {
            self.tracker.set(abs);
        }
        Some(rune)
    }

    /// Skip `count` runes without re-examining them.
    pub fn advance(&mut self, count: usize) {
        self.offset = (self.offset + count).min(self.runes.len());
        let abs = self.base + self.offset;
        if abs > self.tracker.get() {
            self.tracker.set(abs);
        }
    }
}

/// A composable parse function.
#[derive(Clone)]
pub struct ParseFunc(Rc<dyn Fn(TrackingReader, ParserState) -> Option<ParseResult>>);

impl ParseFunc {
    pub fn new(f: impl Fn(TrackingReader, ParserState) -> Option<ParseResult> + 'static) -> Self {
        ParseFunc(Rc::new(f))
    }

    pub fn run(&self, reader: TrackingReader, state: ParserState) -> Option<ParseResult> {
        (self.0)(reader, state)
    }

    /// Run `self`, then `next` from where `self` stopped. Fails if either
    /// side fails.
    pub fn then(self, next: ParseFunc) -> ParseFunc {
        ParseFunc::new(move |reader, state| {
            let first = self.run(reader.clone(), state)?;
            let mut rest = reader;
            rest.advance(first.num_consumed);
            let second = next.run(rest, first.next_state)?;
            Some(combine(first, second))
        })
    }

    /// Run `self`, then `next`; if `next` fails, keep the first result.
    pub fn then_maybe(self, next: ParseFunc) -> ParseFunc {
        ParseFunc::new(move |reader, state| {
            let first = self.run(reader.clone(), state)?;
            let mut rest = reader;
            rest.advance(first.num_consumed);
            match next.run(rest, first.next_state) {
                Some(second) => Some(combine(first, second)),
                None => Some(first),
            }
        })
    }

    /// First match wins.
    pub fn or(self, other: ParseFunc) -> ParseFunc {
        ParseFunc::new(move |reader, state| {
            self.run(reader.clone(), state)
                .or_else(|| other.run(reader, state))
        })
    }

    /// Transform a successful result.
    pub fn map(self, f: impl Fn(ParseResult) -> ParseResult + 'static) -> ParseFunc {
        ParseFunc::new(move |reader, state| self.run(reader, state).map(&f))
    }
}

fn combine(first: ParseResult, second: ParseResult) -> ParseResult {
    let mut tokens = first.tokens;
    tokens.extend(second.tokens.iter().map(|t| ComputedToken {
        offset: t.offset + first.num_consumed,
        length: t.length,
        role: t.role,
    }));
    ParseResult {
        num_consumed: first.num_consumed + second.num_consumed,
        tokens,
        next_state: second.next_state,
    }
}

// --- Primitives ---

/// Succeeds if the next runes equal `s`, consuming them.
pub fn consume_string(s: &'static str) -> ParseFunc {
    ParseFunc::new(move |mut reader, state| {
        let mut consumed = 0;
        for expected in s.chars() {
            match reader.next_rune() {
                Some(r) if r == expected => consumed += 1,
                _ => return None,
            }
        }
        Some(ParseResult {
            num_consumed: consumed,
            tokens: Vec::new(),
            next_state: state,
        })
    })
}

/// Consumes up to and including the next occurrence of `s`; fails at EOF.
pub fn consume_to_string(s: &'static str) -> ParseFunc {
    ParseFunc::new(move |mut reader, state| {
        let target: Vec<char> = s.chars().collect();
        let mut window: Vec<char> = Vec::with_capacity(target.len());
        let mut consumed = 0;
        loop {
            let r = reader.next_rune()?;
            consumed += 1;
            if window.len() == target.len() {
                window.remove(0);
            }
            window.push(r);
            if window == target {
                return Some(ParseResult {
                    num_consumed: consumed,
                    tokens: Vec::new(),
                    next_state: state,
                });
            }
        }
    })
}

/// Consumes a maximal run of runes satisfying the predicate; fails if the
/// run is empty.
pub fn consume_runes_like(pred: impl Fn(char) -> bool + 'static) -> ParseFunc {
    ParseFunc::new(move |mut reader, state| {
        let mut consumed = 0;
        loop {
            match reader.next_rune() {
                Some(r) if pred(r) => consumed += 1,
                _ => break,
            }
        }
        if consumed == 0 {
            None
        } else {
            Some(ParseResult {
                num_consumed: consumed,
                tokens: Vec::new(),
                next_state: state,
            })
        }
    })
}

/// Consumes until EOF or through the first rune satisfying the predicate.
pub fn consume_to_eof_or_rune_like(pred: impl Fn(char) -> bool + 'static) -> ParseFunc {
    ParseFunc::new(move |mut reader, state| {
        let mut consumed = 0;
        loop {
            match reader.next_rune() {
                None => break,
                Some(r) => {
                    consumed += 1;
                    if pred(r) {
                        break;
                    }
                }
            }
        }
        Some(ParseResult {
            num_consumed: consumed,
            tokens: Vec::new(),
            next_state: state,
        })
    })
}

/// Consumes the longest option that prefixes the input.
pub fn consume_longest_matching_option(options: Vec<&'static str>) -> ParseFunc {
    ParseFunc::new(move |reader, state| {
        let mut best: Option<usize> = None;
        for option in &options {
            let mut probe = reader.clone();
            let mut length = 0;
            let mut matched = true;
            for expected in option.chars() {
                match probe.next_rune() {
                    Some(r) if r == expected => length += 1,
                    _ => {
                        matched = false;
                        break;
                    }
                }
            }
            if matched && best.map_or(true, |b| length > b) {
                best = Some(length);
            }
        }
        best.map(|num_consumed| ParseResult {
            num_consumed,
            tokens: Vec::new(),
            next_state: state,
        })
    })
}

// --- State combinators ---

/// Run `p` only when the parser state equals `state`.
pub fn match_state(state: ParserState, p: ParseFunc) -> ParseFunc {
    ParseFunc::new(move |reader, current| {
        if current == state {
            p.run(reader, current)
        } else {
            None
        }
    })
}

/// Map transform that sets the parser state on success.
pub fn set_state(state: ParserState) -> impl Fn(ParseResult) -> ParseResult {
    move |mut result| {
        result.next_state = state;
        result
    }
}

/// Map transform that turns the consumed span into a single token.
pub fn recognize_token(role: TokenRole) -> impl Fn(ParseResult) -> ParseResult {
    move |mut result| {
        result.tokens = vec![ComputedToken {
            offset: 0,
            length: result.num_consumed,
            role,
        }];
        result
    }
}

/// A complete language tokenizer: a parse function plus its initial state.
#[derive(Clone)]
pub struct LanguageTokenizer {
    pub initial_state: ParserState,
    pub parse: ParseFunc,
}

/// Declare the initial state for a tokenizer.
pub fn initial_state(state: ParserState, parse: ParseFunc) -> LanguageTokenizer {
    LanguageTokenizer {
        initial_state: state,
        parse,
    }
}
