//! Streaming rune readers over piece-table chunks.
//!
//! Readers decode UTF-8 in either direction starting from an arbitrary
//! character position. Malformed sequences decode as U+FFFD, one character
//! per non-continuation byte; orphan continuation bytes are skipped, so the
//! characters produced line up exactly with the buffer's position accounting.

use std::rc::Rc;

const REPLACEMENT: char = '\u{FFFD}';

fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Expected sequence length for a UTF-8 lead byte, or 0 if invalid.
fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

fn decode_sequence(bytes: &[u8]) -> Option<char> {
    std::str::from_utf8(bytes).ok().and_then(|s| s.chars().next())
}

/// Forward rune iterator over a chunk list.
#[derive(Clone)]
pub struct ForwardRuneIter<'a> {
    chunks: Rc<Vec<&'a [u8]>>,
    chunk: usize,
    offset: usize,
}

impl<'a> ForwardRuneIter<'a> {
    pub fn new(chunks: Vec<&'a [u8]>) -> Self {
        Self {
            chunks: Rc::new(chunks),
            chunk: 0,
            offset: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        let mut chunk = self.chunk;
        let mut offset = self.offset + ahead;
        while chunk < self.chunks.len() {
            let len = self.chunks[chunk].len();
            if offset < len {
                return Some(self.chunks[chunk][offset]);
            }
            offset -= len;
            chunk += 1;
        }
        None
    }

    fn advance(&mut self, mut n: usize) {
        while n > 0 && self.chunk < self.chunks.len() {
            let remaining = self.chunks[self.chunk].len() - self.offset;
            if n < remaining {
                self.offset += n;
                return;
            }
            n -= remaining;
            self.chunk += 1;
            self.offset = 0;
        }
    }
}

impl Iterator for ForwardRuneIter<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        // Orphan continuation bytes occupy no character position.
        while let Some(b) = self.peek(0) {
            if is_continuation(b) {
                self.advance(1);
            } else {
                break;
            }
        }

        let lead = self.peek(0)?;
        if lead < 0x80 {
            self.advance(1);
            return Some(lead as char);
        }

        let len = utf8_len(lead);
        if len == 0 {
            self.advance(1);
            return Some(REPLACEMENT);
        }

        let mut buf = [0u8; 4];
        buf[0] = lead;
        for i in 1..len {
            match self.peek(i) {
                Some(b) if is_continuation(b) => buf[i] = b,
                _ => {
                    self.advance(1);
                    return Some(REPLACEMENT);
                }
            }
        }

        match decode_sequence(&buf[..len]) {
            Some(c) => {
                self.advance(len);
                Some(c)
            }
            None => {
                self.advance(1);
                Some(REPLACEMENT)
            }
        }
    }
}

/// Backward rune iterator over a chunk list; yields the character before the
/// starting position, then the one before that, and so on.
#[derive(Clone)]
pub struct BackwardRuneIter<'a> {
    chunks: Rc<Vec<&'a [u8]>>,
    // Position one past the next byte to examine, counted from the start.
    chunk: usize,
    offset: usize,
}

impl<'a> BackwardRuneIter<'a> {
    pub fn new(chunks: Vec<&'a [u8]>) -> Self {
        let chunk = chunks.len();
        Self {
            chunks: Rc::new(chunks),
            chunk,
            offset: 0,
        }
    }

    fn step_back(&mut self) -> Option<u8> {
        loop {
            if self.offset > 0 {
                self.offset -= 1;
                return Some(self.chunks[self.chunk][self.offset]);
            }
            if self.chunk == 0 {
                return None;
            }
            self.chunk -= 1;
            self.offset = self.chunks[self.chunk].len();
        }
    }
}

impl Iterator for BackwardRuneIter<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        // Walk back over continuation bytes to the character's lead byte,
        // remembering the three bytes nearest the lead (newest first).
        let mut recent = [0u8; 3];
        let mut cont_total = 0usize;
        let lead = loop {
            let b = self.step_back()?;
            if is_continuation(b) {
                recent.rotate_right(1);
                recent[0] = b;
                cont_total += 1;
            } else {
                break b;
            }
        };

        if lead < 0x80 {
            return Some(lead as char);
        }
        let len = utf8_len(lead);
        if len == 0 || len > cont_total + 1 {
            return Some(REPLACEMENT);
        }
        let mut seq = [0u8; 4];
        seq[0] = lead;
        seq[1..len].copy_from_slice(&recent[..len - 1]);
        Some(decode_sequence(&seq[..len]).unwrap_or(REPLACEMENT))
    }
}
