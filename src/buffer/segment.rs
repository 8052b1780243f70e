//! Grapheme cluster segmentation over the rune readers.
//!
//! Cursor motion operates on grapheme clusters, not runes. Clusters never
//! span a line feed (CR LF is a single cluster and stays within its line
//! chunk), so segmentation decodes one line at a time and hands it to
//! `unicode-segmentation`.

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

use super::reader::{BackwardRuneIter, ForwardRuneIter};

/// A single grapheme cluster read from the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    runes: Vec<char>,
}

impl Segment {
    pub fn from_str(s: &str) -> Self {
        Segment {
            runes: s.chars().collect(),
        }
    }

    /// Number of character positions this cluster occupies.
    pub fn num_chars(&self) -> usize {
        self.runes.len()
    }

    pub fn runes(&self) -> &[char] {
        &self.runes
    }

    /// True for the "\n" and "\r\n" clusters.
    pub fn has_newline(&self) -> bool {
        self.runes.contains(&'\n')
    }

    pub fn is_whitespace(&self) -> bool {
        !self.runes.is_empty() && self.runes.iter().all(|r| r.is_whitespace())
    }
}

/// Cloneable bidirectional grapheme cluster iterator.
#[derive(Clone)]
pub enum SegmentIter<'a> {
    Forward(ForwardSegmentIter<'a>),
    Backward(BackwardSegmentIter<'a>),
}

impl Iterator for SegmentIter<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        match self {
            SegmentIter::Forward(it) => it.next(),
            SegmentIter::Backward(it) => it.next(),
        }
    }
}

#[derive(Clone)]
pub struct ForwardSegmentIter<'a> {
    runes: ForwardRuneIter<'a>,
    queue: VecDeque<Segment>,
}

impl<'a> ForwardSegmentIter<'a> {
    pub fn new(runes: ForwardRuneIter<'a>) -> Self {
        Self {
            runes,
            queue: VecDeque::new(),
        }
    }

    fn fill(&mut self) {
        let mut line = String::new();
        for r in &mut self.runes {
            line.push(r);
            if r == '\n' {
                break;
            }
        }
        for g in line.graphemes(true) {
            self.queue.push_back(Segment::from_str(g));
        }
    }
}

impl Iterator for ForwardSegmentIter<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.queue.is_empty() {
            self.fill();
        }
        self.queue.pop_front()
    }
}

#[derive(Clone)]
pub struct BackwardSegmentIter<'a> {
    runes: BackwardRuneIter<'a>,
    // Rune pulled past a chunk boundary, to be replayed on the next fill.
    held: Option<char>,
    queue: VecDeque<Segment>,
}

impl<'a> BackwardSegmentIter<'a> {
    pub fn new(runes: BackwardRuneIter<'a>) -> Self {
        Self {
            runes,
            held: None,
            queue: VecDeque::new(),
        }
    }

    fn fill(&mut self) {
        // Collect one line chunk, reading backward. Runes arrive in reverse
        // document order.
        let mut collected: Vec<char> = Vec::new();
        loop {
            let r = match self.held.take().or_else(|| self.runes.next()) {
                Some(r) => r,
                None => break,
            };
            if r == '\n' {
                if collected.is_empty() {
                    // The newline is its own chunk; pull once more to see
                    // whether it is the tail of a "\r\n" cluster.
                    collected.push('\n');
                    match self.runes.next() {
                        Some('\r') => collected.push('\r'),
                        Some(other) => self.held = Some(other),
                        None => {}
                    }
                } else {
                    self.held = Some('\n');
                }
                break;
            }
            collected.push(r);
        }

        let line: String = collected.into_iter().rev().collect();
        for g in line.graphemes(true) {
            // Front of the queue yields the last grapheme of the chunk.
            self.queue.push_front(Segment::from_str(g));
        }
    }
}

impl Iterator for BackwardSegmentIter<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.queue.is_empty() {
            self.fill();
        }
        self.queue.pop_front()
    }
}
