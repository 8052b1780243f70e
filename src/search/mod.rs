//! Literal substring search over the text buffer

use crate::buffer::{Direction, TextBuffer};

/// Find the character position of the next occurrence of `query` in the
/// given direction. Forward searches scan from `from` (inclusive); backward
/// searches return the last occurrence starting strictly before `from`.
pub fn find(buffer: &TextBuffer, query: &str, from: usize, direction: Direction) -> Option<usize> {
    match direction {
        Direction::Forward => find_forward(buffer, query, from),
        Direction::Backward => find_backward(buffer, query, from),
    }
}

fn find_forward(buffer: &TextBuffer, query: &str, from: usize) -> Option<usize> {
    let target: Vec<char> = query.chars().collect();
    if target.is_empty() || from > buffer.num_chars() {
        return None;
    }

    let mut window: Vec<char> = Vec::with_capacity(target.len());
    for (i, rune) in buffer.runes_forward(from).enumerate() {
        if window.len() == target.len() {
            window.remove(0);
        }
        window.push(rune);
        if window == target {
            return Some(from + i + 1 - target.len());
        }
    }
    None
}

fn find_backward(buffer: &TextBuffer, query: &str, before: usize) -> Option<usize> {
    let target: Vec<char> = query.chars().collect();
    if target.is_empty() {
        return None;
    }

    let mut best = None;
    let mut window: Vec<char> = Vec::with_capacity(target.len());
    for (i, rune) in buffer.runes_forward(0).enumerate() {
        if window.len() == target.len() {
            window.remove(0);
        }
        window.push(rune);
        if window == target {
            let start = i + 1 - target.len();
            if start < before {
                best = Some(start);
            } else {
                break;
            }
        }
    }
    best
}
