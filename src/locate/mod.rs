//! Cursor locator algebra
//!
//! Each locator is a pure function from `(buffer, cursor)` to a new cursor
//! state. Commands compose locators with edits; none of them mutate the
//! buffer. All locators iterate grapheme clusters, never bytes or runes.

pub mod classify;

use crate::buffer::{Direction, TextBuffer};

pub use classify::{classify_char, classify_segment, CharClass};

/// Cursor position plus the virtual column preserved across vertical moves.
///
/// If `logical_offset > 0` the cursor sits at the end of a line shorter than
/// the column the user last occupied; moving to a longer line restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub position: usize,
    pub logical_offset: usize,
}

impl CursorState {
    pub fn at(position: usize) -> Self {
        CursorState {
            position,
            logical_offset: 0,
        }
    }
}

/// Move up to `count` grapheme clusters within the current line.
///
/// If the cursor does not move, the logical offset is preserved so that a
/// vertical move afterwards still targets the original column.
/// `include_eol` permits stepping onto the newline (or one past the last
/// character of the text), used by deletions that extend through line end.
pub fn char_in_line(
    buffer: &TextBuffer,
    cursor: CursorState,
    direction: Direction,
    count: usize,
    include_eol: bool,
) -> CursorState {
    assert!(count > 0, "count must be greater than zero");

    let new_position = match direction {
        Direction::Backward => position_before(buffer, cursor.position, count, include_eol),
        Direction::Forward => position_after(buffer, cursor.position, count, include_eol),
    };

    let logical_offset = if new_position == cursor.position {
        cursor.logical_offset
    } else {
        0
    };

    CursorState {
        position: new_position,
        logical_offset,
    }
}

fn position_before(buffer: &TextBuffer, pos: usize, count: usize, include_eol: bool) -> usize {
    let mut iter = buffer.segments(pos, Direction::Backward);
    let mut offset = 0;
    for _ in 0..count {
        let seg = match iter.next() {
            Some(seg) => seg,
            None => break,
        };
        if offset + seg.num_chars() > pos {
            return 0;
        }
        if seg.has_newline() {
            if include_eol {
                offset += seg.num_chars();
            }
            break;
        }
        offset += seg.num_chars();
    }
    pos - offset
}

fn position_after(buffer: &TextBuffer, pos: usize, count: usize, include_eol: bool) -> usize {
    let mut iter = buffer.segments(pos, Direction::Forward);
    let mut end_of_line_or_file = false;
    let (mut prev_prev, mut prev) = (0, 0);
    let mut i = 0;
    while i <= count {
        match iter.next() {
            None => {
                end_of_line_or_file = true;
                break;
            }
            Some(seg) => {
                if seg.has_newline() {
                    end_of_line_or_file = true;
                    break;
                }
                prev_prev = prev;
                prev += seg.num_chars();
            }
        }
        i += 1;
    }

    if end_of_line_or_file && include_eol {
        pos + prev
    } else {
        pos + prev_prev
    }
}

/// Move the cursor onto the closest grapheme cluster on a line.
///
/// Past the end of text, moves to the start of the last cluster; on a
/// newline cluster, moves to the last cluster before it. Stays put on an
/// empty line rather than crossing into the previous one.
pub fn onto_line(buffer: &TextBuffer, cursor: CursorState) -> CursorState {
    let num_chars = buffer.num_chars();
    if cursor.position >= num_chars {
        return CursorState::at(prev_grapheme(buffer, num_chars, 1));
    }

    if let Some(after_newline) = newline_at(buffer, cursor.position) {
        return CursorState::at(prev_grapheme(buffer, after_newline, 2));
    }

    CursorState::at(cursor.position)
}

fn newline_at(buffer: &TextBuffer, pos: usize) -> Option<usize> {
    match buffer.segment_at(pos) {
        Some(seg) if seg.has_newline() => Some(pos + seg.num_chars()),
        _ => None,
    }
}

/// Start of the cluster `count` clusters before `pos`, unless the preceding
/// cluster is a newline (an empty line), in which case the cursor must not
/// cross onto the previous line.
fn prev_grapheme(buffer: &TextBuffer, pos: usize, count: usize) -> usize {
    let mut iter = buffer.segments(pos, Direction::Backward);

    let mut offset = 0;
    for _ in 0..count.saturating_sub(1) {
        match iter.next() {
            Some(seg) => offset += seg.num_chars(),
            None => break,
        }
    }

    match iter.next() {
        None => 0,
        Some(seg) => {
            if seg.has_newline() {
                pos - offset
            } else {
                pos - offset - seg.num_chars()
            }
        }
    }
}

/// Move `count` lines up or down, preserving the target column through the
/// logical offset.
///
/// The target column is the current column plus the logical offset. The
/// cursor advances `min(target, line_length)` clusters from the target
/// line's start; any shortfall is stored back into the logical offset.
/// Moving down treats a trailing newline as end of file (POSIX).
pub fn relative_line(
    buffer: &TextBuffer,
    cursor: CursorState,
    direction: Direction,
    count: usize,
) -> CursorState {
    assert!(count > 0, "count must be greater than zero");

    let target_offset = offset_from_line_start(buffer, cursor.position) + cursor.logical_offset;
    let (line_start, newline_count) = match direction {
        Direction::Backward => start_of_line_above(buffer, cursor.position, count),
        Direction::Forward => start_of_line_below(buffer, cursor.position, count),
    };
    if newline_count == 0 {
        return cursor;
    }

    let (position, actual_offset) = advance_to_offset(buffer, line_start, target_offset);
    CursorState {
        position,
        logical_offset: target_offset - actual_offset,
    }
}

fn offset_from_line_start(buffer: &TextBuffer, pos: usize) -> usize {
    let mut offset = 0;
    for seg in buffer.segments(pos, Direction::Backward) {
        if seg.has_newline() {
            break;
        }
        offset += 1;
    }
    offset
}

fn start_of_line_above(buffer: &TextBuffer, pos: usize, count: usize) -> (usize, usize) {
    let mut offset = 0;
    let mut newline_count = 0;
    for seg in buffer.segments(pos, Direction::Backward) {
        if seg.has_newline() {
            newline_count += 1;
            if newline_count > count {
                break;
            }
        }
        offset += seg.num_chars();
    }
    (pos - offset, newline_count)
}

fn start_of_line_below(buffer: &TextBuffer, pos: usize, count: usize) -> (usize, usize) {
    let mut iter = buffer.segments(pos, Direction::Forward);

    // Lookahead one grapheme cluster.
    let mut lookahead = iter.clone();
    lookahead.next();

    let mut offset = 0;
    let mut newline_count = 0;
    while newline_count < count {
        let seg = iter.next();
        let look = lookahead.next();

        match seg {
            None => break,
            Some(seg) => {
                // POSIX allows the last newline to be treated as EOF, so a
                // newline with nothing after it does not open a new line.
                if seg.has_newline() && look.is_none() {
                    break;
                }
                if seg.has_newline() {
                    newline_count += 1;
                }
                offset += seg.num_chars();
            }
        }
    }
    (pos + offset, newline_count)
}

fn advance_to_offset(buffer: &TextBuffer, line_start: usize, target: usize) -> (usize, usize) {
    let mut pos_offset = 0;
    let mut gc_offset = 0;
    let mut iter = buffer.segments(line_start, Direction::Forward);
    while gc_offset < target {
        match iter.next() {
            None => break,
            Some(seg) => {
                if seg.has_newline() {
                    break;
                }
                gc_offset += 1;
                pos_offset += seg.num_chars();
            }
        }
    }
    (line_start + pos_offset, gc_offset)
}

/// Start or end of the current line. With `include_eol`, the end position
/// is the newline itself (or one past the final character).
pub fn line_boundary(
    buffer: &TextBuffer,
    cursor: CursorState,
    direction: Direction,
    include_eol: bool,
) -> CursorState {
    let (mut prev, mut offset) = (0, 0);
    for seg in buffer.segments(cursor.position, direction) {
        if seg.has_newline() {
            break;
        }
        prev = offset;
        offset += seg.num_chars();
    }

    let new_position = match direction {
        Direction::Forward => {
            if include_eol {
                cursor.position + offset
            } else {
                cursor.position + prev
            }
        }
        Direction::Backward => cursor.position - offset,
    };

    if new_position == cursor.position {
        cursor
    } else {
        CursorState::at(new_position)
    }
}

/// Skip whitespace clusters within the current line; if no non-whitespace
/// cluster is found before the line boundary, the cursor stays put.
pub fn non_whitespace(
    buffer: &TextBuffer,
    cursor: CursorState,
    direction: Direction,
) -> CursorState {
    let mut offset = 0;
    for seg in buffer.segments(cursor.position, direction) {
        if seg.has_newline() {
            return cursor;
        }
        if !seg.is_whitespace() {
            let position = match direction {
                Direction::Forward => cursor.position + offset,
                Direction::Backward => cursor.position - offset - seg.num_chars(),
            };
            return CursorState::at(position);
        }
        offset += seg.num_chars();
    }
    cursor
}

/// Start of the `count`-th next word. A word is a run of word characters or
/// a run of symbols; whitespace between words is skipped.
pub fn next_word_start(buffer: &TextBuffer, cursor: CursorState, count: usize) -> CursorState {
    let mut pos = cursor.position;
    for _ in 0..count {
        pos = next_word_once(buffer, pos);
    }
    CursorState::at(pos)
}

fn next_word_once(buffer: &TextBuffer, pos: usize) -> usize {
    let mut iter = buffer.segments(pos, Direction::Forward);
    let first = match iter.next() {
        Some(seg) => seg,
        None => return pos,
    };
    let start_class = classify_segment(&first);
    let mut offset = first.num_chars();

    // Consume the remainder of the current run.
    let mut boundary = None;
    for seg in &mut iter {
        if classify_segment(&seg) == start_class {
            offset += seg.num_chars();
        } else {
            boundary = Some(seg);
            break;
        }
    }

    // Consume whitespace between runs.
    let mut seg = boundary;
    while let Some(s) = seg {
        if classify_segment(&s) != CharClass::Whitespace {
            break;
        }
        offset += s.num_chars();
        seg = iter.next();
    }

    pos + offset
}

/// Start of the `count`-th previous word.
pub fn prev_word_start(buffer: &TextBuffer, cursor: CursorState, count: usize) -> CursorState {
    let mut pos = cursor.position;
    for _ in 0..count {
        pos = prev_word_once(buffer, pos);
    }
    CursorState::at(pos)
}

fn prev_word_once(buffer: &TextBuffer, pos: usize) -> usize {
    let mut iter = buffer.segments(pos, Direction::Backward);
    let mut offset = 0;

    // Skip whitespace behind the cursor.
    let mut seg = iter.next();
    while let Some(s) = &seg {
        if classify_segment(s) != CharClass::Whitespace {
            break;
        }
        offset += s.num_chars();
        seg = iter.next();
    }

    let first = match seg {
        Some(s) => s,
        None => return pos - offset,
    };
    let target_class = classify_segment(&first);
    offset += first.num_chars();

    // Walk to the start of the run.
    for s in iter {
        if classify_segment(&s) != target_class {
            break;
        }
        offset += s.num_chars();
    }

    pos - offset
}

/// Next occurrence of a rune within the current line, like `f` in vi.
/// The cursor stays put when the rune does not occur before the newline.
pub fn find_rune_in_line(
    buffer: &TextBuffer,
    cursor: CursorState,
    direction: Direction,
    target: char,
) -> CursorState {
    let mut iter = buffer.segments(cursor.position, direction);
    let mut offset = 0;

    if direction == Direction::Forward {
        // Skip the cluster under the cursor.
        match iter.next() {
            Some(seg) if !seg.has_newline() => offset += seg.num_chars(),
            _ => return cursor,
        }
    }

    for seg in iter {
        if seg.has_newline() {
            break;
        }
        let width = seg.num_chars();
        let hit = seg.runes().first() == Some(&target);
        match direction {
            Direction::Forward => {
                if hit {
                    return CursorState::at(cursor.position + offset);
                }
                offset += width;
            }
            Direction::Backward => {
                offset += width;
                if hit {
                    return CursorState::at(cursor.position - offset);
                }
            }
        }
    }
    cursor
}

/// Start of the document.
pub fn document_start() -> CursorState {
    CursorState::at(0)
}

/// Last grapheme cluster of the document.
pub fn document_end(buffer: &TextBuffer) -> CursorState {
    onto_line(buffer, CursorState::at(buffer.num_chars()))
}
