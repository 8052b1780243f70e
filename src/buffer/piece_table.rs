//! Piece table backed by an AVL piece tree.
//!
//! Text is stored in two append-only byte buffers (the original text and an
//! add buffer); the document is a sequence of pieces into those buffers kept
//! in a height-balanced tree. Subtree aggregates track character and newline
//! counts so that all public operations are keyed by character position.

use std::cmp::max;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferSource {
    Original,
    Add,
}

#[derive(Debug, Clone)]
struct Piece {
    source: BufferSource,
    start: usize,
    len: usize,
    chars: usize,
    newlines: usize,
}

#[derive(Debug, Clone)]
struct Node {
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
    piece: Piece,

    // Subtree aggregates
    chars: usize,
    newlines: usize,
    height: usize,
}

/// A piece table keyed by character position.
pub struct PieceTable {
    original: Vec<u8>,
    add: Vec<u8>,
    root: Option<Box<Node>>,
}

impl PieceTable {
    pub fn new(original: Vec<u8>) -> Self {
        let root = if original.is_empty() {
            None
        } else {
            let piece = make_piece(BufferSource::Original, 0, &original);
            Some(Box::new(leaf(piece)))
        };

        Self {
            original,
            add: Vec::new(),
            root,
        }
    }

    /// Total number of character positions.
    pub fn num_chars(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.chars)
    }

    pub fn num_newlines(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.newlines)
    }

    pub fn is_empty(&self) -> bool {
        self.num_chars() == 0
    }

    /// Insert text at a character position.
    pub fn insert(&mut self, char_pos: usize, text: &str) {
        if text.is_empty() {
            return;
        }

        let add_start = self.add.len();
        self.add.extend_from_slice(text.as_bytes());
        let piece = make_piece(BufferSource::Add, add_start, text.as_bytes());
        let node = Box::new(leaf(piece));

        let (left, right) = split(self.root.take(), char_pos, &self.original, &self.add);
        self.root = Some(join_with_root(left, node, right));
    }

    /// Delete a character range.
    pub fn delete(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }

        let (left, rest) = split(self.root.take(), range.start, &self.original, &self.add);
        let (_, right) = split(rest, range.end - range.start, &self.original, &self.add);
        self.root = merge(left, right);
    }

    /// Number of newlines strictly before the given character position.
    pub fn line_of_char(&self, char_pos: usize) -> usize {
        line_at(
            self.root.as_deref(),
            char_pos.min(self.num_chars()),
            &self.original,
            &self.add,
        )
    }

    /// Character position of the start of a line (position after the
    /// line-th newline). Positions past the last line clamp to the end.
    pub fn line_start_char(&self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        if line > self.num_newlines() {
            return self.num_chars();
        }
        chars_through_nth_newline(self.root.as_deref(), line, &self.original, &self.add)
    }

    /// Collect the byte chunks covering a character range, in document order.
    /// Boundary pieces are cut at the exact character offsets.
    pub fn chunks_in_char_range(&self, range: Range<usize>) -> Vec<&[u8]> {
        let mut out = Vec::new();
        if range.start < range.end {
            collect_chunks(
                self.root.as_deref(),
                range,
                &self.original,
                &self.add,
                &mut out,
            );
        }
        out
    }
}

impl fmt::Display for PieceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks_in_char_range(0..self.num_chars()) {
            write!(f, "{}", String::from_utf8_lossy(chunk))?;
        }
        Ok(())
    }
}

// --- Byte/char accounting ---

fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Character positions correspond to non-continuation bytes.
fn count_chars(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| !is_continuation(b)).count()
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

/// Byte offset of the char_off-th character position in the slice.
fn char_to_byte(bytes: &[u8], char_off: usize) -> usize {
    if char_off == 0 {
        return 0;
    }
    let mut seen = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if !is_continuation(b) {
            if seen == char_off {
                return i;
            }
            seen += 1;
        }
    }
    bytes.len()
}

fn make_piece(source: BufferSource, start: usize, bytes: &[u8]) -> Piece {
    Piece {
        source,
        start,
        len: bytes.len(),
        chars: count_chars(bytes),
        newlines: count_newlines(bytes),
    }
}

fn piece_slice<'a>(piece: &Piece, original: &'a [u8], add: &'a [u8]) -> &'a [u8] {
    match piece.source {
        BufferSource::Original => &original[piece.start..piece.start + piece.len],
        BufferSource::Add => &add[piece.start..piece.start + piece.len],
    }
}

// --- Tree operations ---

fn leaf(piece: Piece) -> Node {
    let chars = piece.chars;
    let newlines = piece.newlines;
    Node {
        left: None,
        right: None,
        piece,
        chars,
        newlines,
        height: 1,
    }
}

fn chars(node: &Option<Box<Node>>) -> usize {
    node.as_ref().map_or(0, |n| n.chars)
}

fn newlines(node: &Option<Box<Node>>) -> usize {
    node.as_ref().map_or(0, |n| n.newlines)
}

fn height(node: &Option<Box<Node>>) -> usize {
    node.as_ref().map_or(0, |n| n.height)
}

fn update(node: &mut Box<Node>) {
    node.chars = chars(&node.left) + node.piece.chars + chars(&node.right);
    node.newlines = newlines(&node.left) + node.piece.newlines + newlines(&node.right);
    node.height = 1 + max(height(&node.left), height(&node.right));
}

fn balance(mut node: Box<Node>) -> Box<Node> {
    update(&mut node);
    let factor = height(&node.left) as isize - height(&node.right) as isize;

    if factor > 1 {
        let left = node.left.as_ref().unwrap();
        if height(&left.left) >= height(&left.right) {
            rotate_right(node)
        } else {
            rotate_left_right(node)
        }
    } else if factor < -1 {
        let right = node.right.as_ref().unwrap();
        if height(&right.right) >= height(&right.left) {
            rotate_left(node)
        } else {
            rotate_right_left(node)
        }
    } else {
        node
    }
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let mut new_root = node.left.take().unwrap();
    node.left = new_root.right.take();
    update(&mut node);
    new_root.right = Some(node);
    update(&mut new_root);
    new_root
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let mut new_root = node.right.take().unwrap();
    node.right = new_root.left.take();
    update(&mut node);
    new_root.left = Some(node);
    update(&mut new_root);
    new_root
}

fn rotate_left_right(mut node: Box<Node>) -> Box<Node> {
    let left = node.left.take().unwrap();
    node.left = Some(rotate_left(left));
    rotate_right(node)
}

fn rotate_right_left(mut node: Box<Node>) -> Box<Node> {
    let right = node.right.take().unwrap();
    node.right = Some(rotate_right(right));
    rotate_left(node)
}

// --- Split and merge ---

fn split(
    root: Option<Box<Node>>,
    char_pos: usize,
    original: &[u8],
    add: &[u8],
) -> (Option<Box<Node>>, Option<Box<Node>>) {
    match root {
        None => (None, None),
        Some(mut node) => {
            let left_chars = chars(&node.left);

            if char_pos < left_chars {
                let (l, r) = split(node.left.take(), char_pos, original, add);
                node.left = r;
                update(&mut node);
                (l, Some(node))
            } else if char_pos > left_chars + node.piece.chars {
                let (l, r) = split(
                    node.right.take(),
                    char_pos - left_chars - node.piece.chars,
                    original,
                    add,
                );
                node.right = l;
                update(&mut node);
                (Some(node), r)
            } else {
                let offset = char_pos - left_chars;
                let left_child = node.left.take();
                let right_child = node.right.take();

                if offset == 0 {
                    node.left = None;
                    node.right = right_child;
                    update(&mut node);
                    (left_child, Some(node))
                } else if offset == node.piece.chars {
                    node.left = left_child;
                    node.right = None;
                    update(&mut node);
                    (Some(node), right_child)
                } else {
                    let slice = piece_slice(&node.piece, original, add);
                    let byte_off = char_to_byte(slice, offset);

                    let p1 = make_piece(node.piece.source, node.piece.start, &slice[..byte_off]);
                    let p2 = make_piece(
                        node.piece.source,
                        node.piece.start + byte_off,
                        &slice[byte_off..],
                    );

                    let mut n1 = Box::new(leaf(p1));
                    n1.left = left_child;
                    update(&mut n1);

                    let mut n2 = Box::new(leaf(p2));
                    n2.right = right_child;
                    update(&mut n2);

                    (Some(n1), Some(n2))
                }
            }
        }
    }
}

fn merge(left: Option<Box<Node>>, right: Option<Box<Node>>) -> Option<Box<Node>> {
    match (left, right) {
        (None, r) => r,
        (l, None) => l,
        (Some(l), Some(r)) => {
            let (new_left, center) = delete_max(l);
            Some(join_with_root(new_left, center, Some(r)))
        }
    }
}

fn delete_max(mut node: Box<Node>) -> (Option<Box<Node>>, Box<Node>) {
    if let Some(right) = node.right.take() {
        let (new_right, max_node) = delete_max(right);
        node.right = new_right;
        (Some(balance(node)), max_node)
    } else {
        (node.left.take(), node)
    }
}

fn join_with_root(
    left: Option<Box<Node>>,
    mut center: Box<Node>,
    right: Option<Box<Node>>,
) -> Box<Node> {
    let lh = height(&left);
    let rh = height(&right);

    if (lh as isize - rh as isize).abs() <= 1 {
        center.left = left;
        center.right = right;
        update(&mut center);
        center
    } else if lh > rh {
        let mut left_node = left.unwrap();
        let new_right = join_with_root(left_node.right.take(), center, right);
        left_node.right = Some(new_right);
        balance(left_node)
    } else {
        let mut right_node = right.unwrap();
        let new_left = join_with_root(left, center, right_node.left.take());
        right_node.left = Some(new_left);
        balance(right_node)
    }
}

// --- Queries ---

fn line_at(node: Option<&Node>, char_pos: usize, original: &[u8], add: &[u8]) -> usize {
    let node = match node {
        Some(n) => n,
        None => return 0,
    };
    let left_chars = chars(&node.left);

    if char_pos < left_chars {
        line_at(node.left.as_deref(), char_pos, original, add)
    } else if char_pos < left_chars + node.piece.chars {
        let slice = piece_slice(&node.piece, original, add);
        let byte_off = char_to_byte(slice, char_pos - left_chars);
        newlines(&node.left) + count_newlines(&slice[..byte_off])
    } else {
        newlines(&node.left)
            + node.piece.newlines
            + line_at(
                node.right.as_deref(),
                char_pos - left_chars - node.piece.chars,
                original,
                add,
            )
    }
}

/// Character positions before and including the nth newline (1-based).
fn chars_through_nth_newline(node: Option<&Node>, n: usize, original: &[u8], add: &[u8]) -> usize {
    let node = node.expect("newline count exceeds tree aggregate");
    let left_newlines = newlines(&node.left);

    if n <= left_newlines {
        chars_through_nth_newline(node.left.as_deref(), n, original, add)
    } else if n <= left_newlines + node.piece.newlines {
        let needed = n - left_newlines;
        let slice = piece_slice(&node.piece, original, add);
        let mut seen_newlines = 0;
        let mut seen_chars = 0;
        for &b in slice {
            if !is_continuation(b) {
                seen_chars += 1;
            }
            if b == b'\n' {
                seen_newlines += 1;
                if seen_newlines == needed {
                    return chars(&node.left) + seen_chars;
                }
            }
        }
        unreachable!("newline aggregate mismatch");
    } else {
        chars(&node.left)
            + node.piece.chars
            + chars_through_nth_newline(
                node.right.as_deref(),
                n - left_newlines - node.piece.newlines,
                original,
                add,
            )
    }
}

fn collect_chunks<'a>(
    node: Option<&'a Node>,
    range: Range<usize>,
    original: &'a [u8],
    add: &'a [u8],
    out: &mut Vec<&'a [u8]>,
) {
    let node = match node {
        Some(n) => n,
        None => return,
    };
    let left_chars = chars(&node.left);
    let through_piece = left_chars + node.piece.chars;

    if range.start < left_chars {
        let end = range.end.min(left_chars);
        collect_chunks(node.left.as_deref(), range.start..end, original, add, out);
    }

    if range.end > left_chars && range.start < through_piece {
        let start = range.start.max(left_chars) - left_chars;
        let end = range.end.min(through_piece) - left_chars;
        let slice = piece_slice(&node.piece, original, add);
        let byte_start = char_to_byte(slice, start);
        let byte_end = char_to_byte(slice, end);
        if byte_end > byte_start {
            out.push(&slice[byte_start..byte_end]);
        }
    }

    if range.end > through_piece {
        let start = range.start.max(through_piece) - through_piece;
        let end = range.end - through_piece;
        collect_chunks(node.right.as_deref(), start..end, original, add, out);
    }
}
