//! Persistent token tree
//!
//! An ordered binary tree of non-overlapping tokens keyed by start position.
//! Every mutation returns a new tree that shares structure with the old one;
//! existing references stay valid, which lets a renderer hold a snapshot
//! while re-tokenization builds a replacement.

use std::rc::Rc;

use super::Token;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTree(Option<Rc<Node>>);

#[derive(Debug, PartialEq, Eq)]
struct Node {
    token: Token,
    min_start_pos: usize,
    max_end_pos: usize,
    left: TokenTree,
    right: TokenTree,
}

impl TokenTree {
    pub fn new() -> Self {
        TokenTree(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Insert a token, returning a new tree.
    ///
    /// Panics if the token is empty, has a lookahead before its end, or
    /// overlaps an existing token; all are programming errors.
    pub fn insert(&self, token: Token) -> TokenTree {
        validate_new_token(&token);
        match &self.0 {
            None => TokenTree(Some(Rc::new(Node {
                token,
                min_start_pos: token.start_pos,
                max_end_pos: token.end_pos,
                left: TokenTree(None),
                right: TokenTree(None),
            }))),
            Some(node) => {
                if token.end_pos <= node.token.start_pos {
                    with_left_child(node, node.left.insert(token))
                } else if token.start_pos >= node.token.end_pos {
                    with_right_child(node, node.right.insert(token))
                } else {
                    panic!("token overlaps existing token");
                }
            }
        }
    }

    /// Combine two trees whose spans do not overlap, returning a new tree.
    pub fn join(&self, other: &TokenTree) -> TokenTree {
        match (&self.0, &other.0) {
            (None, None) => TokenTree(None),
            (None, Some(_)) => other.clone(),
            (Some(_), None) => self.clone(),
            (Some(node), Some(other_node)) => {
                if other_node.max_end_pos <= node.min_start_pos {
                    TokenTree(Some(Rc::new(Node {
                        token: node.token,
                        min_start_pos: other_node.min_start_pos,
                        max_end_pos: node.max_end_pos,
                        left: node.left.join(other),
                        right: node.right.clone(),
                    })))
                } else if other_node.min_start_pos >= node.max_end_pos {
                    TokenTree(Some(Rc::new(Node {
                        token: node.token,
                        min_start_pos: node.min_start_pos,
                        max_end_pos: other_node.max_end_pos,
                        left: node.left.clone(),
                        right: node.right.join(other),
                    })))
                } else {
                    panic!("span of other tree overlaps span of this tree");
                }
            }
        }
    }

    /// In-order iterator positioned at the first token ending after `pos`.
    pub fn iter_from(&self, pos: usize) -> TokenIter {
        let mut stack = Vec::new();
        let mut tree = self.0.clone();
        while let Some(node) = tree {
            if pos < node.token.start_pos {
                // Position is before this token, so it must be in the left
                // subtree; this node comes after the left subtree in order.
                tree = node.left.0.clone();
                stack.push(node);
            } else if pos >= node.token.end_pos {
                // Position is after this token, so it must be in the right
                // subtree; this node is already behind us.
                tree = node.right.0.clone();
            } else {
                // Position intersects this token; visit it first.
                stack.push(node);
                break;
            }
        }
        TokenIter { stack }
    }

    /// In-order iterator over all tokens.
    pub fn iter(&self) -> TokenIter {
        self.iter_from(0)
    }
}

fn validate_new_token(token: &Token) {
    if token.start_pos >= token.end_pos {
        panic!("token length must be positive");
    }
    if token.end_pos > token.lookahead_pos {
        panic!("token lookahead must be greater than or equal to token end");
    }
}

fn with_left_child(node: &Rc<Node>, child: TokenTree) -> TokenTree {
    let min_start_pos = match &child.0 {
        Some(c) => node.min_start_pos.min(c.min_start_pos),
        None => node.min_start_pos,
    };
    TokenTree(Some(Rc::new(Node {
        token: node.token,
        min_start_pos,
        max_end_pos: node.max_end_pos,
        left: child,
        right: node.right.clone(),
    })))
}

fn with_right_child(node: &Rc<Node>, child: TokenTree) -> TokenTree {
    let max_end_pos = match &child.0 {
        Some(c) => node.max_end_pos.max(c.max_end_pos),
        None => node.max_end_pos,
    };
    TokenTree(Some(Rc::new(Node {
        token: node.token,
        min_start_pos: node.min_start_pos,
        max_end_pos,
        left: node.left.clone(),
        right: child,
    })))
}

/// In-order token iterator backed by an explicit node stack.
pub struct TokenIter {
    stack: Vec<Rc<Node>>,
}

impl Iterator for TokenIter {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let node = self.stack.pop()?;
        let token = node.token;

        // Push the left spine of the right subtree.
        let mut tree = node.right.0.clone();
        while let Some(n) = tree {
            tree = n.left.0.clone();
            self.stack.push(n);
        }

        Some(token)
    }
}
