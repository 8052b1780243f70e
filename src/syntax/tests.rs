use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;

use super::languages::xml::{
    xml_tokenizer, XmlParseState, TOKEN_ROLE_ATTR_KEY, TOKEN_ROLE_TAG,
};
use super::parse_func::{
    consume_longest_matching_option, consume_runes_like, consume_string, consume_to_string,
    TrackingReader,
};
use super::regexp::Regexp;
use super::token_tree::TokenTree;
use super::*;
use crate::buffer::TextBuffer;
use crate::error::RegexError;

fn token(start: usize, end: usize, lookahead: usize) -> Token {
    Token {
        start_pos: start,
        end_pos: end,
        lookahead_pos: lookahead,
        role: TokenRole::Keyword,
    }
}

fn spans(tree: &TokenTree) -> Vec<(usize, usize)> {
    tree.iter().map(|t| (t.start_pos, t.end_pos)).collect()
}

// --- Token tree ---

#[test]
fn test_token_tree_insert_and_iterate_from_position() {
    let tree = TokenTree::new()
        .insert(token(0, 3, 3))
        .insert(token(10, 15, 15))
        .insert(token(5, 8, 8));

    let from_six: Vec<Token> = tree.iter_from(6).collect();
    assert_eq!(from_six, vec![token(5, 8, 8), token(10, 15, 15)]);

    let all: Vec<Token> = tree.iter().collect();
    assert_eq!(all, vec![token(0, 3, 3), token(5, 8, 8), token(10, 15, 15)]);
}

#[test]
fn test_token_tree_iter_from_past_all_tokens() {
    let tree = TokenTree::new().insert(token(0, 3, 3));
    assert_eq!(tree.iter_from(3).count(), 0);
    assert_eq!(tree.iter_from(100).count(), 0);
}

#[test]
fn test_token_tree_is_persistent() {
    let old = TokenTree::new().insert(token(0, 3, 3));
    let new = old.insert(token(5, 8, 8));

    assert_eq!(spans(&old), vec![(0, 3)]);
    assert_eq!(spans(&new), vec![(0, 3), (5, 8)]);
}

#[test]
fn test_token_tree_join() {
    let left = TokenTree::new().insert(token(0, 2, 2)).insert(token(3, 5, 5));
    let right = TokenTree::new().insert(token(7, 9, 9)).insert(token(10, 12, 12));

    assert_eq!(
        spans(&left.join(&right)),
        vec![(0, 2), (3, 5), (7, 9), (10, 12)]
    );
    assert_eq!(
        spans(&right.join(&left)),
        vec![(0, 2), (3, 5), (7, 9), (10, 12)]
    );
    assert_eq!(spans(&left.join(&TokenTree::new())), vec![(0, 2), (3, 5)]);
}

#[test]
fn test_token_tree_split_then_rejoin_preserves_traversal() {
    let mut tree = TokenTree::new();
    for i in 0..10 {
        tree = tree.insert(token(i * 4, i * 4 + 2, i * 4 + 2));
    }

    for pos in [0, 5, 17, 23, 40] {
        let before: Vec<Token> = tree.iter().take_while(|t| t.end_pos <= pos).collect();
        let after: Vec<Token> = tree.iter_from(pos).collect();

        let mut left = TokenTree::new();
        for t in &before {
            left = left.insert(*t);
        }
        let mut right = TokenTree::new();
        for t in &after {
            right = right.insert(*t);
        }

        assert_eq!(spans(&left.join(&right)), spans(&tree), "split at {pos}");
    }
}

#[test]
#[should_panic(expected = "token overlaps existing token")]
fn test_token_tree_rejects_overlap() {
    TokenTree::new()
        .insert(token(0, 5, 5))
        .insert(token(3, 8, 8));
}

#[test]
#[should_panic(expected = "token length must be positive")]
fn test_token_tree_rejects_empty_token() {
    TokenTree::new().insert(token(5, 5, 5));
}

#[test]
#[should_panic(expected = "token lookahead must be greater than or equal to token end")]
fn test_token_tree_rejects_short_lookahead() {
    TokenTree::new().insert(token(0, 5, 4));
}

proptest! {
    #[test]
    fn prop_token_tree_traversal_sorted_and_disjoint(
        gaps in prop::collection::vec((1usize..5, 1usize..6), 1..40),
        shuffle in any::<u64>(),
    ) {
        // Build disjoint spans, then insert them in a pseudo-random order.
        let mut tokens = Vec::new();
        let mut pos = 0;
        for (gap, len) in gaps {
            pos += gap;
            tokens.push(token(pos, pos + len, pos + len));
            pos += len;
        }

        let mut order = tokens.clone();
        let mut seed = shuffle;
        for i in (1..order.len()).rev() {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            order.swap(i, (seed % (i as u64 + 1)) as usize);
        }

        let mut tree = TokenTree::new();
        for t in &order {
            tree = tree.insert(*t);
        }

        let traversal: Vec<Token> = tree.iter().collect();
        prop_assert_eq!(&traversal, &tokens);
        for pair in traversal.windows(2) {
            prop_assert!(pair[0].end_pos <= pair[1].start_pos);
        }
    }
}

// --- Combinators ---

fn reader_over(text: &str) -> (TrackingReader, Rc<Cell<usize>>) {
    let runes: Rc<Vec<char>> = Rc::new(text.chars().collect());
    let tracker = Rc::new(Cell::new(0));
    (TrackingReader::new(runes, 0, 0, tracker.clone()), tracker)
}

const STATE: ParserState = ParserState::Plaintext;

#[test]
fn test_consume_string() {
    let parse = consume_string("abc");
    let (reader, _) = reader_over("abcdef");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 3);

    let (reader, _) = reader_over("abx");
    assert!(parse.run(reader, STATE).is_none());
}

#[test]
fn test_consume_to_string_with_repeated_prefix() {
    let parse = consume_to_string("-->");
    let (reader, _) = reader_over("a---->rest");
    // The terminator overlaps its own prefix; the scan must not lose it.
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 6);

    let (reader, _) = reader_over("no terminator");
    assert!(parse.run(reader, STATE).is_none());
}

#[test]
fn test_consume_runes_like_requires_at_least_one() {
    let parse = consume_runes_like(|r| r.is_ascii_digit());
    let (reader, _) = reader_over("123x");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 3);

    let (reader, _) = reader_over("x123");
    assert!(parse.run(reader, STATE).is_none());
}

#[test]
fn test_then_maybe_tolerates_right_failure() {
    let parse = consume_string("<").then_maybe(consume_runes_like(|r| r.is_alphanumeric()));
    let (reader, _) = reader_over("<a>");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 2);

    let (reader, _) = reader_over("<>");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 1);

    let strict = consume_string("<").then(consume_runes_like(|r| r.is_alphanumeric()));
    let (reader, _) = reader_over("<>");
    assert!(strict.run(reader, STATE).is_none());
}

#[test]
fn test_or_prefers_first_match() {
    let parse = consume_string("ab").or(consume_string("abc"));
    let (reader, _) = reader_over("abcd");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 2);
}

#[test]
fn test_consume_longest_matching_option() {
    let parse = consume_longest_matching_option(vec!["<", "</"]);
    let (reader, _) = reader_over("</a");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 2);

    let (reader, _) = reader_over("<a");
    assert_eq!(parse.run(reader, STATE).unwrap().num_consumed, 1);

    let (reader, _) = reader_over("a");
    assert!(parse.run(reader, STATE).is_none());
}

#[test]
fn test_tracker_records_lookahead_past_consumed() {
    let parse = consume_runes_like(|r| r.is_ascii_digit());
    let (reader, tracker) = reader_over("12x");
    let result = parse.run(reader, STATE).unwrap();
    assert_eq!(result.num_consumed, 2);
    // Deciding the run ended required reading the 'x'.
    assert_eq!(tracker.get(), 3);
}

// --- Regular expressions ---

#[test]
fn test_regex_alternation_with_star() {
    let nfa = Regexp::parse("a(b|c)*d").unwrap().compile_nfa();
    assert!(nfa.matches("ad"));
    assert!(nfa.matches("abd"));
    assert!(nfa.matches("acbcd"));
    assert!(!nfa.matches("abc"));
    assert!(!nfa.matches("a"));
    assert!(!nfa.matches(""));
}

#[test]
fn test_regex_quantifiers() {
    let plus = Regexp::parse("ab+").unwrap().compile_nfa();
    assert!(!plus.matches("a"));
    assert!(plus.matches("ab"));
    assert!(plus.matches("abbb"));

    let opt = Regexp::parse("ab?c").unwrap().compile_nfa();
    assert!(opt.matches("ac"));
    assert!(opt.matches("abc"));
    assert!(!opt.matches("abbc"));
}

#[test]
fn test_regex_char_class() {
    let class = Regexp::parse("[abc]+").unwrap().compile_nfa();
    assert!(class.matches("cab"));
    assert!(!class.matches("cad"));

    let negated = Regexp::parse("[^abc]").unwrap().compile_nfa();
    assert!(negated.matches("x"));
    assert!(!negated.matches("a"));

    let escaped = Regexp::parse("[\\]\\\\]").unwrap().compile_nfa();
    assert!(escaped.matches("]"));
    assert!(escaped.matches("\\"));
}

#[test]
fn test_regex_dot_and_anchors() {
    let dot = Regexp::parse("a.c").unwrap().compile_nfa();
    assert!(dot.matches("abc"));
    assert!(dot.matches("azc"));
    assert!(!dot.matches("ac"));

    let anchored = Regexp::parse("^ab$").unwrap().compile_nfa();
    assert!(anchored.matches("ab"));
    assert!(!anchored.matches("xab"));
}

#[test]
fn test_regex_longest_match() {
    let nfa = Regexp::parse("ab*").unwrap().compile_nfa();
    assert_eq!(nfa.longest_match(b"abbbx"), Some(4));
    assert_eq!(nfa.longest_match(b"a"), Some(1));
    assert_eq!(nfa.longest_match(b"x"), None);
}

#[test]
fn test_regex_parse_errors() {
    assert_eq!(Regexp::parse(""), Err(RegexError::UnexpectedEnd));
    assert_eq!(Regexp::parse("*a"), Err(RegexError::MissingOperand("star")));
    assert_eq!(Regexp::parse("|a"), Err(RegexError::MissingOperand("union")));
    assert_eq!(Regexp::parse("a)"), Err(RegexError::UnexpectedCloseParen));
    assert_eq!(Regexp::parse("[ab"), Err(RegexError::ExpectedClosingBracket));
    assert_eq!(Regexp::parse("a\\"), Err(RegexError::InvalidEscape));
    assert_eq!(Regexp::parse("[\\d]"), Err(RegexError::InvalidClassEscape));
}

// --- Tokenizers ---

fn tokenize_text(tokenizer: &LanguageTokenizer, text: &str) -> Vec<Token> {
    let buffer = TextBuffer::from_string(String::from(text));
    tokenize(tokenizer, &buffer).tree.iter().collect()
}

#[test]
fn test_xml_tokenizer_tag_with_attribute() {
    let tokens = tokenize_text(&xml_tokenizer(), "<a x=\"1\">hi</a>");

    let expected: Vec<(usize, usize, TokenRole)> = vec![
        (0, 2, TOKEN_ROLE_TAG),       // <a
        (3, 5, TOKEN_ROLE_ATTR_KEY),  // x=
        (5, 8, TokenRole::String),    // "1"
        (8, 9, TOKEN_ROLE_TAG),       // >
        (11, 14, TOKEN_ROLE_TAG),     // </a
        (14, 15, TOKEN_ROLE_TAG),     // >
    ];
    let actual: Vec<(usize, usize, TokenRole)> = tokens
        .iter()
        .map(|t| (t.start_pos, t.end_pos, t.role))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_xml_tokenizer_state_transitions() {
    let tokenizer = xml_tokenizer();
    let runes: Rc<Vec<char>> = Rc::new("<a x=\"1\">".chars().collect());

    // After the tag start the parser is inside the tag.
    let tracker = Rc::new(Cell::new(0));
    let reader = TrackingReader::new(runes.clone(), 0, 0, tracker);
    let result = tokenizer
        .parse
        .run(reader, tokenizer.initial_state)
        .expect("tag start parses");
    assert_eq!(result.num_consumed, 2);
    assert_eq!(result.next_state, ParserState::Xml(XmlParseState::InTag));

    // After '>' it returns to normal content.
    let tracker = Rc::new(Cell::new(8));
    let reader = TrackingReader::new(runes, 0, 8, tracker);
    let result = tokenizer
        .parse
        .run(reader, ParserState::Xml(XmlParseState::InTag))
        .expect("tag end parses");
    assert_eq!(result.num_consumed, 1);
    assert_eq!(result.next_state, ParserState::Xml(XmlParseState::Normal));
}

#[test]
fn test_xml_tokenizer_comment_and_entity() {
    let tokens = tokenize_text(&xml_tokenizer(), "<!-- c --> &amp;");
    let roles: Vec<TokenRole> = tokens.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![TokenRole::Comment, super::languages::xml::TOKEN_ROLE_CHARACTER_ENTITY]
    );
    assert_eq!(tokens[0].start_pos, 0);
    assert_eq!(tokens[0].end_pos, 10);
    assert_eq!(tokens[1].start_pos, 11);
    assert_eq!(tokens[1].end_pos, 16);
}

#[test]
fn test_json_tokenizer() {
    let tokenizer = Language::Json.tokenizer().unwrap();
    let tokens = tokenize_text(&tokenizer, "{\"a\": -12.5, \"flag\": true}");

    let actual: Vec<(usize, usize, TokenRole)> = tokens
        .iter()
        .map(|t| (t.start_pos, t.end_pos, t.role))
        .collect();
    assert_eq!(
        actual,
        vec![
            (1, 4, TokenRole::String),    // "a"
            (6, 11, TokenRole::Number),   // -12.5
            (13, 19, TokenRole::String),  // "flag"
            (21, 25, TokenRole::Keyword), // true
        ]
    );
}

#[test]
fn test_plaintext_tokenizer_emits_nothing() {
    let tokens = tokenize_text(&Language::Plaintext.tokenizer().unwrap(), "hello\nworld");
    assert!(tokens.is_empty());
}

#[test]
fn test_token_invariants_hold_after_tokenize() {
    let tokenizer = xml_tokenizer();
    let tokens = tokenize_text(&tokenizer, "<a b=\"c\"><!-- x --></a>");
    for t in &tokens {
        assert!(t.start_pos < t.end_pos);
        assert!(t.end_pos <= t.lookahead_pos);
    }
    for pair in tokens.windows(2) {
        assert!(pair[0].end_pos <= pair[1].start_pos);
    }
}

// --- Incremental retokenization ---

#[test]
fn test_retokenize_matches_full_tokenize() {
    let tokenizer = xml_tokenizer();
    let mut buffer = TextBuffer::from_string(String::from("<a x=\"1\">hi</a><b>y</b>"));
    let mut run = tokenize(&tokenizer, &buffer);

    // Insert in the middle of the content.
    buffer.insert(9, "ZZ");
    run = retokenize(&tokenizer, &run, &buffer, 9);
    let incremental: Vec<Token> = run.tree.iter().collect();
    let full: Vec<Token> = tokenize(&tokenizer, &buffer).tree.iter().collect();
    assert_eq!(incremental, full);

    // Delete across a tag boundary.
    buffer.delete(14..18);
    run = retokenize(&tokenizer, &run, &buffer, 14);
    let incremental: Vec<Token> = run.tree.iter().collect();
    let full: Vec<Token> = tokenize(&tokenizer, &buffer).tree.iter().collect();
    assert_eq!(incremental, full);
}

#[test]
fn test_retokenize_preserves_unaffected_prefix() {
    let tokenizer = xml_tokenizer();
    let mut buffer =
        TextBuffer::from_string(String::from("<first>alpha</first> <second>beta</second>"));
    let run = tokenize(&tokenizer, &buffer);
    let before: Vec<Token> = run.tree.iter().collect();

    let edit_start = 30;
    buffer.insert(edit_start, "X");
    let after_run = retokenize(&tokenizer, &run, &buffer, edit_start);
    let after: Vec<Token> = after_run.tree.iter().collect();

    // Every token decided strictly before the edit survives verbatim.
    let preserved: Vec<Token> = before
        .iter()
        .copied()
        .filter(|t| t.end_pos <= edit_start && t.lookahead_pos <= edit_start)
        .collect();
    for t in &preserved {
        assert!(after.contains(t), "token {t:?} should survive the edit");
    }

    // And the result still agrees with a from-scratch pass.
    let full: Vec<Token> = tokenize(&tokenizer, &buffer).tree.iter().collect();
    assert_eq!(after, full);
}

#[test]
fn test_retokenize_append_only_reparses_tail() {
    let tokenizer = Language::Json.tokenizer().unwrap();
    let mut buffer = TextBuffer::from_string(String::from("true "));
    let run = tokenize(&tokenizer, &buffer);

    let end = buffer.num_chars();
    buffer.insert(end, "false");
    let after = retokenize(&tokenizer, &run, &buffer, end);

    let actual: Vec<(usize, usize, TokenRole)> = after
        .tree
        .iter()
        .map(|t| (t.start_pos, t.end_pos, t.role))
        .collect();
    assert_eq!(
        actual,
        vec![(0, 4, TokenRole::Keyword), (5, 10, TokenRole::Keyword)]
    );
}

// --- Language lookup ---

#[test]
fn test_language_from_name() {
    assert_eq!(Language::from_name("plaintext"), Some(Language::Plaintext));
    assert_eq!(Language::from_name("xml"), Some(Language::Xml));
    assert_eq!(Language::from_name("json"), Some(Language::Json));
    assert_eq!(Language::from_name("cobol"), None);
}
