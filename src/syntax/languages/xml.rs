//! XML tokenizer
//!
//! See https://www.w3.org/TR/2006/REC-xml11-20060816/

use crate::syntax::parse_func::{
    consume_longest_matching_option, consume_runes_like, consume_string, consume_to_eof_or_rune_like,
    consume_to_string, initial_state, match_state, recognize_token, set_state, LanguageTokenizer,
};
use crate::syntax::{ParserState, TokenRole};

pub const TOKEN_ROLE_ATTR_KEY: TokenRole = TokenRole::Custom(1);
pub const TOKEN_ROLE_CHARACTER_ENTITY: TokenRole = TokenRole::Custom(2);
pub const TOKEN_ROLE_CDATA: TokenRole = TokenRole::Custom(3);
pub const TOKEN_ROLE_TAG: TokenRole = TokenRole::Custom(4);
pub const TOKEN_ROLE_PROLOGUE: TokenRole = TokenRole::Custom(5);

/// Context the tokenizer is parsing in: document content or inside a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlParseState {
    Normal,
    InTag,
}

pub fn xml_tokenizer() -> LanguageTokenizer {
    let normal = ParserState::Xml(XmlParseState::Normal);
    let in_tag = ParserState::Xml(XmlParseState::InTag);

    let parse_prologue = match_state(
        normal,
        consume_string("<?")
            .then(consume_to_string("?>"))
            .map(recognize_token(TOKEN_ROLE_PROLOGUE)),
    );

    let parse_cdata = match_state(
        normal,
        consume_string("<![CDATA[")
            .then(consume_to_string("]]>"))
            .map(recognize_token(TOKEN_ROLE_CDATA)),
    );

    let parse_comment = match_state(
        normal,
        consume_string("<!--")
            .then(consume_to_string("-->"))
            .map(recognize_token(TokenRole::Comment)),
    );

    let parse_tag_start = match_state(
        normal,
        consume_longest_matching_option(vec!["<", "</"])
            .then_maybe(consume_runes_like(|r| {
                r != '>' && r != '/' && !r.is_whitespace()
            }))
            .map(recognize_token(TOKEN_ROLE_TAG))
            .map(set_state(in_tag)),
    );

    let parse_character_entity = match_state(
        normal,
        consume_string("&")
            .then(consume_runes_like(|r| {
                r != '<' && r != '>' && r != ';' && !r.is_whitespace()
            }))
            .then(consume_string(";"))
            .map(recognize_token(TOKEN_ROLE_CHARACTER_ENTITY)),
    );

    let parse_attr_key = consume_runes_like(|r| r != '>' && r != '=' && !r.is_whitespace())
        .then(consume_string("="))
        .map(recognize_token(TOKEN_ROLE_ATTR_KEY));

    let consume_attr_val_single_quote = consume_string("'").then(consume_to_eof_or_rune_like(
        |r| r == '\'' || r == '\n' || r == '>',
    ));

    let consume_attr_val_double_quote = consume_string("\"").then(consume_to_eof_or_rune_like(
        |r| r == '"' || r == '\n' || r == '>',
    ));

    let parse_attr_val = consume_attr_val_single_quote
        .or(consume_attr_val_double_quote)
        .map(recognize_token(TokenRole::String));

    let parse_tag_content = match_state(in_tag, parse_attr_val.or(parse_attr_key));

    let parse_tag_end = match_state(
        in_tag,
        consume_longest_matching_option(vec![">", "/>"])
            .map(recognize_token(TOKEN_ROLE_TAG))
            .map(set_state(normal)),
    );

    let parse_tag = parse_tag_start.or(parse_tag_content).or(parse_tag_end);

    initial_state(
        normal,
        parse_comment
            .or(parse_prologue)
            .or(parse_cdata)
            .or(parse_character_entity)
            .or(parse_tag),
    )
}
