//! JSON tokenizer, defined as regex rules.

use crate::error::RegexError;
use crate::syntax::parse_func::{initial_state, LanguageTokenizer};
use crate::syntax::rules::{rules_parse_func, TokenizerRule};
use crate::syntax::{ParserState, TokenRole};

const JSON_RULES: &[TokenizerRule] = &[
    TokenizerRule {
        pattern: "true|false|null",
        role: TokenRole::Keyword,
    },
    TokenizerRule {
        pattern: "-?[0123456789]+(\\.[0123456789]+)?((e|E)(\\+|-)?[0123456789]+)?",
        role: TokenRole::Number,
    },
    TokenizerRule {
        pattern: "\"(\\\\.|[^\\\\\"\n])*\"",
        role: TokenRole::String,
    },
];

pub fn json_tokenizer() -> Result<LanguageTokenizer, RegexError> {
    let parse = rules_parse_func(JSON_RULES)?;
    Ok(initial_state(ParserState::Json, parse))
}
