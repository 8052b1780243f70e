//! Regex-rule driven tokenizers
//!
//! Simple languages are defined as a list of `(pattern, role)` rules. The
//! patterns compile to NFAs at construction; at each position the machines
//! run in lockstep over the remaining text and the longest match wins, with
//! earlier rules breaking ties.

use crate::error::RegexError;

use super::nfa::Nfa;
use super::parse_func::{ComputedToken, ParseFunc, ParseResult};
use super::regexp::Regexp;
use super::TokenRole;

/// A tokenizer rule: a regular expression recognizing one kind of token.
#[derive(Debug, Clone, Copy)]
pub struct TokenizerRule {
    pub pattern: &'static str,
    pub role: TokenRole,
}

struct Machine {
    nfa: Nfa,
    role: TokenRole,
}

/// Compile a rule list into a longest-match parse function.
///
/// Returns an error if any pattern is malformed, so a broken language
/// definition fails when it is constructed rather than when it runs.
pub fn rules_parse_func(rules: &[TokenizerRule]) -> Result<ParseFunc, RegexError> {
    let machines: Vec<Machine> = rules
        .iter()
        .map(|rule| {
            Regexp::parse(rule.pattern).map(|regexp| Machine {
                nfa: regexp.compile_nfa(),
                role: rule.role,
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(ParseFunc::new(move |mut reader, state| {
        let at_start = reader.position() == 0;
        let mut probe = reader.clone();
        let at_end = probe.next_rune().is_none();

        let mut live: Vec<Option<Vec<usize>>> = machines
            .iter()
            .map(|m| Some(m.nfa.start_states(at_start, at_end)))
            .collect();

        // Best match so far: (runes consumed, rule index).
        let mut best: Option<(usize, usize)> = None;
        for (i, states) in live.iter().enumerate() {
            let states = states.as_ref().unwrap();
            if machines[i].nfa.any_accept(states) && best.is_none() {
                best = Some((0, i));
            }
        }

        let mut runes_consumed = 0;
        let mut buf = [0u8; 4];
        loop {
            let rune = match reader.next_rune() {
                Some(r) => r,
                None => break,
            };
            runes_consumed += 1;
            let mut lookahead = reader.clone();
            let at_end = lookahead.next_rune().is_none();
            let bytes = rune.encode_utf8(&mut buf).as_bytes();

            let mut any_alive = false;
            for (i, slot) in live.iter_mut().enumerate() {
                let mut states = match slot.take() {
                    Some(s) => s,
                    None => continue,
                };
                for (j, &byte) in bytes.iter().enumerate() {
                    let last_byte = j + 1 == bytes.len();
                    states = machines[i]
                        .nfa
                        .step_states(&states, byte, at_end && last_byte);
                    if states.is_empty() {
                        break;
                    }
                }
                if states.is_empty() {
                    continue;
                }
                any_alive = true;
                // Matches are only meaningful at rune boundaries.
                if machines[i].nfa.any_accept(&states)
                    && best.map_or(true, |(len, _)| runes_consumed > len)
                {
                    best = Some((runes_consumed, i));
                }
                *slot = Some(states);
            }

            if !any_alive {
                break;
            }
        }

        match best {
            Some((len, rule)) if len > 0 => Some(ParseResult {
                num_consumed: len,
                tokens: vec![ComputedToken {
                    offset: 0,
                    length: len,
                    role: machines[rule].role,
                }],
                next_state: state,
            }),
            _ => None,
        }
    }))
}
