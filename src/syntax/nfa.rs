//! Thompson NFA construction and simulation
//!
//! Machines are built compositionally from single-transition fragments and
//! executed by maintaining the set of live states with epsilon closure.
//! `^` and `$` are zero-width assertions expanded during closure when the
//! simulation sits at the start or end of the text.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    Chars(Vec<u8>),
    NegatedChars(Vec<u8>),
    StartOfText,
    EndOfText,
}

#[derive(Debug, Clone, Default)]
struct State {
    epsilon: Vec<usize>,
    edges: Vec<(Transition, usize)>,
    accept: bool,
}

#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<State>,
    start: usize,
}

impl Nfa {
    /// A machine accepting only the empty string.
    pub fn empty_string() -> Nfa {
        Nfa {
            states: vec![State {
                accept: true,
                ..State::default()
            }],
            start: 0,
        }
    }

    pub fn for_chars(chars: &[u8]) -> Nfa {
        Self::single_edge(Transition::Chars(chars.to_vec()))
    }

    pub fn for_negated_chars(chars: &[u8]) -> Nfa {
        Self::single_edge(Transition::NegatedChars(chars.to_vec()))
    }

    pub fn for_start_of_text() -> Nfa {
        Self::single_edge(Transition::StartOfText)
    }

    pub fn for_end_of_text() -> Nfa {
        Self::single_edge(Transition::EndOfText)
    }

    fn single_edge(transition: Transition) -> Nfa {
        Nfa {
            states: vec![
                State {
                    edges: vec![(transition, 1)],
                    ..State::default()
                },
                State {
                    accept: true,
                    ..State::default()
                },
            ],
            start: 0,
        }
    }

    /// Machine accepting a string from `self` followed by one from `other`.
    pub fn concat(mut self, other: Nfa) -> Nfa {
        let offset = self.states.len();
        let other_start = other.start + offset;
        for mut state in other.states {
            shift_state(&mut state, offset);
            self.states.push(state);
        }
        for state in &mut self.states[..offset] {
            if state.accept {
                state.accept = false;
                state.epsilon.push(other_start);
            }
        }
        self
    }

    /// Machine accepting a string from either operand.
    pub fn union(mut self, other: Nfa) -> Nfa {
        let offset = self.states.len();
        let other_start = other.start + offset;
        for mut state in other.states {
            shift_state(&mut state, offset);
            self.states.push(state);
        }
        let new_start = self.states.len();
        self.states.push(State {
            epsilon: vec![self.start, other_start],
            ..State::default()
        });
        self.start = new_start;
        self
    }

    /// Machine accepting zero or more repetitions.
    pub fn star(mut self) -> Nfa {
        let old_start = self.start;
        for state in &mut self.states {
            if state.accept {
                state.epsilon.push(old_start);
            }
        }
        let new_start = self.states.len();
        self.states.push(State {
            epsilon: vec![old_start],
            accept: true,
            ..State::default()
        });
        self.start = new_start;
        self
    }

    /// Whether the machine accepts the whole input.
    pub fn matches(&self, input: &str) -> bool {
        self.matches_bytes(input.as_bytes())
    }

    pub fn matches_bytes(&self, input: &[u8]) -> bool {
        let mut current = self.closure(vec![self.start], true, input.is_empty());
        for (i, &byte) in input.iter().enumerate() {
            let next = self.step(&current, byte);
            current = self.closure(next, false, i + 1 == input.len());
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|&s| self.states[s].accept)
    }

    /// Length in bytes of the longest prefix of `input` the machine
    /// accepts, or `None` if no prefix (including the empty one) matches.
    pub fn longest_match(&self, input: &[u8]) -> Option<usize> {
        let mut best = None;
        let mut current = self.closure(vec![self.start], true, input.is_empty());
        if current.iter().any(|&s| self.states[s].accept) {
            best = Some(0);
        }
        for (i, &byte) in input.iter().enumerate() {
            let next = self.step(&current, byte);
            current = self.closure(next, false, i + 1 == input.len());
            if current.is_empty() {
                break;
            }
            if current.iter().any(|&s| self.states[s].accept) {
                best = Some(i + 1);
            }
        }
        best
    }

    /// States reachable from the set of live states, for incremental
    /// simulations driven by the caller.
    pub(crate) fn start_states(&self, at_start: bool, at_end: bool) -> Vec<usize> {
        self.closure(vec![self.start], at_start, at_end)
    }

    pub(crate) fn step_states(&self, current: &[usize], byte: u8, at_end: bool) -> Vec<usize> {
        let next = self.step(current, byte);
        self.closure(next, false, at_end)
    }

    pub(crate) fn any_accept(&self, states: &[usize]) -> bool {
        states.iter().any(|&s| self.states[s].accept)
    }

    fn step(&self, current: &[usize], byte: u8) -> Vec<usize> {
        let mut next = Vec::new();
        for &s in current {
            for (transition, target) in &self.states[s].edges {
                let matched = match transition {
                    Transition::Chars(chars) => chars.contains(&byte),
                    Transition::NegatedChars(chars) => !chars.contains(&byte),
                    Transition::StartOfText | Transition::EndOfText => false,
                };
                if matched {
                    next.push(*target);
                }
            }
        }
        next
    }

    fn closure(&self, seed: Vec<usize>, at_start: bool, at_end: bool) -> Vec<usize> {
        let mut visited = vec![false; self.states.len()];
        let mut result = Vec::new();
        let mut stack = seed;
        while let Some(s) = stack.pop() {
            if visited[s] {
                continue;
            }
            visited[s] = true;
            result.push(s);
            for &target in &self.states[s].epsilon {
                stack.push(target);
            }
            for (transition, target) in &self.states[s].edges {
                let applies = match transition {
                    Transition::StartOfText => at_start,
                    Transition::EndOfText => at_end,
                    _ => false,
                };
                if applies {
                    stack.push(*target);
                }
            }
        }
        result
    }
}

fn shift_state(state: &mut State, offset: usize) {
    for target in &mut state.epsilon {
        *target += offset;
    }
    for (_, target) in &mut state.edges {
        *target += offset;
    }
}
