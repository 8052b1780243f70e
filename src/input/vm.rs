//! Virtual machine for recognizing key event sequences
//!
//! Per-mode command grammars compile to a small bytecode program executed by
//! a Thompson-style NFA interpreter: a frontier of threads coalesced by
//! program counter, stepped once per key event. Recognition cost is linear
//! in input length times program length.

use crate::key::{KeyCode, KeyEvent};

/// A canonical input event. Runes encode as their scalar value; other keys
/// encode as negative values so the two ranges never collide.
pub type Event = i64;

pub type CaptureId = u32;

pub fn event_for_rune(rune: char) -> Event {
    rune as Event
}

pub fn event_for_key(code: KeyCode) -> Event {
    -(code as Event) - 1
}

pub fn event_for_key_event(event: KeyEvent) -> Event {
    match (event.code, event.rune) {
        (KeyCode::Rune, Some(rune)) => event_for_rune(rune),
        (code, _) => event_for_key(code),
    }
}

/// Decode the rune of an event, if it encodes one.
pub fn rune_for_event(event: Event) -> Option<char> {
    u32::try_from(event).ok().and_then(char::from_u32)
}

/// Expression tree describing a command's key sequence.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Matches exactly one event.
    Event(Event),
    /// Matches one event within an inclusive range.
    EventRange { start: Event, end: Event },
    /// Matches any child; earlier children win ties.
    Alt(Vec<Expr>),
    /// Matches each child in order.
    Seq(Vec<Expr>),
    /// Zero or more repetitions, greedy.
    Star(Box<Expr>),
    /// Zero or one occurrence, greedy.
    Opt(Box<Expr>),
    /// Records the span of events consumed by the child.
    Capture { id: CaptureId, child: Box<Expr> },
}

/// Bytecode instructions. `Split` expresses alternation and repetition by
/// forking threads; its first target is explored first, which realizes both
/// the left bias of `Alt` and the greed of `Star`/`Opt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Match { start: Event, end: Event },
    Jump(usize),
    Split(usize, usize),
    CaptureStart(CaptureId),
    CaptureEnd(CaptureId),
    Accept,
}

#[derive(Debug, Clone)]
pub struct Program {
    instrs: Vec<Instr>,
}

impl Program {
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }
}

/// Compile an expression tree to a program with an implicit trailing
/// `Accept`.
pub fn compile(expr: &Expr) -> Program {
    let mut instrs = Vec::new();
    emit(expr, &mut instrs);
    instrs.push(Instr::Accept);
    Program { instrs }
}

fn emit(expr: &Expr, out: &mut Vec<Instr>) {
    match expr {
        Expr::Event(event) => out.push(Instr::Match {
            start: *event,
            end: *event,
        }),

        Expr::EventRange { start, end } => out.push(Instr::Match {
            start: *start,
            end: *end,
        }),

        Expr::Seq(children) => {
            for child in children {
                emit(child, out);
            }
        }

        Expr::Alt(children) => emit_alt(children, out),

        Expr::Star(child) => {
            let split = out.len();
            out.push(Instr::Split(0, 0));
            emit(child, out);
            out.push(Instr::Jump(split));
            out[split] = Instr::Split(split + 1, out.len());
        }

        Expr::Opt(child) => {
            let split = out.len();
            out.push(Instr::Split(0, 0));
            emit(child, out);
            out[split] = Instr::Split(split + 1, out.len());
        }

        Expr::Capture { id, child } => {
            out.push(Instr::CaptureStart(*id));
            emit(child, out);
            out.push(Instr::CaptureEnd(*id));
        }
    }
}

fn emit_alt(children: &[Expr], out: &mut Vec<Instr>) {
    match children {
        [] => panic!("alternation must have at least one child"),
        [only] => emit(only, out),
        [first, rest @ ..] => {
            let split = out.len();
            out.push(Instr::Split(0, 0));
            emit(first, out);
            let jump = out.len();
            out.push(Instr::Jump(0));
            let rest_start = out.len();
            emit_alt(rest, out);
            out[split] = Instr::Split(split + 1, rest_start);
            out[jump] = Instr::Jump(out.len());
        }
    }
}

/// A recorded capture: the half-open span of event indices consumed by a
/// captured subexpression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub id: CaptureId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
struct Thread {
    pc: usize,
    captures: Vec<Capture>,
    open: Vec<(CaptureId, usize)>,
}

/// Outcome of stepping the machine with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub accepted: bool,
    pub captures: Vec<Capture>,
    /// True when the machine has no live threads left; the caller should
    /// clear its event buffers so the next event starts fresh.
    pub reset: bool,
}

/// Thompson-NFA interpreter over a compiled program.
pub struct Runtime {
    prog: Program,
    threads: Vec<Thread>,
    num_events: usize,
}

impl Runtime {
    pub fn new(prog: Program) -> Self {
        Runtime {
            prog,
            threads: Vec::new(),
            num_events: 0,
        }
    }

    /// Step the machine with one event.
    ///
    /// Accepts at the earliest event at which any thread reaches `Accept`;
    /// the first-inserted thread wins, which prefers earlier `Alt` children
    /// and therefore lower capture ids.
    pub fn process_event(&mut self, event: Event) -> StepResult {
        if self.threads.is_empty() {
            self.num_events = 0;
            let mut seeded = Vec::new();
            let mut seen = vec![false; self.prog.instrs.len()];
            self.add_thread(
                &mut seeded,
                &mut seen,
                Thread {
                    pc: 0,
                    captures: Vec::new(),
                    open: Vec::new(),
                },
                0,
            );
            self.threads = seeded;
        }

        let event_index = self.num_events;
        self.num_events += 1;

        let mut next = Vec::new();
        let mut seen = vec![false; self.prog.instrs.len()];
        for thread in std::mem::take(&mut self.threads) {
            if let Instr::Match { start, end } = self.prog.instrs[thread.pc] {
                if start <= event && event <= end {
                    let advanced = Thread {
                        pc: thread.pc + 1,
                        ..thread
                    };
                    self.add_thread(&mut next, &mut seen, advanced, event_index + 1);
                }
            }
        }

        for thread in &next {
            if matches!(self.prog.instrs[thread.pc], Instr::Accept) {
                let captures = thread.captures.clone();
                self.threads.clear();
                self.num_events = 0;
                return StepResult {
                    accepted: true,
                    captures,
                    reset: true,
                };
            }
        }

        if next.is_empty() {
            self.num_events = 0;
            return StepResult {
                accepted: false,
                captures: Vec::new(),
                reset: true,
            };
        }

        self.threads = next;
        StepResult {
            accepted: false,
            captures: Vec::new(),
            reset: false,
        }
    }

    /// Discard all live threads.
    pub fn reset(&mut self) {
        self.threads.clear();
        self.num_events = 0;
    }

    /// Epsilon-close a thread into the frontier, coalescing by program
    /// counter: the first thread to claim a PC keeps it.
    fn add_thread(
        &self,
        frontier: &mut Vec<Thread>,
        seen: &mut [bool],
        thread: Thread,
        event_index: usize,
    ) {
        if seen[thread.pc] {
            return;
        }
        seen[thread.pc] = true;

        match &self.prog.instrs[thread.pc] {
            Instr::Jump(target) => {
                let jumped = Thread {
                    pc: *target,
                    ..thread
                };
                self.add_thread(frontier, seen, jumped, event_index);
            }

            Instr::Split(first, second) => {
                let fork = Thread {
                    pc: *first,
                    captures: thread.captures.clone(),
                    open: thread.open.clone(),
                };
                self.add_thread(frontier, seen, fork, event_index);
                let rest = Thread {
                    pc: *second,
                    ..thread
                };
                self.add_thread(frontier, seen, rest, event_index);
            }

            Instr::CaptureStart(id) => {
                let mut opened = thread;
                opened.open.push((*id, event_index));
                opened.pc += 1;
                self.add_thread(frontier, seen, opened, event_index);
            }

            Instr::CaptureEnd(id) => {
                let mut closed = thread;
                let open_index = closed
                    .open
                    .iter()
                    .rposition(|(open_id, _)| open_id == id)
                    .expect("capture end without matching start");
                let (_, start) = closed.open.remove(open_index);
                closed.captures.push(Capture {
                    id: *id,
                    start,
                    end: event_index,
                });
                closed.pc += 1;
                self.add_thread(frontier, seen, closed, event_index);
            }

            Instr::Match { .. } | Instr::Accept => frontier.push(thread),
        }
    }
}
