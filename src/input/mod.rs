//! Input interpretation
//!
//! The interpreter owns one handler per input mode. Most modes compile
//! their command table into a single VM program; search and task modes have
//! bespoke handlers. Interpreting an event yields an [`Action`], a deferred
//! mutation of editor state (possibly the no-op sentinel).

pub mod commands;
pub mod vm;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::config::Config;
use crate::key::{KeyCode, KeyEvent, TerminalEvent};
use crate::state::{self, EditorState, InputMode};

use self::commands::{Command, CommandParams};
use self::vm::{compile, CaptureId, Event, Expr, Runtime};

/// A deferred mutation of editor state produced by the interpreter.
pub struct Action(Option<Box<dyn FnOnce(&mut EditorState) + Send>>);

impl Action {
    pub fn new(f: impl FnOnce(&mut EditorState) + Send + 'static) -> Self {
        Action(Some(Box::new(f)))
    }

    /// The no-op sentinel.
    pub fn empty() -> Self {
        Action(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn apply(self, state: &mut EditorState) {
        if let Some(f) = self.0 {
            f(state);
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Action"),
            None => write!(f, "EmptyAction"),
        }
    }
}

/// An input mode: one way of interpreting key events.
trait Mode {
    fn process_key_event(&mut self, event: KeyEvent, config: &Config) -> Action;

    /// Human-readable echo of the buffered printable keys.
    fn input_buffer_string(&self) -> String;
}

/// Translates terminal events into actions according to the current mode.
pub struct Interpreter {
    modes: HashMap<InputMode, Box<dyn Mode>>,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut modes: HashMap<InputMode, Box<dyn Mode>> = HashMap::new();
        modes.insert(
            InputMode::Normal,
            Box::new(VmMode::new("normal", commands::normal_mode_commands())),
        );
        modes.insert(
            InputMode::Insert,
            Box::new(VmMode::new("insert", commands::insert_mode_commands())),
        );
        modes.insert(
            InputMode::Visual,
            Box::new(VmMode::new("visual", commands::visual_mode_commands())),
        );
        modes.insert(
            InputMode::Menu,
            Box::new(VmMode::new("menu", commands::menu_mode_commands())),
        );
        modes.insert(InputMode::Search, Box::new(SearchMode));
        modes.insert(InputMode::Task, Box::new(TaskMode));
        Interpreter { modes }
    }

    /// Interpret a terminal event as an action. Returns the no-op sentinel
    /// when the event completes no command.
    pub fn process_event(
        &mut self,
        event: TerminalEvent,
        mode: InputMode,
        config: &Config,
    ) -> Action {
        match event {
            TerminalEvent::Key(key) => {
                debug!(?key, ?mode, "processing key event");
                let handler = self
                    .modes
                    .get_mut(&mode)
                    .expect("every input mode has a handler");
                handler.process_key_event(key, config)
            }
            TerminalEvent::Resize { width, height } => {
                debug!(width, height, "processing resize event");
                Action::new(move |s| {
                    state::resize_view(s, width, height);
                    state::scroll_view_to_cursor(s);
                })
            }
        }
    }

    /// Echo of the keys buffered in a mode, for the status line.
    pub fn input_buffer_string(&self, mode: InputMode) -> String {
        self.modes
            .get(&mode)
            .map(|m| m.input_buffer_string())
            .unwrap_or_default()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// A mode that recognizes its command table with a VM program.
struct VmMode {
    name: &'static str,
    runtime: Runtime,
    commands: Vec<Command>,
    event_buffer: Vec<Event>,
    input_buffer: String,
}

impl VmMode {
    fn new(name: &'static str, commands: Vec<Command>) -> Self {
        // Recognize any command in the table with one program. Each command
        // expression is wrapped in a capture carrying its table index so the
        // accept tells us which command fired.
        let children = commands
            .iter()
            .enumerate()
            .map(|(index, command)| Expr::Capture {
                id: index as CaptureId,
                child: Box::new(command.expr.clone()),
            })
            .collect();
        let runtime = Runtime::new(compile(&Expr::Alt(children)));

        VmMode {
            name,
            runtime,
            commands,
            event_buffer: Vec::new(),
            input_buffer: String::new(),
        }
    }
}

impl Mode for VmMode {
    fn process_key_event(&mut self, event: KeyEvent, config: &Config) -> Action {
        let vm_event = vm::event_for_key_event(event);
        self.event_buffer.push(vm_event);
        if event.code == KeyCode::Rune {
            if let Some(rune) = event.rune {
                self.input_buffer.push(rune);
            }
        }

        let mut action = Action::empty();
        let result = self.runtime.process_event(vm_event);
        if result.accepted {
            // The alternation's left bias makes the lowest command id win.
            let winner = result
                .captures
                .iter()
                .filter(|c| (c.id as usize) < self.commands.len())
                .min_by_key(|c| c.id);
            if let Some(capture) = winner {
                let command = &self.commands[capture.id as usize];
                let params = CommandParams::from_captures(&result.captures, &self.event_buffer);
                debug!(
                    mode = self.name,
                    command = command.name,
                    ?params,
                    "accepted input for command"
                );
                action = (command.build_action)(config, params);
            }
        }

        if result.reset {
            self.event_buffer.clear();
            self.input_buffer.clear();
        }

        action
    }

    fn input_buffer_string(&self) -> String {
        self.input_buffer.clone()
    }
}

/// Bespoke handler for search mode: the query lives in editor state, so
/// every key maps directly to a query mutation or commit/abort.
struct SearchMode;

impl Mode for SearchMode {
    fn process_key_event(&mut self, event: KeyEvent, _config: &Config) -> Action {
        match event.code {
            KeyCode::Escape => Action::new(state::abort_search),
            KeyCode::Enter => Action::new(state::commit_search),
            KeyCode::Backspace => Action::new(state::delete_search_rune),
            KeyCode::Rune => match event.rune {
                Some(rune) => Action::new(move |s| state::append_search_rune(s, rune)),
                None => Action::empty(),
            },
            _ => Action::empty(),
        }
    }

    fn input_buffer_string(&self) -> String {
        String::new()
    }
}

/// Bespoke handler used while a task is running: only Escape does anything,
/// and it requests cooperative cancellation.
struct TaskMode;

impl Mode for TaskMode {
    fn process_key_event(&mut self, event: KeyEvent, _config: &Config) -> Action {
        match event.code {
            KeyCode::Escape => Action::new(state::task::cancel_task_if_running),
            _ => Action::empty(),
        }
    }

    fn input_buffer_string(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
