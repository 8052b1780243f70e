//! Editor façade
//!
//! Wires the interpreter, editor state, and task mailbox into the
//! single-threaded main loop: poll the mailbox, read an event, interpret,
//! apply. All state mutation happens here, strictly in production order.

use std::io;
use std::time::Duration;

use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::input::Interpreter;
use crate::key::TerminalEvent;
use crate::state::task;
use crate::state::{self, EditorState, StatusStyle};
use crate::term;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct Editor {
    state: EditorState,
    interpreter: Interpreter,
    config: Config,
}

impl Editor {
    /// Build an editor over an empty buffer. Invalid configuration fields
    /// fall back to defaults and surface in the status line.
    pub fn new(width: usize, height: usize, config: Config) -> Self {
        Self::with_text(width, height, config, String::new())
    }

    pub fn with_text(width: usize, height: usize, mut config: Config, text: String) -> Self {
        let rejected = config.normalize();
        let mut state = EditorState::with_text(width, height, &config, text);
        if let Some(error) = rejected.into_iter().next() {
            state::set_status_msg(&mut state, StatusStyle::Error, error.to_string());
        }

        Editor {
            state,
            interpreter: Interpreter::new(),
            config,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn should_quit(&self) -> bool {
        self.state.quit_flag()
    }

    /// Interpret one terminal event and apply the resulting action.
    pub fn handle_event(&mut self, event: TerminalEvent) {
        let mode = self.state.input_mode();
        let action = self.interpreter.process_event(event, mode, &self.config);
        action.apply(&mut self.state);
    }

    /// Apply the outstanding task's completion action, if it finished.
    pub fn poll_tasks(&mut self) {
        if let Some(action) = task::poll_task(&mut self.state) {
            action.apply(&mut self.state);
        }
    }

    /// Echo of the keys buffered in the current mode.
    pub fn input_buffer_string(&self) -> String {
        self.interpreter.input_buffer_string(self.state.input_mode())
    }

    /// Status line content: message on the left, buffered input on the
    /// right, padded to the view width.
    pub fn status_line(&self) -> String {
        let message = &self.state.status().text;
        let buffered = self.input_buffer_string();
        let width = self.state.view().width;

        let used = message.width() + buffered.width();
        let padding = width.saturating_sub(used);
        format!("{}{}{}", message, " ".repeat(padding), buffered)
    }

    /// Run the main loop until quit.
    pub fn run(&mut self) -> io::Result<()> {
        info!("editor loop starting");
        loop {
            self.poll_tasks();
            if let Some(event) = term::read_event(EVENT_POLL_INTERVAL)? {
                self.handle_event(event);
            }
            if self.should_quit() {
                info!("editor loop exiting");
                return Ok(());
            }
        }
    }
}
