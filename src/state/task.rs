//! Long-running tasks
//!
//! Slow work (file I/O, shell commands) runs on a worker thread while the
//! interpreter sits in Task mode, where only Escape does anything. The
//! worker reports through a single-slot mailbox polled by the main loop and
//! observes cancellation cooperatively through a shared flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::{set_input_mode, set_status_msg, EditorState, InputMode, StatusStyle};
use crate::input::Action;

/// Signal a worker checks at safe points to observe cancellation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// What a worker reports when it stops.
pub enum TaskOutcome {
    /// Finished; the action applies the result to editor state.
    Complete(Action),
    /// Observed the cancel flag and discarded partial results.
    Cancelled,
    Failed(String),
}

/// Handle to the outstanding task. At most one task runs at a time.
pub struct TaskHandle {
    mailbox: Receiver<TaskOutcome>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    prev_mode: InputMode,
}

/// Run `work` on a worker thread and switch to Task mode until it reports.
pub fn start_task<F>(s: &mut EditorState, work: F)
where
    F: FnOnce(&CancelSignal) -> TaskOutcome + Send + 'static,
{
    let (sender, mailbox) = sync_channel(1);
    let cancel = Arc::new(AtomicBool::new(false));
    let signal = CancelSignal {
        cancelled: cancel.clone(),
    };

    let handle = thread::spawn(move || {
        let outcome = work(&signal);
        // The main loop may already have given up on us; nothing to do then.
        let _ = sender.send(outcome);
    });

    s.task = Some(TaskHandle {
        mailbox,
        cancel,
        handle: Some(handle),
        prev_mode: s.input_mode,
    });
    set_input_mode(s, InputMode::Task);
    debug!("task started");
}

/// Request cooperative cancellation of the outstanding task, if any.
pub fn cancel_task_if_running(s: &mut EditorState) {
    if let Some(task) = &s.task {
        task.cancel.store(true, Ordering::Relaxed);
        set_status_msg(s, StatusStyle::Info, "cancelling task");
        debug!("task cancellation requested");
    }
}

/// Poll the mailbox. If the task finished, restores the previous input mode
/// and returns the post-completion action to apply, if there is one.
pub fn poll_task(s: &mut EditorState) -> Option<Action> {
    let outcome = {
        let task = s.task.as_ref()?;
        match task.mailbox.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                TaskOutcome::Failed(String::from("task worker disappeared"))
            }
        }
    };

    let mut task = s.task.take().expect("task checked above");
    if let Some(handle) = task.handle.take() {
        let _ = handle.join();
    }
    set_input_mode(s, task.prev_mode);

    match outcome {
        TaskOutcome::Complete(action) => {
            debug!("task completed");
            Some(action)
        }
        TaskOutcome::Cancelled => {
            set_status_msg(s, StatusStyle::Info, "task cancelled");
            None
        }
        TaskOutcome::Failed(message) => {
            set_status_msg(s, StatusStyle::Error, format!("task failed: {message}"));
            None
        }
    }
}
