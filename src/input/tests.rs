use std::time::{Duration, Instant};

use super::vm::{self, compile, Capture, Expr, Instr, Runtime};
use super::Interpreter;
use crate::config::Config;
use crate::editor::Editor;
use crate::key::{KeyCode, KeyEvent, TerminalEvent};
use crate::state::{self, task, EditorState, InputMode};

fn editor_with(text: &str) -> Editor {
    Editor::with_text(80, 24, Config::default(), String::from(text))
}

fn press(editor: &mut Editor, keys: &str) {
    for c in keys.chars() {
        editor.handle_event(TerminalEvent::Key(KeyEvent::rune(c)));
    }
}

fn press_key(editor: &mut Editor, code: KeyCode) {
    editor.handle_event(TerminalEvent::Key(KeyEvent::key(code)));
}

// --- Compiler ---

#[test]
fn test_compile_sequence() {
    let expr = Expr::Seq(vec![
        Expr::Event(vm::event_for_rune('a')),
        Expr::Event(vm::event_for_rune('b')),
    ]);
    let a = vm::event_for_rune('a');
    let b = vm::event_for_rune('b');
    assert_eq!(
        compile(&expr).instrs(),
        &[
            Instr::Match { start: a, end: a },
            Instr::Match { start: b, end: b },
            Instr::Accept,
        ]
    );
}

#[test]
fn test_compile_alt_left_branch_first() {
    let a = vm::event_for_rune('a');
    let b = vm::event_for_rune('b');
    let expr = Expr::Alt(vec![Expr::Event(a), Expr::Event(b)]);
    assert_eq!(
        compile(&expr).instrs(),
        &[
            Instr::Split(1, 3),
            Instr::Match { start: a, end: a },
            Instr::Jump(4),
            Instr::Match { start: b, end: b },
            Instr::Accept,
        ]
    );
}

#[test]
fn test_compile_star_takes_body_first() {
    let a = vm::event_for_rune('a');
    let expr = Expr::Star(Box::new(Expr::Event(a)));
    assert_eq!(
        compile(&expr).instrs(),
        &[
            Instr::Split(1, 3),
            Instr::Match { start: a, end: a },
            Instr::Jump(0),
            Instr::Accept,
        ]
    );
}

// --- Runtime ---

fn capture_expr(id: u32, child: Expr) -> Expr {
    Expr::Capture {
        id,
        child: Box::new(child),
    }
}

#[test]
fn test_runtime_accepts_exact_sequence() {
    let expr = capture_expr(
        0,
        Expr::Seq(vec![
            Expr::Event(vm::event_for_rune('d')),
            Expr::Event(vm::event_for_rune('w')),
        ]),
    );
    let mut runtime = Runtime::new(compile(&Expr::Alt(vec![expr])));

    let first = runtime.process_event(vm::event_for_rune('d'));
    assert!(!first.accepted);
    assert!(!first.reset);

    let second = runtime.process_event(vm::event_for_rune('w'));
    assert!(second.accepted);
    assert!(second.reset);
    // The capture's event indices exactly cover the match.
    assert_eq!(
        second.captures,
        vec![Capture {
            id: 0,
            start: 0,
            end: 2
        }]
    );
}

#[test]
fn test_runtime_resets_on_dead_input() {
    let expr = capture_expr(
        0,
        Expr::Seq(vec![
            Expr::Event(vm::event_for_rune('d')),
            Expr::Event(vm::event_for_rune('w')),
        ]),
    );
    let mut runtime = Runtime::new(compile(&Expr::Alt(vec![expr])));

    runtime.process_event(vm::event_for_rune('d'));
    let dead = runtime.process_event(vm::event_for_rune('x'));
    assert!(!dead.accepted);
    assert!(dead.reset);

    // After a reset the next event starts a fresh match.
    runtime.process_event(vm::event_for_rune('d'));
    let accepted = runtime.process_event(vm::event_for_rune('w'));
    assert!(accepted.accepted);
}

#[test]
fn test_runtime_lowest_capture_id_wins_ties() {
    let e = vm::event_for_rune('x');
    let program = compile(&Expr::Alt(vec![
        capture_expr(0, Expr::Event(e)),
        capture_expr(1, Expr::Event(e)),
    ]));
    let mut runtime = Runtime::new(program);

    let result = runtime.process_event(e);
    assert!(result.accepted);
    assert_eq!(result.captures.len(), 1);
    assert_eq!(result.captures[0].id, 0);
}

#[test]
fn test_runtime_count_prefix_captures() {
    // Digits then 'j', with the digits captured separately.
    let digit = Expr::EventRange {
        start: vm::event_for_rune('0'),
        end: vm::event_for_rune('9'),
    };
    let expr = capture_expr(
        0,
        Expr::Seq(vec![
            capture_expr(100, Expr::Seq(vec![digit.clone(), Expr::Star(Box::new(digit))])),
            Expr::Event(vm::event_for_rune('j')),
        ]),
    );
    let mut runtime = Runtime::new(compile(&Expr::Alt(vec![expr])));

    runtime.process_event(vm::event_for_rune('2'));
    runtime.process_event(vm::event_for_rune('5'));
    let result = runtime.process_event(vm::event_for_rune('j'));
    assert!(result.accepted);

    let count = result.captures.iter().find(|c| c.id == 100).unwrap();
    assert_eq!((count.start, count.end), (0, 2));
    let command = result.captures.iter().find(|c| c.id == 0).unwrap();
    assert_eq!((command.start, command.end), (0, 3));
}

#[test]
fn test_runtime_accepts_at_earliest_event() {
    // A trailing star never delays acceptance.
    let a = vm::event_for_rune('a');
    let expr = capture_expr(
        0,
        Expr::Seq(vec![Expr::Event(a), Expr::Star(Box::new(Expr::Event(a)))]),
    );
    let mut runtime = Runtime::new(compile(&Expr::Alt(vec![expr])));

    let result = runtime.process_event(a);
    assert!(result.accepted);
}

// --- Interpreter: normal mode ---

#[test]
fn test_delete_word_command() {
    let mut editor = editor_with("hello world");
    press(&mut editor, "dw");
    assert_eq!(editor.state().buffer().to_string(), "world");
    assert_eq!(editor.state().cursor().position, 0);
}

#[test]
fn test_partial_command_leaves_vm_running() {
    let mut editor = editor_with("hello world");
    press(&mut editor, "d");
    // No action yet; the keystroke is buffered and echoed.
    assert_eq!(editor.state().buffer().to_string(), "hello world");
    assert_eq!(editor.input_buffer_string(), "d");
}

#[test]
fn test_unmatched_command_resets_without_action() {
    let mut editor = editor_with("hello world");
    press(&mut editor, "dq");
    assert_eq!(editor.state().buffer().to_string(), "hello world");
    assert_eq!(editor.input_buffer_string(), "");

    // The reset VM accepts fresh input immediately afterwards.
    press(&mut editor, "x");
    assert_eq!(editor.state().buffer().to_string(), "ello world");
}

#[test]
fn test_mismatched_continuation_is_not_replayed() {
    // 'x' alone deletes a character, but arriving while 'd' is buffered it
    // only kills the pending match; the event itself is consumed.
    let mut editor = editor_with("hello world");
    press(&mut editor, "dx");
    assert_eq!(editor.state().buffer().to_string(), "hello world");
    assert_eq!(editor.input_buffer_string(), "");
}

#[test]
fn test_motion_commands() {
    let mut editor = editor_with("abcdef\nxy\npqrstu");
    press(&mut editor, "llj");
    let cursor = editor.state().cursor();
    assert_eq!(editor.state().buffer().line_of_char(cursor.position), 1);

    press(&mut editor, "gg");
    assert_eq!(editor.state().cursor().position, 0);

    press(&mut editor, "G");
    assert_eq!(editor.state().cursor().position, 15);

    press(&mut editor, "0");
    assert_eq!(editor.state().cursor().position, 10);

    press(&mut editor, "$");
    assert_eq!(editor.state().cursor().position, 15);
}

#[test]
fn test_count_prefix_applies_to_motion() {
    let mut editor = editor_with("abcdef");
    press(&mut editor, "3l");
    assert_eq!(editor.state().cursor().position, 3);

    press(&mut editor, "2h");
    assert_eq!(editor.state().cursor().position, 1);
}

#[test]
fn test_count_prefix_applies_to_delete() {
    let mut editor = editor_with("abcdef");
    press(&mut editor, "3x");
    assert_eq!(editor.state().buffer().to_string(), "def");
}

#[test]
fn test_delete_line_command() {
    let mut editor = editor_with("one\ntwo\nthree");
    press(&mut editor, "j");
    press(&mut editor, "dd");
    assert_eq!(editor.state().buffer().to_string(), "one\nthree");
}

#[test]
fn test_delete_to_line_end_command() {
    let mut editor = editor_with("hello world\nnext");
    press(&mut editor, "3l");
    press(&mut editor, "D");
    assert_eq!(editor.state().buffer().to_string(), "hel\nnext");
}

#[test]
fn test_find_rune_command() {
    let mut editor = editor_with("say hello");
    press(&mut editor, "fl");
    assert_eq!(editor.state().cursor().position, 6);
}

#[test]
fn test_replace_rune_command() {
    let mut editor = editor_with("cat");
    press(&mut editor, "rb");
    assert_eq!(editor.state().buffer().to_string(), "bat");
    assert_eq!(editor.state().cursor().position, 0);
}

// --- Interpreter: insert mode ---

#[test]
fn test_insert_mode_typing() {
    let mut editor = editor_with("");
    press(&mut editor, "i");
    assert_eq!(editor.state().input_mode(), InputMode::Insert);

    press(&mut editor, "hi");
    press_key(&mut editor, KeyCode::Enter);
    press(&mut editor, "yo");
    assert_eq!(editor.state().buffer().to_string(), "hi\nyo");

    press_key(&mut editor, KeyCode::Backspace);
    assert_eq!(editor.state().buffer().to_string(), "hi\ny");

    press_key(&mut editor, KeyCode::Escape);
    assert_eq!(editor.state().input_mode(), InputMode::Normal);
}

#[test]
fn test_append_at_line_end() {
    let mut editor = editor_with("ab");
    press(&mut editor, "A");
    assert_eq!(editor.state().input_mode(), InputMode::Insert);
    press(&mut editor, "c");
    assert_eq!(editor.state().buffer().to_string(), "abc");
}

#[test]
fn test_open_line_below() {
    let mut editor = editor_with("ab\ncd");
    press(&mut editor, "o");
    assert_eq!(editor.state().input_mode(), InputMode::Insert);
    press(&mut editor, "x");
    assert_eq!(editor.state().buffer().to_string(), "ab\nx\ncd");
}

// --- Interpreter: visual mode ---

#[test]
fn test_visual_selection_delete() {
    let mut editor = editor_with("abcdef");
    press(&mut editor, "v");
    assert_eq!(editor.state().input_mode(), InputMode::Visual);
    press(&mut editor, "ll");
    press(&mut editor, "d");
    // Deletes the inclusive selection a..=c.
    assert_eq!(editor.state().buffer().to_string(), "def");
    assert_eq!(editor.state().input_mode(), InputMode::Normal);
}

#[test]
fn test_visual_escape_clears_selection() {
    let mut editor = editor_with("abcdef");
    press(&mut editor, "vl");
    press_key(&mut editor, KeyCode::Escape);
    assert_eq!(editor.state().input_mode(), InputMode::Normal);
    assert_eq!(editor.state().selection_anchor(), None);
}

// --- Interpreter: menu and search modes ---

#[test]
fn test_menu_quit_command() {
    let mut editor = editor_with("");
    press(&mut editor, ":");
    assert_eq!(editor.state().input_mode(), InputMode::Menu);

    press(&mut editor, "quit");
    press_key(&mut editor, KeyCode::Enter);
    assert!(editor.should_quit());
}

#[test]
fn test_menu_escape_hides_menu() {
    let mut editor = editor_with("");
    press(&mut editor, ":q");
    press_key(&mut editor, KeyCode::Escape);
    assert_eq!(editor.state().input_mode(), InputMode::Normal);
    assert!(!editor.should_quit());
}

#[test]
fn test_search_commit_moves_cursor() {
    let mut editor = editor_with("alpha beta gamma");
    press(&mut editor, "/");
    assert_eq!(editor.state().input_mode(), InputMode::Search);
    press(&mut editor, "beta");
    press_key(&mut editor, KeyCode::Enter);
    assert_eq!(editor.state().input_mode(), InputMode::Normal);
    assert_eq!(editor.state().cursor().position, 6);
}

#[test]
fn test_search_abort_restores_cursor() {
    let mut editor = editor_with("alpha beta");
    press(&mut editor, "ll");
    press(&mut editor, "/be");
    press_key(&mut editor, KeyCode::Escape);
    assert_eq!(editor.state().input_mode(), InputMode::Normal);
    assert_eq!(editor.state().cursor().position, 2);
}

// --- Resize ---

#[test]
fn test_resize_event_updates_view() {
    let mut editor = editor_with("hello");
    editor.handle_event(TerminalEvent::Resize {
        width: 120,
        height: 40,
    });
    assert_eq!(editor.state().view().width, 120);
    assert_eq!(editor.state().view().height, 40);
}

// --- Task mode ---

fn wait_for<F>(state: &mut EditorState, mut done: F)
where
    F: FnMut(&mut EditorState) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(state) {
        assert!(Instant::now() < deadline, "timed out waiting for task");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_task_mode_escape_cancels() {
    let config = Config::default();
    let mut state = EditorState::new(80, 24, &config);
    let mut interpreter = Interpreter::new();

    task::start_task(&mut state, |signal| {
        while !signal.is_cancelled() {
            std::thread::sleep(Duration::from_millis(1));
        }
        task::TaskOutcome::Cancelled
    });
    assert_eq!(state.input_mode(), InputMode::Task);

    // Any key other than Escape is ignored.
    let action = interpreter.process_event(
        TerminalEvent::Key(KeyEvent::rune('x')),
        InputMode::Task,
        &config,
    );
    assert!(action.is_empty());
    assert_eq!(state.input_mode(), InputMode::Task);

    // Escape produces the cancel action.
    let action = interpreter.process_event(
        TerminalEvent::Key(KeyEvent::key(KeyCode::Escape)),
        InputMode::Task,
        &config,
    );
    assert!(!action.is_empty());
    action.apply(&mut state);

    wait_for(&mut state, |s| {
        let _ = task::poll_task(s);
        s.input_mode() != InputMode::Task
    });
    assert_eq!(state.status().text, "task cancelled");
}

#[test]
fn test_task_completion_action_applies() {
    let config = Config::default();
    let mut state = EditorState::new(80, 24, &config);

    task::start_task(&mut state, |_signal| {
        task::TaskOutcome::Complete(super::Action::new(|s| {
            state::set_status_msg(s, state::StatusStyle::Success, "task output ready");
        }))
    });

    wait_for(&mut state, |s| {
        if let Some(action) = task::poll_task(s) {
            action.apply(s);
        }
        s.input_mode() != InputMode::Task
    });
    assert_eq!(state.status().text, "task output ready");
}
