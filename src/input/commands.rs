//! Command tables for each input mode
//!
//! Each command pairs a key-sequence expression with an action builder.
//! Builders close over the configuration and the parameters recovered from
//! captures, and compose cursor locators with state mutations.

use super::vm::{self, Capture, CaptureId, Event, Expr};
use super::Action;
use crate::buffer::Direction;
use crate::config::Config;
use crate::key::KeyCode;
use crate::locate;
use crate::state::{self, MenuItem};

// Parameter captures sit far above command-index capture ids.
pub const CAPTURE_COUNT: CaptureId = 1000;
pub const CAPTURE_RUNE: CaptureId = 1001;

/// A named command in a mode's table.
pub struct Command {
    pub name: &'static str,
    pub expr: Expr,
    pub build_action: fn(&Config, CommandParams) -> Action,
}

/// Parameters recovered from the capture spans of an accepted command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandParams {
    pub count: Option<usize>,
    pub rune: Option<char>,
}

impl CommandParams {
    pub fn from_captures(captures: &[Capture], events: &[Event]) -> Self {
        let mut params = CommandParams::default();
        for capture in captures {
            match capture.id {
                CAPTURE_COUNT => {
                    let digits: String = events[capture.start..capture.end]
                        .iter()
                        .filter_map(|&e| vm::rune_for_event(e))
                        .collect();
                    params.count = digits.parse().ok();
                }
                CAPTURE_RUNE => {
                    params.rune = events[capture.start..capture.end]
                        .iter()
                        .find_map(|&e| vm::rune_for_event(e));
                }
                _ => {}
            }
        }
        params
    }

    fn count(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }
}

// --- Expression helpers ---

fn key(code: KeyCode) -> Expr {
    Expr::Event(vm::event_for_key(code))
}

fn rune(c: char) -> Expr {
    Expr::Event(vm::event_for_rune(c))
}

fn rune_range(start: char, end: char) -> Expr {
    Expr::EventRange {
        start: vm::event_for_rune(start),
        end: vm::event_for_rune(end),
    }
}

fn any_rune() -> Expr {
    Expr::EventRange {
        start: 0,
        end: char::MAX as Event,
    }
}

fn seq(children: Vec<Expr>) -> Expr {
    Expr::Seq(children)
}

fn alt(children: Vec<Expr>) -> Expr {
    Expr::Alt(children)
}

fn capture(id: CaptureId, child: Expr) -> Expr {
    Expr::Capture {
        id,
        child: Box::new(child),
    }
}

/// Optional decimal count prefix, captured for the action builder.
fn count_prefix(expr: Expr) -> Expr {
    let digits = seq(vec![
        rune_range('1', '9'),
        Expr::Star(Box::new(rune_range('0', '9'))),
    ]);
    seq(vec![
        Expr::Opt(Box::new(capture(CAPTURE_COUNT, digits))),
        expr,
    ])
}

fn command(
    name: &'static str,
    expr: Expr,
    build_action: fn(&Config, CommandParams) -> Action,
) -> Command {
    Command {
        name,
        expr,
        build_action,
    }
}

// --- Shared motion builders ---

fn cursor_left_action(_config: &Config, params: CommandParams) -> Action {
    let count = params.count();
    Action::new(move |s| {
        state::move_cursor(s, |b, c| {
            locate::char_in_line(b, c, Direction::Backward, count, false)
        });
    })
}

fn cursor_right_action(_config: &Config, params: CommandParams) -> Action {
    let count = params.count();
    Action::new(move |s| {
        state::move_cursor(s, |b, c| {
            locate::char_in_line(b, c, Direction::Forward, count, false)
        });
    })
}

fn cursor_up_action(_config: &Config, params: CommandParams) -> Action {
    let count = params.count();
    Action::new(move |s| {
        state::move_cursor(s, |b, c| {
            locate::relative_line(b, c, Direction::Backward, count)
        });
        state::scroll_view_to_cursor(s);
    })
}

fn cursor_down_action(_config: &Config, params: CommandParams) -> Action {
    let count = params.count();
    Action::new(move |s| {
        state::move_cursor(s, |b, c| {
            locate::relative_line(b, c, Direction::Forward, count)
        });
        state::scroll_view_to_cursor(s);
    })
}

fn line_start_action(_config: &Config, _params: CommandParams) -> Action {
    Action::new(|s| {
        state::move_cursor(s, |b, c| {
            locate::line_boundary(b, c, Direction::Backward, false)
        });
    })
}

fn line_end_action(_config: &Config, _params: CommandParams) -> Action {
    Action::new(|s| {
        state::move_cursor(s, |b, c| locate::line_boundary(b, c, Direction::Forward, false));
    })
}

// --- Normal mode ---

pub fn normal_mode_commands() -> Vec<Command> {
    vec![
        command(
            "cursor left",
            count_prefix(alt(vec![rune('h'), key(KeyCode::ArrowLeft)])),
            cursor_left_action,
        ),
        command(
            "cursor right",
            count_prefix(alt(vec![rune('l'), key(KeyCode::ArrowRight)])),
            cursor_right_action,
        ),
        command(
            "cursor up",
            count_prefix(alt(vec![rune('k'), key(KeyCode::ArrowUp)])),
            cursor_up_action,
        ),
        command(
            "cursor down",
            count_prefix(alt(vec![rune('j'), key(KeyCode::ArrowDown)])),
            cursor_down_action,
        ),
        command(
            "cursor line start",
            alt(vec![rune('0'), key(KeyCode::Home)]),
            line_start_action,
        ),
        command(
            "cursor line end",
            alt(vec![rune('$'), key(KeyCode::End)]),
            line_end_action,
        ),
        command("cursor first non-whitespace", rune('^'), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |b, c| {
                    let start = locate::line_boundary(b, c, Direction::Backward, false);
                    locate::non_whitespace(b, start, Direction::Forward)
                });
            })
        }),
        command("cursor document start", seq(vec![rune('g'), rune('g')]), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |_b, _c| locate::document_start());
                state::scroll_view_to_cursor(s);
            })
        }),
        command("cursor document end", rune('G'), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |b, _c| locate::document_end(b));
                state::scroll_view_to_cursor(s);
            })
        }),
        command("next word", count_prefix(rune('w')), |_c, p| {
            let count = p.count();
            Action::new(move |s| {
                state::move_cursor(s, |b, c| locate::next_word_start(b, c, count));
            })
        }),
        command("previous word", count_prefix(rune('b')), |_c, p| {
            let count = p.count();
            Action::new(move |s| {
                state::move_cursor(s, |b, c| locate::prev_word_start(b, c, count));
            })
        }),
        command(
            "find rune forward",
            seq(vec![rune('f'), capture(CAPTURE_RUNE, any_rune())]),
            |_c, p| match p.rune {
                Some(target) => Action::new(move |s| {
                    state::move_cursor(s, |b, c| {
                        locate::find_rune_in_line(b, c, Direction::Forward, target)
                    });
                }),
                None => Action::empty(),
            },
        ),
        command(
            "find rune backward",
            seq(vec![rune('F'), capture(CAPTURE_RUNE, any_rune())]),
            |_c, p| match p.rune {
                Some(target) => Action::new(move |s| {
                    state::move_cursor(s, |b, c| {
                        locate::find_rune_in_line(b, c, Direction::Backward, target)
                    });
                }),
                None => Action::empty(),
            },
        ),
        command("delete next word", count_prefix(seq(vec![rune('d'), rune('w')])), |_c, p| {
            let count = p.count();
            Action::new(move |s| {
                state::delete_to(s, |b, c| locate::next_word_start(b, c, count));
            })
        }),
        command("delete line", count_prefix(seq(vec![rune('d'), rune('d')])), |_c, p| {
            let count = p.count();
            Action::new(move |s| state::delete_lines(s, count))
        }),
        command(
            "delete to line end",
            alt(vec![rune('D'), seq(vec![rune('d'), rune('$')])]),
            |_c, _p| {
                Action::new(|s| {
                    state::delete_to(s, |b, c| locate::line_boundary(b, c, Direction::Forward, true));
                    state::move_cursor(s, locate::onto_line);
                })
            },
        ),
        command("delete character", count_prefix(rune('x')), |_c, p| {
            let count = p.count();
            Action::new(move |s| {
                state::delete_to(s, |b, c| {
                    locate::char_in_line(b, c, Direction::Forward, count, true)
                });
                state::move_cursor(s, locate::onto_line);
            })
        }),
        command(
            "replace character",
            seq(vec![rune('r'), capture(CAPTURE_RUNE, any_rune())]),
            |_c, p| match p.rune {
                Some(replacement) => Action::new(move |s| state::replace_char(s, replacement)),
                None => Action::empty(),
            },
        ),
        command("enter insert mode", rune('i'), |_c, _p| {
            Action::new(|s| state::set_input_mode(s, state::InputMode::Insert))
        }),
        command("insert at line start", rune('I'), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |b, c| {
                    let start = locate::line_boundary(b, c, Direction::Backward, false);
                    locate::non_whitespace(b, start, Direction::Forward)
                });
                state::set_input_mode(s, state::InputMode::Insert);
            })
        }),
        command("append after cursor", rune('a'), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |b, c| {
                    locate::char_in_line(b, c, Direction::Forward, 1, true)
                });
                state::set_input_mode(s, state::InputMode::Insert);
            })
        }),
        command("append at line end", rune('A'), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |b, c| locate::line_boundary(b, c, Direction::Forward, true));
                state::set_input_mode(s, state::InputMode::Insert);
            })
        }),
        command("open line below", rune('o'), |_c, _p| {
            Action::new(state::open_line_below)
        }),
        command("open line above", rune('O'), |_c, _p| {
            Action::new(state::open_line_above)
        }),
        command("enter visual mode", rune('v'), |_c, _p| {
            Action::new(state::start_visual_selection)
        }),
        command("show menu", rune(':'), |config, _p| {
            let items = menu_items(config);
            Action::new(move |s| state::show_menu(s, items))
        }),
        command("search forward", rune('/'), |_c, _p| {
            Action::new(|s| state::start_search(s, Direction::Forward))
        }),
        command("search backward", rune('?'), |_c, _p| {
            Action::new(|s| state::start_search(s, Direction::Backward))
        }),
        command("scroll down half page", key(KeyCode::CtrlD), |_c, _p| {
            Action::new(|s| {
                let lines = (s.view().height / 2).max(1);
                state::move_cursor(s, |b, c| {
                    locate::relative_line(b, c, Direction::Forward, lines)
                });
                state::scroll_view_to_cursor(s);
            })
        }),
        command("scroll up half page", key(KeyCode::CtrlU), |_c, _p| {
            Action::new(|s| {
                let lines = (s.view().height / 2).max(1);
                state::move_cursor(s, |b, c| {
                    locate::relative_line(b, c, Direction::Backward, lines)
                });
                state::scroll_view_to_cursor(s);
            })
        }),
        command("page down", key(KeyCode::PageDown), |_c, _p| {
            Action::new(|s| {
                let lines = s.view().height.max(1);
                state::move_cursor(s, |b, c| {
                    locate::relative_line(b, c, Direction::Forward, lines)
                });
                state::scroll_view_to_cursor(s);
            })
        }),
        command("page up", key(KeyCode::PageUp), |_c, _p| {
            Action::new(|s| {
                let lines = s.view().height.max(1);
                state::move_cursor(s, |b, c| {
                    locate::relative_line(b, c, Direction::Backward, lines)
                });
                state::scroll_view_to_cursor(s);
            })
        }),
    ]
}

fn menu_items(config: &Config) -> Vec<MenuItem> {
    let mut items = vec![MenuItem {
        name: String::from("quit"),
    }];
    for menu_command in &config.menu_commands {
        items.push(MenuItem {
            name: menu_command.name.clone(),
        });
    }
    items
}

// --- Insert mode ---

pub fn insert_mode_commands() -> Vec<Command> {
    vec![
        command("insert rune", capture(CAPTURE_RUNE, any_rune()), |_c, p| {
            match p.rune {
                Some(rune) => Action::new(move |s| state::insert_rune_at_cursor(s, rune)),
                None => Action::empty(),
            }
        }),
        command("insert newline", key(KeyCode::Enter), |_c, _p| {
            Action::new(|s| state::insert_rune_at_cursor(s, '\n'))
        }),
        command("insert tab", key(KeyCode::Tab), |_c, _p| {
            Action::new(|s| state::insert_rune_at_cursor(s, '\t'))
        }),
        command("delete backward", key(KeyCode::Backspace), |_c, _p| {
            Action::new(|s| {
                state::delete_to(s, |b, c| {
                    locate::char_in_line(b, c, Direction::Backward, 1, true)
                });
            })
        }),
        command("delete forward", key(KeyCode::Delete), |_c, _p| {
            Action::new(|s| {
                state::delete_to(s, |b, c| {
                    locate::char_in_line(b, c, Direction::Forward, 1, true)
                });
            })
        }),
        command("cursor left", key(KeyCode::ArrowLeft), cursor_left_action),
        command("cursor right", key(KeyCode::ArrowRight), cursor_right_action),
        command("cursor up", key(KeyCode::ArrowUp), cursor_up_action),
        command("cursor down", key(KeyCode::ArrowDown), cursor_down_action),
        command("leave insert mode", key(KeyCode::Escape), |_c, _p| {
            Action::new(|s| {
                state::move_cursor(s, |b, c| {
                    locate::char_in_line(b, c, Direction::Backward, 1, false)
                });
                state::set_input_mode(s, state::InputMode::Normal);
            })
        }),
    ]
}

// --- Visual mode ---

pub fn visual_mode_commands() -> Vec<Command> {
    vec![
        command(
            "cursor left",
            count_prefix(alt(vec![rune('h'), key(KeyCode::ArrowLeft)])),
            cursor_left_action,
        ),
        command(
            "cursor right",
            count_prefix(alt(vec![rune('l'), key(KeyCode::ArrowRight)])),
            cursor_right_action,
        ),
        command(
            "cursor up",
            count_prefix(alt(vec![rune('k'), key(KeyCode::ArrowUp)])),
            cursor_up_action,
        ),
        command(
            "cursor down",
            count_prefix(alt(vec![rune('j'), key(KeyCode::ArrowDown)])),
            cursor_down_action,
        ),
        command("cursor line start", rune('0'), line_start_action),
        command("cursor line end", rune('$'), line_end_action),
        command(
            "delete selection",
            alt(vec![rune('d'), rune('x')]),
            |_c, _p| Action::new(state::delete_selection),
        ),
        command("swap selection anchor", rune('o'), |_c, _p| {
            Action::new(state::swap_selection_anchor)
        }),
        command("leave visual mode", key(KeyCode::Escape), |_c, _p| {
            Action::new(state::clear_selection)
        }),
    ]
}

// --- Menu mode ---

pub fn menu_mode_commands() -> Vec<Command> {
    vec![
        command("append query rune", capture(CAPTURE_RUNE, any_rune()), |_c, p| {
            match p.rune {
                Some(rune) => Action::new(move |s| state::append_menu_rune(s, rune)),
                None => Action::empty(),
            }
        }),
        command("delete query rune", key(KeyCode::Backspace), |_c, _p| {
            Action::new(state::delete_menu_rune)
        }),
        command("selection up", key(KeyCode::ArrowUp), |_c, _p| {
            Action::new(|s| state::move_menu_selection(s, -1))
        }),
        command("selection down", key(KeyCode::ArrowDown), |_c, _p| {
            Action::new(|s| state::move_menu_selection(s, 1))
        }),
        command("execute selected item", key(KeyCode::Enter), |_c, _p| {
            Action::new(state::execute_menu_item)
        }),
        command("hide menu", key(KeyCode::Escape), |_c, _p| {
            Action::new(state::hide_menu)
        }),
    ]
}
