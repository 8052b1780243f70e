//! Editor state and the mutations applied by actions
//!
//! [`EditorState`] holds the buffer, cursor, view, mode, status line, menu,
//! search, selection, and token tree. Actions mutate it exclusively through
//! the functions in this module, always on the main loop.

pub mod task;

use tracing::warn;

use crate::buffer::{Direction, TextBuffer};
use crate::config::Config;
use crate::locate::{self, CursorState};
use crate::search;
use crate::syntax::{self, Language, LanguageTokenizer, ParseRun, TokenTree};

/// The editor's input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMode {
    Normal,
    Insert,
    Menu,
    Search,
    Visual,
    Task,
}

/// Severity styling for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMsg {
    pub style: StatusStyle,
    pub text: String,
}

impl Default for StatusMsg {
    fn default() -> Self {
        StatusMsg {
            style: StatusStyle::Info,
            text: String::new(),
        }
    }
}

/// Visible window over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub width: usize,
    pub height: usize,
    /// First visible line.
    pub top_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct MenuState {
    pub query: String,
    pub items: Vec<MenuItem>,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    pub query: String,
    pub direction: Direction,
    prev_cursor: CursorState,
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState {
            query: String::new(),
            direction: Direction::Forward,
            prev_cursor: CursorState::default(),
        }
    }
}

/// Tokenization state for the configured language.
pub struct SyntaxState {
    pub language: Language,
    tokenizer: LanguageTokenizer,
    run: ParseRun,
}

/// All editor state mutated by actions.
pub struct EditorState {
    pub(crate) buffer: TextBuffer,
    pub(crate) cursor: CursorState,
    pub(crate) view: ViewState,
    pub(crate) input_mode: InputMode,
    pub(crate) status: StatusMsg,
    pub(crate) menu: MenuState,
    pub(crate) search: SearchState,
    pub(crate) selection_anchor: Option<usize>,
    pub(crate) syntax: SyntaxState,
    pub(crate) task: Option<task::TaskHandle>,
    pub(crate) quit: bool,
}

impl EditorState {
    pub fn new(width: usize, height: usize, config: &Config) -> Self {
        Self::with_text(width, height, config, String::new())
    }

    pub fn with_text(width: usize, height: usize, config: &Config, text: String) -> Self {
        let buffer = TextBuffer::from_string(text);

        let language = match Language::from_name(&config.syntax_language) {
            Some(language) => language,
            None => {
                warn!(name = %config.syntax_language, "unknown syntax language, using plaintext");
                Language::Plaintext
            }
        };
        let (language, tokenizer) = match language.tokenizer() {
            Ok(tokenizer) => (language, tokenizer),
            Err(err) => {
                warn!(%err, "tokenizer construction failed, using plaintext");
                let fallback = Language::Plaintext;
                (fallback, fallback.tokenizer().expect("plaintext always builds"))
            }
        };
        let run = syntax::tokenize(&tokenizer, &buffer);

        EditorState {
            buffer,
            cursor: CursorState::default(),
            view: ViewState {
                width,
                height,
                top_line: 0,
            },
            input_mode: InputMode::Normal,
            status: StatusMsg::default(),
            menu: MenuState::default(),
            search: SearchState::default(),
            selection_anchor: None,
            syntax: SyntaxState {
                language,
                tokenizer,
                run,
            },
            task: None,
            quit: false,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn status(&self) -> &StatusMsg {
        &self.status
    }

    pub fn menu(&self) -> &MenuState {
        &self.menu
    }

    pub fn search_query(&self) -> &str {
        &self.search.query
    }

    pub fn selection_anchor(&self) -> Option<usize> {
        self.selection_anchor
    }

    /// Snapshot of the current token tree. The returned tree stays valid
    /// across later edits because mutation is persistent.
    pub fn tokens(&self) -> TokenTree {
        self.syntax.run.tree.clone()
    }

    pub fn syntax_language(&self) -> Language {
        self.syntax.language
    }

    pub fn quit_flag(&self) -> bool {
        self.quit
    }
}

// --- Cursor and view ---

/// Apply a locator to the cursor.
pub fn move_cursor<F>(s: &mut EditorState, locate: F)
where
    F: FnOnce(&TextBuffer, CursorState) -> CursorState,
{
    s.cursor = locate(&s.buffer, s.cursor);
}

pub fn set_input_mode(s: &mut EditorState, mode: InputMode) {
    s.input_mode = mode;
}

pub fn resize_view(s: &mut EditorState, width: usize, height: usize) {
    s.view.width = width;
    s.view.height = height;
}

/// Scroll vertically so the cursor's line is visible.
pub fn scroll_view_to_cursor(s: &mut EditorState) {
    let line = s.buffer.line_of_char(s.cursor.position);
    if line < s.view.top_line {
        s.view.top_line = line;
    } else if s.view.height > 0 && line >= s.view.top_line + s.view.height {
        s.view.top_line = line + 1 - s.view.height;
    }
}

pub fn set_status_msg(s: &mut EditorState, style: StatusStyle, text: impl Into<String>) {
    s.status = StatusMsg {
        style,
        text: text.into(),
    };
}

pub fn quit(s: &mut EditorState) {
    s.quit = true;
}

// --- Edits ---

fn apply_edit(s: &mut EditorState, edit_start: usize) {
    s.syntax.run = syntax::retokenize(&s.syntax.tokenizer, &s.syntax.run, &s.buffer, edit_start);
}

/// Insert a rune at the cursor, leaving the cursor after it.
pub fn insert_rune_at_cursor(s: &mut EditorState, rune: char) {
    let pos = s.cursor.position.min(s.buffer.num_chars());
    s.buffer.insert_rune(pos, rune);
    s.cursor = CursorState::at(pos + 1);
    apply_edit(s, pos);
}

/// Delete between the cursor and the located position; the cursor lands at
/// the start of the deleted range.
pub fn delete_to<F>(s: &mut EditorState, locate: F)
where
    F: FnOnce(&TextBuffer, CursorState) -> CursorState,
{
    let target = locate(&s.buffer, s.cursor).position;
    let (start, end) = if target < s.cursor.position {
        (target, s.cursor.position)
    } else {
        (s.cursor.position, target)
    };
    if start == end {
        return;
    }
    s.buffer.delete(start..end);
    s.cursor = CursorState::at(start);
    apply_edit(s, start);
}

/// Delete `count` whole lines including their trailing newlines.
pub fn delete_lines(s: &mut EditorState, count: usize) {
    let mut start = locate::line_boundary(&s.buffer, s.cursor, Direction::Backward, false).position;

    let mut end = start;
    let mut newlines = 0;
    for seg in s.buffer.segments(start, Direction::Forward) {
        end += seg.num_chars();
        if seg.has_newline() {
            newlines += 1;
            if newlines == count {
                break;
            }
        }
    }

    // Deleting through the last line removes the newline before it instead.
    if newlines < count && start > 0 {
        if let Some(seg) = s.buffer.segments(start, Direction::Backward).next() {
            if seg.has_newline() {
                start -= seg.num_chars();
            }
        }
    }

    if start == end {
        return;
    }
    s.buffer.delete(start..end);
    let clamped = start.min(s.buffer.num_chars());
    s.cursor = locate::onto_line(&s.buffer, CursorState::at(clamped));
    apply_edit(s, start);
}

/// Replace the grapheme cluster under the cursor with a rune.
pub fn replace_char(s: &mut EditorState, rune: char) {
    let pos = s.cursor.position;
    let seg = match s.buffer.segment_at(pos) {
        Some(seg) if !seg.has_newline() => seg,
        _ => return,
    };
    let end = pos + seg.num_chars();
    s.buffer.delete(pos..end);
    s.buffer.insert_rune(pos, rune);
    s.cursor = CursorState::at(pos);
    apply_edit(s, pos);
}

/// Open an empty line below the cursor and enter insert mode.
pub fn open_line_below(s: &mut EditorState) {
    let at = locate::line_boundary(&s.buffer, s.cursor, Direction::Forward, true).position;
    s.buffer.insert_rune(at, '\n');
    s.cursor = CursorState::at(at + 1);
    apply_edit(s, at);
    set_input_mode(s, InputMode::Insert);
}

/// Open an empty line above the cursor and enter insert mode.
pub fn open_line_above(s: &mut EditorState) {
    let at = locate::line_boundary(&s.buffer, s.cursor, Direction::Backward, false).position;
    s.buffer.insert_rune(at, '\n');
    s.cursor = CursorState::at(at);
    apply_edit(s, at);
    set_input_mode(s, InputMode::Insert);
}

// --- Visual selection ---

pub fn start_visual_selection(s: &mut EditorState) {
    s.selection_anchor = Some(s.cursor.position);
    set_input_mode(s, InputMode::Visual);
}

pub fn clear_selection(s: &mut EditorState) {
    s.selection_anchor = None;
    set_input_mode(s, InputMode::Normal);
}

pub fn swap_selection_anchor(s: &mut EditorState) {
    if let Some(anchor) = s.selection_anchor {
        s.selection_anchor = Some(s.cursor.position);
        s.cursor = CursorState::at(anchor);
    }
}

/// Delete the character-wise selection, both endpoints inclusive.
pub fn delete_selection(s: &mut EditorState) {
    let anchor = match s.selection_anchor {
        Some(anchor) => anchor,
        None => return,
    };
    let (start, last) = if anchor <= s.cursor.position {
        (anchor, s.cursor.position)
    } else {
        (s.cursor.position, anchor)
    };
    let end = match s.buffer.segment_at(last) {
        Some(seg) => last + seg.num_chars(),
        None => last,
    };
    s.selection_anchor = None;
    set_input_mode(s, InputMode::Normal);
    if start >= end {
        return;
    }
    s.buffer.delete(start..end);
    s.cursor = locate::onto_line(&s.buffer, CursorState::at(start));
    apply_edit(s, start);
}

// --- Menu ---

pub fn show_menu(s: &mut EditorState, items: Vec<MenuItem>) {
    s.menu = MenuState {
        query: String::new(),
        items,
        selected: 0,
    };
    set_input_mode(s, InputMode::Menu);
}

pub fn hide_menu(s: &mut EditorState) {
    s.menu = MenuState::default();
    set_input_mode(s, InputMode::Normal);
}

pub fn append_menu_rune(s: &mut EditorState, rune: char) {
    s.menu.query.push(rune);
    s.menu.selected = 0;
}

pub fn delete_menu_rune(s: &mut EditorState) {
    if s.menu.query.pop().is_none() {
        hide_menu(s);
    } else {
        s.menu.selected = 0;
    }
}

/// Menu items whose names contain the query, case-insensitively.
pub fn filtered_menu_items(s: &EditorState) -> Vec<MenuItem> {
    let query = s.menu.query.to_lowercase();
    s.menu
        .items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

pub fn move_menu_selection(s: &mut EditorState, delta: isize) {
    let len = filtered_menu_items(s).len();
    if len == 0 {
        s.menu.selected = 0;
        return;
    }
    let current = s.menu.selected.min(len - 1) as isize;
    s.menu.selected = (current + delta).rem_euclid(len as isize) as usize;
}

pub fn execute_menu_item(s: &mut EditorState) {
    let items = filtered_menu_items(s);
    if items.is_empty() {
        hide_menu(s);
        set_status_msg(s, StatusStyle::Error, "no matching menu command");
        return;
    }
    let name = items[s.menu.selected.min(items.len() - 1)].name.clone();
    hide_menu(s);
    match name.as_str() {
        "quit" => quit(s),
        other => {
            // Commands beyond the built-ins run through external
            // collaborators (shell, file picker); report what was chosen.
            set_status_msg(
                s,
                StatusStyle::Success,
                format!("executed menu command {other:?}"),
            );
        }
    }
}

// --- Search ---

pub fn start_search(s: &mut EditorState, direction: Direction) {
    s.search = SearchState {
        query: String::new(),
        direction,
        prev_cursor: s.cursor,
    };
    set_input_mode(s, InputMode::Search);
}

pub fn append_search_rune(s: &mut EditorState, rune: char) {
    s.search.query.push(rune);
}

pub fn delete_search_rune(s: &mut EditorState) {
    if s.search.query.pop().is_none() {
        abort_search(s);
    }
}

pub fn abort_search(s: &mut EditorState) {
    s.cursor = s.search.prev_cursor;
    s.search.query.clear();
    set_input_mode(s, InputMode::Normal);
}

pub fn commit_search(s: &mut EditorState) {
    let query = s.search.query.clone();
    let direction = s.search.direction;
    set_input_mode(s, InputMode::Normal);
    if query.is_empty() {
        return;
    }

    let from = match direction {
        Direction::Forward => s.cursor.position + 1,
        Direction::Backward => s.cursor.position,
    };
    let mut wrapped = false;
    let mut found = search::find(&s.buffer, &query, from, direction);
    if found.is_none() {
        wrapped = true;
        let wrap_from = match direction {
            Direction::Forward => 0,
            Direction::Backward => s.buffer.num_chars(),
        };
        found = search::find(&s.buffer, &query, wrap_from, direction);
    }

    match found {
        Some(position) => {
            s.cursor = CursorState::at(position);
            scroll_view_to_cursor(s);
            if wrapped {
                set_status_msg(s, StatusStyle::Info, "search wrapped");
            }
        }
        None => {
            set_status_msg(s, StatusStyle::Error, format!("no match for {query:?}"));
        }
    }
}
