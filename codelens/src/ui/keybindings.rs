//! Keybinding dispatcher for codelens.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop what else to do. The dispatcher branches
//! first on `state.mode` so each mode has an isolated handler. Anything that
//! needs the controller or the database (analyse, retry, history) is returned
//! as an action rather than done here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use tui_textarea::{Input, Key};

use crate::app::{AppState, Mode, PanelFocus};

/// What the event loop should do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing beyond the state change already made.
    Continue,
    Quit,
    /// The editor text changed.
    Edited,
    /// Submit the editor text now.
    Analyze,
    /// Resubmit the last submission.
    Retry,
    /// Load the history list and show the overlay.
    OpenHistory,
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::History => handle_history(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('i') => {
            state.mode = Mode::Insert;
            state.focus = PanelFocus::Code;
            state.ensure_cursor_visible();
            KeyAction::Continue
        }

        // Plain or with Ctrl.
        KeyCode::Char('r') => KeyAction::Analyze,
        KeyCode::Char('R') => {
            if state.retry_offered {
                KeyAction::Retry
            } else {
                state.notify("Retry is not available");
                KeyAction::Continue
            }
        }
        KeyCode::Char('S') => {
            state.next_sample();
            KeyAction::Edited
        }
        KeyCode::Char('h') if !ctrl => KeyAction::OpenHistory,

        // Panel focus
        KeyCode::Char('H') => {
            state.focus = state.focus.prev();
            KeyAction::Continue
        }
        KeyCode::Char('L') => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }
        KeyCode::Tab => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }

        KeyCode::Enter if state.focus == PanelFocus::Issues => {
            if !state.jump_to_selected_issue() {
                state.notify("That issue has no line number");
            }
            KeyAction::Continue
        }

        KeyCode::Char('<') => { state.shrink_code_panel(); KeyAction::Continue }
        KeyCode::Char('>') => { state.grow_code_panel(); KeyAction::Continue }

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }

        KeyCode::Char('q') => {
            if state.in_flight() {
                state.mode = Mode::ConfirmQuit;
                KeyAction::Continue
            } else {
                KeyAction::Quit
            }
        }

        _ => KeyAction::Continue,
    }
}

/// Scroll keys shared by every panel: j / k / g / G and the Ctrl page keys.
///
/// Returns `None` when the key is not a scroll key.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') => state.scroll_top(),
        KeyCode::Char('G') => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::Char('f') if ctrl => state.full_page_down(),
        KeyCode::Char('b') if ctrl => state.full_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Translates a crossterm key into the `TextArea` input type.
///
/// Built field by field: `tui_textarea`'s own `From<KeyEvent>` is tied to the
/// crossterm version it was compiled against.
fn textarea_input(key: KeyEvent) -> Input {
    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Tab => Key::Tab,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Esc => Key::Esc,
        KeyCode::F(n) => Key::F(n),
        _ => Key::Null,
    };
    Input {
        key: code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    }
}

/// Edits the Code panel. `Esc` returns to Normal; `Ctrl-r` analyses without
/// leaving Insert. Everything else goes to the `TextArea`.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            return KeyAction::Continue;
        }
        KeyCode::Char('r') if ctrl => return KeyAction::Analyze,
        _ => {}
    }

    let modified = state.editor.input(textarea_input(key));
    if state.record_edit(modified) {
        KeyAction::Edited
    } else {
        KeyAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// `j`/`k` select, `Enter` restores the entry into the editor, `Esc` closes.
fn handle_history(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.history_state.scroll_down_by(1),
        KeyCode::Char('k') | KeyCode::Up => state.history_state.scroll_up_by(1),
        KeyCode::Enter => {
            if state.restore_selected_history() {
                return KeyAction::Edited;
            }
        }
        KeyCode::Char('h') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// `y` quits (closing the open channel), `n`/`Esc` goes back.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Left click focuses the panel under the pointer; the wheel scrolls by 3.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let pos = Position { x: mouse.column, y: mouse.row };
            let [code, explanation, issues] = state.panel_rects;
            if code.width > 0 && code.contains(pos) {
                state.focus = PanelFocus::Code;
            } else if explanation.width > 0 && explanation.contains(pos) {
                state.focus = PanelFocus::Explanation;
            } else if issues.width > 0 && issues.contains(pos) {
                state.focus = PanelFocus::Issues;
            }
        }
        MouseEventKind::ScrollUp => match state.mode {
            Mode::HelpOverlay => state.help_scroll = state.help_scroll.saturating_sub(3),
            Mode::History => state.history_state.scroll_up_by(3),
            _ => state.scroll_up(3),
        },
        MouseEventKind::ScrollDown => match state.mode {
            Mode::HelpOverlay => state.help_scroll = state.help_scroll.saturating_add(3),
            Mode::History => state.history_state.scroll_down_by(3),
            _ => state.scroll_down(3),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codelens_core::types::{SessionSnapshot, SessionStatus};
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char(c))
        }
    }

    #[test]
    fn insert_mode_types_into_the_editor() {
        let mut state = AppState::default();
        assert_eq!(handle_key(key(KeyCode::Char('i')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Insert);

        assert_eq!(handle_key(key(KeyCode::Char('x')), &mut state), KeyAction::Edited);
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), KeyAction::Edited);
        assert_eq!(handle_key(key(KeyCode::Left), &mut state), KeyAction::Continue);
        assert_eq!(state.code_text(), "x\n");

        // 'q' is text in Insert mode, not quit.
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Edited);

        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn backspace_on_empty_buffer_is_not_an_edit() {
        let mut state = AppState::default();
        state.mode = Mode::Insert;
        assert_eq!(handle_key(key(KeyCode::Backspace), &mut state), KeyAction::Continue);
        assert_eq!(state.revision(), 0);
    }

    #[test]
    fn tab_key_inserts_a_real_tab() {
        let mut state = AppState::default();
        state.mode = Mode::Insert;
        assert_eq!(handle_key(key(KeyCode::Tab), &mut state), KeyAction::Edited);
        handle_key(key(KeyCode::Char('x')), &mut state);
        assert_eq!(state.code_text(), "\tx");
    }

    #[test]
    fn analyse_keys_work_in_both_modes() {
        let mut state = AppState::default();
        assert_eq!(handle_key(key(KeyCode::Char('r')), &mut state), KeyAction::Analyze);
        assert_eq!(handle_key(ctrl('r'), &mut state), KeyAction::Analyze);
        state.mode = Mode::Insert;
        assert_eq!(handle_key(ctrl('r'), &mut state), KeyAction::Analyze);
        assert!(state.code_text().is_empty());
    }

    #[test]
    fn retry_is_only_offered_when_the_controller_allows_it() {
        let mut state = AppState::default();
        state.sync_session(
            SessionSnapshot {
                status: SessionStatus::Error,
                retry_count: 3,
                ..SessionSnapshot::default()
            },
            false,
        );
        assert_eq!(handle_key(key(KeyCode::Char('R')), &mut state), KeyAction::Continue);
        assert!(state.notification.is_some());

        state.retry_offered = true;
        assert_eq!(handle_key(key(KeyCode::Char('R')), &mut state), KeyAction::Retry);
    }

    #[test]
    fn quit_confirms_while_an_analysis_is_in_flight() {
        let mut state = AppState::default();
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Quit);

        state.session.status = SessionStatus::Streaming;
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert_eq!(handle_key(key(KeyCode::Char('n')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);

        handle_key(key(KeyCode::Char('q')), &mut state);
        assert_eq!(handle_key(key(KeyCode::Char('y')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn sample_key_loads_code() {
        let mut state = AppState::default();
        assert_eq!(handle_key(key(KeyCode::Char('S')), &mut state), KeyAction::Edited);
        assert!(state.code_text().contains("fibonacci"));
        assert!(state.heuristic_language.is_some());
    }

    #[test]
    fn focus_moves_with_h_and_l() {
        let mut state = AppState::default();
        handle_key(key(KeyCode::Char('L')), &mut state);
        assert_eq!(state.focus, PanelFocus::Explanation);
        handle_key(key(KeyCode::Char('H')), &mut state);
        handle_key(key(KeyCode::Char('H')), &mut state);
        assert_eq!(state.focus, PanelFocus::Issues);
    }

    #[test]
    fn help_and_history_overlays_close_with_esc() {
        let mut state = AppState::default();
        handle_key(key(KeyCode::Char('?')), &mut state);
        assert_eq!(state.mode, Mode::HelpOverlay);
        handle_key(key(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);

        assert_eq!(handle_key(key(KeyCode::Char('h')), &mut state), KeyAction::OpenHistory);
        state.open_history(vec![]);
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), KeyAction::Continue);
        handle_key(key(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
    }
}
