//! UI rendering module for codelens.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`, each panel
//! in its own file, and the modal overlays in `help.rs` and `history.rs`.

mod code_view;
mod explanation;
mod help;
mod history;
mod issues;
mod layout;
pub mod keybindings;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame: panels, status bar, then any overlay.
///
/// Viewport heights and panel rects are written back into `state` before the
/// panels render, so the next keypress or click sees this frame's geometry.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    frame.render_widget(Block::new().style(Style::default().bg(theme.background)), frame.area());

    let [code, explanation, issues, status_bar] = compute_layout(frame, state);

    state.code_viewport_height = inner_rect(code).height;
    state.explanation_viewport_height = inner_rect(explanation).height;
    state.issues_viewport_height = inner_rect(issues).height;
    state.panel_rects = [code, explanation, issues];

    if code.width > 0 {
        code_view::render_code(frame, code, state, theme);
    }
    if explanation.width > 0 {
        explanation::render_explanation(frame, explanation, state, theme);
    }
    if issues.width > 0 {
        issues::render_issues(frame, issues, state, theme);
    }

    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::History => history::render_history_overlay(frame, state, theme),
        Mode::ConfirmQuit => history::render_confirm_quit(frame, theme),
        Mode::Normal | Mode::Insert => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PanelFocus;
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(width: u16, state: &mut AppState) {
        let mut terminal = Terminal::new(TestBackend::new(width, 30)).unwrap();
        let theme = Theme::dark();
        terminal.draw(|frame| render(frame, state, &theme)).unwrap();
    }

    #[test]
    fn wide_terminal_shows_all_three_panels() {
        let mut state = AppState::default();
        draw(140, &mut state);
        assert!(state.panel_rects.iter().all(|r| r.width > 0));
        assert_eq!(state.code_viewport_height, 27);
    }

    #[test]
    fn narrow_terminal_shows_only_the_focused_panel() {
        let mut state = AppState::default();
        state.focus = PanelFocus::Issues;
        draw(70, &mut state);
        let [code, explanation, issues] = state.panel_rects;
        assert_eq!(code.width, 0);
        assert_eq!(explanation.width, 0);
        assert_eq!(issues.width, 70);
    }

    #[test]
    fn medium_terminal_collapses_issues_to_nothing() {
        let mut state = AppState::default();
        draw(100, &mut state);
        let [code, explanation, issues] = state.panel_rects;
        assert_eq!(issues, ratatui::layout::Rect::default());
        assert_eq!(state.issues_viewport_height, 0);
        assert_eq!(code.x, 0);
        assert!(code.width > 0);
        assert_eq!(explanation.x + explanation.width, 100);
    }

    #[test]
    fn medium_terminal_with_issues_focus_hides_the_explanation() {
        let mut state = AppState::default();
        state.focus = PanelFocus::Issues;
        draw(100, &mut state);
        let [code, explanation, issues] = state.panel_rects;
        assert_eq!(explanation.width, 0);
        assert!(code.width > 0 && issues.width > 0);
        assert_eq!(issues.x + issues.width, 100);
    }

    #[test]
    fn overlays_render_on_small_terminals() {
        let mut state = AppState::default();
        for mode in [Mode::HelpOverlay, Mode::History, Mode::ConfirmQuit] {
            state.mode = mode;
            draw(50, &mut state);
        }
    }
}
