//! Responsive 3-panel layout engine for codelens.
//!
//! Pure layout arithmetic plus the shared panel chrome (borders, status bar).
//! Called inside `terminal.draw()` on every render so the layout always reflects
//! the current terminal size.
//!
//! # Panel geometry
//!
//! | Terminal width | Layout |
//! |----------------|--------|
//! | `>= 120` cols  | Code / Explanation / Issues using `state.left_pct / center_pct / right_pct` |
//! | `80..120` cols | Code / Explanation split evenly; Issues collapsed |
//! | `< 80` cols    | Only the focused panel |
//!
//! `Spacing::Overlap(1)` with `MergeStrategy::Fuzzy` makes adjacent borders
//! share one column and merge their junction characters.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use codelens_core::types::SessionStatus;

use crate::app::{AppState, DraftStatus, Mode, PanelFocus};
use crate::theme::Theme;

/// Panels shown side by side at `term_width`, in `[code, explanation, issues]` order.
fn visible_panels(term_width: u16, focus: PanelFocus) -> [bool; 3] {
    if term_width >= 120 {
        [true; 3]
    } else if term_width >= 80 {
        match focus {
            // Issues stays reachable by swapping it in for the Explanation panel.
            PanelFocus::Issues => [true, false, true],
            _ => [true, true, false],
        }
    } else {
        let mut only = [false; 3];
        only[match focus {
            PanelFocus::Code => 0,
            PanelFocus::Explanation => 1,
            PanelFocus::Issues => 2,
        }] = true;
        only
    }
}

/// Returns `[code, explanation, issues, status_bar]` rects for the current frame.
///
/// Hidden panels get `Rect::default()`. The horizontal split only sees the
/// visible panels, since an overlapped zero-length slot still occupies a column.
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let visible = visible_panels(term_width, state.focus);
    let constraints: Vec<Constraint> = if term_width >= 120 {
        vec![
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ]
    } else {
        visible.iter().filter(|&&shown| shown).map(|_| Constraint::Fill(1)).collect()
    };

    let split = Layout::horizontal(constraints)
        .spacing(Spacing::Overlap(1))
        .split(main_area);
    let mut rects = split.iter().copied();
    let mut panels = [Rect::default(); 3];
    for (slot, shown) in panels.iter_mut().zip(visible) {
        if shown {
            *slot = rects.next().unwrap_or_default();
        }
    }

    let [code, explanation, issues] = panels;
    [code, explanation, issues, status_bar]
}

/// Inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// `BorderType::Thick` marks the focused panel. `MergeStrategy::Fuzzy` because
/// `Exact` produces wrong junctions when mixing `Thick` and `Plain` borders.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

fn draft_text(status: &DraftStatus) -> String {
    match status {
        DraftStatus::Clean => String::new(),
        DraftStatus::Pending => "draft: unsaved".to_owned(),
        DraftStatus::Saved(_) => "draft: saved".to_owned(),
        DraftStatus::NotSaved => "draft not saved".to_owned(),
    }
}

/// Renders the 1-row status bar: mode, language, session, draft, notification.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::History => (" HISTORY ", theme.status_mode_normal),
        Mode::Normal | Mode::ConfirmQuit | Mode::HelpOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    let language = state
        .display_language()
        .map_or("plain text", |l| l.display_name());
    spans.push(Span::raw(format!(" {language} ")));

    let session = &state.session;
    let session_text = match session.status {
        SessionStatus::Idle => String::new(),
        SessionStatus::Connecting | SessionStatus::Streaming => format!(
            "| {} {:>3.0}% {} ",
            session.status.as_str(),
            session.progress_percent,
            session.stage_label
        ),
        SessionStatus::Complete => "| complete ".to_owned(),
        SessionStatus::Error if state.retry_offered => "| error (R to retry) ".to_owned(),
        SessionStatus::Error => "| error ".to_owned(),
    };
    let session_fg = if state.failed() { theme.status_error } else { theme.status_bar_fg };
    spans.push(Span::styled(session_text, Style::default().fg(session_fg)));

    let draft = draft_text(&state.draft_status);
    if !draft.is_empty() {
        let fg = if state.draft_status == DraftStatus::NotSaved {
            theme.status_error
        } else {
            theme.muted
        };
        spans.push(Span::styled(format!("| {draft} "), Style::default().fg(fg)));
    }

    if let Some(n) = &state.notification {
        let fg = if n.is_error { theme.status_error } else { theme.status_ok };
        spans.push(Span::styled(format!("| {}", n.text), Style::default().fg(fg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
