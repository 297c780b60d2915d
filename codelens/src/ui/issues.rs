//! Issues panel: the bugs reported by the last analysis, selectable with j/k.

use codelens_core::types::{Bug, BugKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

fn badge(kind: BugKind, theme: &Theme) -> Span<'static> {
    let color = match kind {
        BugKind::Error => theme.bug_error,
        BugKind::Warning => theme.bug_warning,
        BugKind::Suggestion => theme.bug_suggestion,
    };
    Span::styled(
        format!("{:<10}", kind.as_str().to_uppercase()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn bug_item(bug: &Bug, theme: &Theme) -> ListItem<'static> {
    let mut head = vec![badge(bug.kind, theme)];
    if let Some(line) = bug.line {
        head.push(Span::styled(format!("L{line} "), Style::default().fg(theme.muted)));
    }
    head.push(Span::raw(bug.message.clone()));

    let mut lines = vec![Line::from(head)];
    if let Some(suggestion) = &bug.suggestion {
        lines.push(Line::styled(
            format!("          → {suggestion}"),
            Style::default().fg(theme.muted),
        ));
    }
    ListItem::new(lines)
}

pub fn render_issues(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Issues;
    let bugs = state.bugs();
    let title = match &state.session.result {
        Some(result) => {
            let (errors, warnings, suggestions) = result.bug_counts();
            format!("Issues ({errors}E {warnings}W {suggestions}S)")
        }
        None => "Issues".to_owned(),
    };
    frame.render_widget(panel_block(title, is_focused, theme), area);
    let inner = inner_rect(area);

    if bugs.is_empty() {
        let msg = if state.session.result.is_some() {
            "No issues found."
        } else {
            "Issues appear here after analysis."
        };
        frame.render_widget(
            Paragraph::new(Line::styled(msg, Style::default().fg(theme.muted))),
            inner,
        );
        return;
    }

    let items: Vec<ListItem> = bugs.iter().map(|b| bug_item(b, theme)).collect();
    let list = List::new(items).highlight_style(
        Style::default()
            .bg(theme.cursor_line)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_stateful_widget(list, inner, &mut state.issues_state);
}
