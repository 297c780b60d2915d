//! Modal overlays that sit on top of the panels: submission history and the
//! quit confirmation.

use codelens_core::types::HistoryEntry;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;

/// First non-blank line of `code`, cut to `width` characters.
fn preview(code: &str, width: usize) -> String {
    let first = code.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first.chars().count() > width {
        let cut: String = first.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        first.to_owned()
    }
}

fn history_item(entry: &HistoryEntry, width: usize, theme: &Theme) -> ListItem<'static> {
    let language = entry.language.as_deref().unwrap_or("?");
    let head = Line::from(vec![
        Span::styled(format!("{language:<11}"), Style::default().fg(theme.identifier)),
        Span::raw(preview(&entry.code, width.saturating_sub(12))),
    ]);
    let summary = entry
        .summary
        .as_deref()
        .map_or_else(|| "(no explanation yet)".to_owned(), |s| preview(s, width.saturating_sub(11)));
    ListItem::new(vec![
        head,
        Line::styled(format!("           {summary}"), Style::default().fg(theme.muted)),
    ])
}

pub fn render_history_overlay(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    if frame.area().width < 40 {
        return;
    }
    let area = frame
        .area()
        .centered(Constraint::Percentage(70), Constraint::Percentage(70));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Recent submissions  (Enter restore, Esc close) ")
        .border_style(Style::default().fg(theme.border_active));

    if state.history.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled("Nothing submitted yet.", Style::default().fg(theme.muted)))
                .block(block),
            area,
        );
        return;
    }

    let width = usize::from(area.width.saturating_sub(2));
    let items: Vec<ListItem> = state
        .history
        .iter()
        .map(|e| history_item(e, width, theme))
        .collect();
    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(theme.cursor_line)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_stateful_widget(list, area, &mut state.history_state);
}

pub fn render_confirm_quit(frame: &mut Frame, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(44), Constraint::Length(5));
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .title(" Quit? ")
        .border_style(Style::default().fg(theme.status_error));
    frame.render_widget(
        Paragraph::new(vec![
            Line::raw("An analysis is still running."),
            Line::raw("Quit anyway? (y / n)"),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block),
        area,
    );
}
