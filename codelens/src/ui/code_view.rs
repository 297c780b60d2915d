//! Code panel renderer.
//!
//! Virtual scrolling like a diff view: only `code_scroll..code_scroll + height`
//! lines are materialised per frame, each prefixed with a line-number gutter.
//! In Insert mode the terminal cursor is placed at the editor cursor.

use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Columns per tab stop when displaying code. The buffer keeps the tab itself.
const TAB_WIDTH: usize = 4;

fn gutter_width(line_count: usize) -> usize {
    line_count.max(1).to_string().len().max(3) + 1
}

/// Replaces tabs with spaces up to the next tab stop, carrying the column
/// across span boundaries.
fn expand_tabs(spans: &[Span<'static>]) -> Vec<Span<'static>> {
    let mut column = 0;
    spans
        .iter()
        .map(|span| {
            if !span.content.contains('\t') {
                column += span.content.chars().count();
                return span.clone();
            }
            let mut expanded = String::with_capacity(span.content.len() + TAB_WIDTH);
            for c in span.content.chars() {
                if c == '\t' {
                    let fill = TAB_WIDTH - column % TAB_WIDTH;
                    expanded.push_str(&" ".repeat(fill));
                    column += fill;
                } else {
                    expanded.push(c);
                    column += 1;
                }
            }
            Span::styled(expanded, span.style)
        })
        .collect()
}

/// Screen column of character index `col` in `line` once tabs are expanded.
fn display_column(line: &str, col: usize) -> usize {
    line.chars().take(col).fold(0, |column, c| {
        if c == '\t' {
            column + TAB_WIDTH - column % TAB_WIDTH
        } else {
            column + 1
        }
    })
}

pub fn render_code(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Code;
    let title = match state.display_language() {
        Some(lang) => format!("Code ({})", lang.display_name()),
        None => "Code".to_owned(),
    };
    frame.render_widget(panel_block(title, is_focused, theme), area);
    let inner = inner_rect(area);

    if state.code_is_blank() && state.mode != Mode::Insert {
        let hint = Paragraph::new(vec![
            Line::raw(""),
            Line::styled("  Paste your code, or press", Style::default().fg(theme.muted)),
            Line::styled("  i  to start typing", Style::default().fg(theme.muted)),
            Line::styled("  S  to load a sample", Style::default().fg(theme.muted)),
        ]);
        frame.render_widget(hint, inner);
        return;
    }

    let source = state.editor.lines();
    let total = source.len();
    let gutter = gutter_width(total);
    let (cursor_row, cursor_col) = state.editor.cursor();
    let visible_start = state.code_scroll.min(total.saturating_sub(1));
    let visible_end = (visible_start + inner.height as usize).min(total);

    let lines: Vec<Line> = (visible_start..visible_end)
        .map(|row| {
            let mut spans = vec![Span::styled(
                format!("{:>width$} ", row + 1, width = gutter - 1),
                Style::default().fg(theme.muted),
            )];
            match state.highlighted.get(row) {
                Some(line) => spans.extend(expand_tabs(&line.spans)),
                None => spans.extend(expand_tabs(&[Span::raw(source[row].clone())])),
            }
            let line = Line::from(spans);
            if row == cursor_row && is_focused {
                line.style(Style::default().bg(theme.cursor_line))
            } else {
                line
            }
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(theme.text)),
        inner,
    );

    if state.mode == Mode::Insert && (visible_start..visible_end).contains(&cursor_row) {
        let x = inner.x as usize + gutter + display_column(&source[cursor_row], cursor_col);
        let max_x = (inner.x + inner.width).saturating_sub(1) as usize;
        frame.set_cursor_position(Position {
            x: x.min(max_x) as u16,
            y: inner.y + (cursor_row - visible_start) as u16,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gutter_fits_the_largest_line_number() {
        assert_eq!(gutter_width(1), 4);
        assert_eq!(gutter_width(999), 4);
        assert_eq!(gutter_width(1_000), 5);
    }

    #[test]
    fn tabs_expand_to_the_next_stop_across_spans() {
        let spans = [Span::raw("\tx"), Span::raw("a\tb"), Span::raw("c")];
        let text: Vec<String> = expand_tabs(&spans).iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, vec!["    x", "a  b", "c"]);
    }

    #[test]
    fn cursor_column_accounts_for_tabs() {
        assert_eq!(display_column("\tfmt", 0), 0);
        assert_eq!(display_column("\tfmt", 1), 4);
        assert_eq!(display_column("a\tb", 2), 4);
        assert_eq!(display_column("abc", 2), 2);
    }
}
