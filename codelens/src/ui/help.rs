//! Help overlay renderer for codelens.
//!
//! Draws a centred modal over the panel layout. `Clear` erases the area first so
//! the overlay is rendered inside the same `terminal.draw()` closure as the panels.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay, scrolled down by `help_scroll` rows.
///
/// Skipped on terminals narrower than 60 columns, where the centred rect would
/// have zero height.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to dismiss) ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Editing"),
        Line::from("  i             Edit the code (Insert mode)"),
        Line::from("  Esc           Back to Normal mode"),
        Line::from("  paste         Pasted text is inserted at the cursor"),
        Line::from("  S             Load the next sample snippet"),
        Line::from(""),
        Line::from("Analysis"),
        Line::from("  r / Ctrl-r    Analyse now (Ctrl-r also works while editing)"),
        Line::from("  R             Retry a failed analysis"),
        Line::from("                Edits are analysed automatically after a pause"),
        Line::from("  h             Recent submissions; Enter restores one"),
        Line::from(""),
        Line::from("Navigation"),
        Line::from("  j / k         Scroll down / up one line"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Scroll half page down / up"),
        Line::from("  Ctrl-f / b    Scroll full page down / up"),
        Line::from("  H / L / Tab   Move panel focus"),
        Line::from("  Enter         On an issue: jump to its line"),
        Line::from("  < / >         Shrink / grow the code panel"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q             Quit (confirms while an analysis is running)"),
    ])
}
