//! Explanation panel: progress while waiting, the explanation once it arrives.

use codelens_core::types::{AnalysisResult, SessionStatus};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Wrap},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_explanation(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Explanation;
    frame.render_widget(panel_block("Explanation", is_focused, theme), area);
    let inner = inner_rect(area);
    if inner.height == 0 {
        return;
    }

    let session = &state.session;
    match session.status {
        SessionStatus::Connecting | SessionStatus::Streaming => {
            let [gauge_area, _, label_area] = inner.layout(&Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ]));
            let ratio = (session.progress_percent / 100.0).clamp(0.0, 1.0);
            frame.render_widget(
                Gauge::default()
                    .gauge_style(Style::default().fg(theme.progress))
                    .ratio(ratio)
                    .label(format!("{:.0}%", session.progress_percent)),
                gauge_area,
            );
            frame.render_widget(
                Paragraph::new(Line::styled(
                    session.stage_label.clone(),
                    Style::default().fg(theme.muted),
                )),
                label_area,
            );
        }
        SessionStatus::Error => {
            let detail = session
                .error
                .as_ref()
                .map_or_else(|| "Analysis failed".to_owned(), ToString::to_string);
            let mut lines = vec![
                Line::styled("Analysis failed", Style::default().fg(theme.status_error).add_modifier(Modifier::BOLD)),
                Line::raw(""),
                Line::raw(detail),
            ];
            if state.retry_offered {
                lines.push(Line::raw(""));
                lines.push(Line::styled("Press R to retry.", Style::default().fg(theme.muted)));
            }
            frame.render_widget(
                Paragraph::new(lines)
                    .style(Style::default().fg(theme.text))
                    .wrap(Wrap { trim: false }),
                inner,
            );
        }
        SessionStatus::Complete | SessionStatus::Idle => {
            let text = match &session.result {
                Some(result) => result_lines(result, theme),
                None => vec![Line::styled(
                    "Press r to analyse the code. Edits are re-analysed automatically.",
                    Style::default().fg(theme.muted),
                )],
            };
            // Clamp so `G` cannot scroll past the end.
            let max_scroll = text.len().saturating_sub(1).min(u16::MAX as usize) as u16;
            frame.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(theme.text))
                    .wrap(Wrap { trim: false })
                    .scroll((state.explanation_scroll.min(max_scroll), 0)),
                inner,
            );
        }
    }
}

fn heading(text: &str, theme: &Theme) -> Line<'static> {
    Line::styled(
        text.to_owned(),
        Style::default().fg(theme.heading).add_modifier(Modifier::BOLD),
    )
}

/// Flattens a result into display lines: summary, functions, variables, flow.
fn result_lines(result: &AnalysisResult, theme: &Theme) -> Vec<Line<'static>> {
    let name_style = Style::default().fg(theme.identifier);
    let muted = Style::default().fg(theme.muted);

    let mut lines = vec![heading("Summary", theme), Line::raw(result.summary.clone())];

    if !result.functions.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Functions", theme));
        for f in &result.functions {
            let mut signature = vec![Span::styled(f.name.clone(), name_style)];
            if let Some(returns) = &f.returns {
                signature.push(Span::styled(format!(" -> {returns}"), muted));
            }
            lines.push(Line::from(signature));
            if !f.explanation.is_empty() {
                lines.push(Line::raw(format!("  {}", f.explanation)));
            }
            for p in &f.parameters {
                lines.push(Line::styled(format!("  • {p}"), muted));
            }
        }
    }

    if !result.variables.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Variables", theme));
        for v in &result.variables {
            let mut spans = vec![Span::styled(v.name.clone(), name_style)];
            if !v.ty.is_empty() {
                spans.push(Span::styled(format!(": {}", v.ty), muted));
            }
            if !v.purpose.is_empty() {
                spans.push(Span::raw(format!("  {}", v.purpose)));
            }
            lines.push(Line::from(spans));
        }
    }

    if !result.logic_flow.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Logic flow", theme));
        for step in &result.logic_flow {
            lines.push(Line::raw(format!("{:>2}. {}", step.step, step.description)));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_appear_only_when_present() {
        let result = AnalysisResult::from_json(
            r#"{"summary":"adds","functions":[{"name":"add","explanation":"sums","parameters":["a","b"],"returns":"int"}]}"#,
        )
        .unwrap();
        let text: Vec<String> = result_lines(&result, &Theme::dark())
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text[0], "Summary");
        assert!(text.contains(&"Functions".to_owned()));
        assert!(text.contains(&"add -> int".to_owned()));
        assert!(!text.contains(&"Variables".to_owned()));
        assert!(!text.contains(&"Logic flow".to_owned()));
    }
}
