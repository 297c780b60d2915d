//! syntect-backed highlighting for the Code panel.

use std::sync::LazyLock;

use codelens_core::language::Language;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_nonewlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

/// Warms the syntax and theme sets so the first highlighted frame is not slow.
pub fn preload() {
    let _ = &*PS;
    let _ = &*TS;
}

fn syntax_for(language: Option<Language>) -> Option<&'static SyntaxReference> {
    let language = language?;
    PS.find_syntax_by_extension(language.extension()).or_else(|| match language {
        // The bundled set has no TypeScript grammar.
        Language::TypeScript => PS.find_syntax_by_extension("js"),
        _ => None,
    })
}

fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    let mut ratatui_style = Style::default();
    if style.foreground.a > 0 {
        let c = style.foreground;
        ratatui_style = ratatui_style.fg(Color::Rgb(c.r, c.g, c.b));
    }
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.to_owned(), ratatui_style)
}

/// Highlights `lines` as `language`. Unknown languages, and lines syntect fails
/// on, come back as plain text.
pub fn highlight(lines: &[String], language: Option<Language>) -> Vec<Line<'static>> {
    let (Some(syntax), Some(theme)) = (syntax_for(language), TS.themes.get(THEME)) else {
        return lines.iter().map(|l| Line::raw(l.clone())).collect();
    };

    let mut h = HighlightLines::new(syntax, theme);
    lines
        .iter()
        .map(|line| match h.highlight_line(line, &PS) {
            Ok(ranges) if !ranges.is_empty() => Line::from(
                ranges
                    .into_iter()
                    .map(|(style, text)| syntect_to_span(style, text))
                    .collect::<Vec<_>>(),
            ),
            _ => Line::raw(line.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn highlighting_keeps_the_text() {
        let lines = vec!["def f(x):".to_owned(), "    return x + 1".to_owned()];
        let out = highlight(&lines, Some(Language::Python));
        assert_eq!(out.len(), 2);
        assert_eq!(plain(&out[0]), "def f(x):");
        assert_eq!(plain(&out[1]), "    return x + 1");
        assert!(out[0].spans.len() > 1, "python should be tokenised");
    }

    #[test]
    fn typescript_falls_back_to_javascript() {
        assert!(syntax_for(Some(Language::TypeScript)).is_some());
    }

    #[test]
    fn unknown_language_is_plain() {
        let lines = vec!["something".to_owned()];
        let out = highlight(&lines, None);
        assert_eq!(out[0].spans.len(), 1);
    }
}
