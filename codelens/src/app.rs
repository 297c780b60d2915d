//! Central application state for codelens.
//!
//! This module owns all mutable UI state: the current mode, which panel has focus,
//! the code buffer (a `tui_textarea::TextArea`), per-panel scroll offsets and viewport heights, panel width
//! percentages, and the last session snapshot received from the controller. No
//! ratatui rendering logic lives here; `app.rs` is pure state that is read by the
//! render module and mutated by the keybinding dispatcher and the event loop.

use std::time::{Duration, Instant};

use codelens_core::language::{self, Language};
use codelens_core::types::{Bug, HistoryEntry, SessionSnapshot, SessionStatus};
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::ListState;
use tui_textarea::{CursorMove, TextArea};

use crate::highlight;
use crate::samples::{self, SAMPLES};

/// How long a notification stays in the status bar.
const NOTIFICATION_TTL: Duration = Duration::from_secs(6);

/// Mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the Code panel.
    Insert,
    HelpOverlay,
    /// Past submissions overlay.
    History,
    /// Quit requested while an analysis is in flight.
    ConfirmQuit,
}

/// Which panel currently has keyboard focus.
///
/// Cycle order: `Code` → `Explanation` → `Issues` → `Code`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Code,
    Explanation,
    Issues,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Code => PanelFocus::Issues,
            PanelFocus::Explanation => PanelFocus::Code,
            PanelFocus::Issues => PanelFocus::Explanation,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Code => PanelFocus::Explanation,
            PanelFocus::Explanation => PanelFocus::Issues,
            PanelFocus::Issues => PanelFocus::Code,
        }
    }
}

/// Persistence state of the editor text, shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DraftStatus {
    /// Nothing saved in this run and no edits yet.
    #[default]
    Clean,
    /// Edited since the last save.
    Pending,
    /// Saved at this Unix timestamp.
    Saved(i64),
    /// The last save failed; the text lives only in memory.
    NotSaved,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

/// A code buffer holding `text`, with the cursor on the first line.
///
/// Tab keys insert a literal `\t`; tabs are expanded only when rendering.
fn code_buffer(text: &str) -> TextArea<'static> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut editor = TextArea::new(normalized.split('\n').map(str::to_owned).collect());
    editor.set_hard_tab_indent(true);
    editor
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    pub editor: TextArea<'static>,
    /// Bumped whenever the buffer text changes.
    revision: u64,
    /// Language guessed from the editor text on every edit.
    pub heuristic_language: Option<Language>,
    /// Highlighted editor lines, rebuilt when the text or language changes.
    pub highlighted: Vec<Line<'static>>,
    highlighted_for: Option<(u64, Option<Language>)>,

    /// Last snapshot pulled from the analysis controller.
    pub session: SessionSnapshot,
    /// Whether the controller currently offers a retry.
    pub retry_offered: bool,

    /// First visible line of the Code panel.
    pub code_scroll: usize,
    pub explanation_scroll: u16,
    pub issues_state: ListState,
    pub help_scroll: u16,

    /// Inner heights of the panels, cached after each render.
    pub code_viewport_height: u16,
    pub explanation_viewport_height: u16,
    pub issues_viewport_height: u16,
    /// Outer rects of [code, explanation, issues], cached for mouse hit-testing.
    pub panel_rects: [Rect; 3],

    /// Width percentages of the three panels. Default: 45 / 35 / 20.
    pub left_pct: u16,
    pub center_pct: u16,
    pub right_pct: u16,

    pub history: Vec<HistoryEntry>,
    pub history_state: ListState,
    /// History entry for the session currently in flight, to receive its summary.
    pub pending_history: Option<(u64, String)>,

    pub sample_index: Option<usize>,
    pub draft_status: DraftStatus,
    /// Editor revision last written to the draft store.
    pub saved_revision: u64,
    pub notification: Option<Notification>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            editor: code_buffer(""),
            revision: 0,
            heuristic_language: None,
            highlighted: Vec::new(),
            highlighted_for: None,
            session: SessionSnapshot::default(),
            retry_offered: false,
            code_scroll: 0,
            explanation_scroll: 0,
            issues_state: ListState::default(),
            help_scroll: 0,
            code_viewport_height: 0,
            explanation_viewport_height: 0,
            issues_viewport_height: 0,
            panel_rects: [Rect::default(); 3],
            left_pct: 45,
            center_pct: 35,
            right_pct: 20,
            history: Vec::new(),
            history_state: ListState::default(),
            pending_history: None,
            sample_index: None,
            draft_status: DraftStatus::default(),
            saved_revision: 0,
            notification: None,
        }
    }
}

impl AppState {
    /// Starts with `text` in the editor (a restored draft), treated as already saved.
    pub fn with_draft(text: &str, saved_at: Option<i64>) -> Self {
        let mut state = Self {
            editor: code_buffer(text),
            ..Self::default()
        };
        if let Some(at) = saved_at {
            state.draft_status = DraftStatus::Saved(at);
        }
        state.on_edit();
        state
    }

    /// The buffer text exactly as typed or pasted, lines joined with `\n`.
    pub fn code_text(&self) -> String {
        self.editor.lines().join("\n")
    }

    pub fn code_is_blank(&self) -> bool {
        self.editor.lines().iter().all(|l| l.trim().is_empty())
    }

    pub fn line_count(&self) -> usize {
        self.editor.lines().len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Records the outcome of a `TextArea` edit. Returns `modified` so callers
    /// can chain on it.
    pub fn record_edit(&mut self, modified: bool) -> bool {
        if modified {
            self.revision += 1;
            self.on_edit();
        } else {
            self.ensure_cursor_visible();
        }
        modified
    }

    /// Inserts pasted text at the cursor. Returns `true` if the buffer changed.
    pub fn paste(&mut self, text: &str) -> bool {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let modified = self.editor.insert_str(normalized);
        self.record_edit(modified)
    }

    /// Re-runs language detection and marks the draft dirty if the text moved
    /// past the last saved revision.
    fn on_edit(&mut self) {
        self.heuristic_language = language::detect(&self.code_text());
        if self.revision != self.saved_revision {
            self.draft_status = DraftStatus::Pending;
        }
        self.ensure_cursor_visible();
    }

    /// Replaces the buffer (sample, history entry) and scrolls to the top.
    pub fn load_text(&mut self, text: &str) {
        self.editor = code_buffer(text);
        self.code_scroll = 0;
        self.revision += 1;
        self.on_edit();
    }

    /// Puts the cursor at the start of 1-based `line`, clamped to the buffer.
    pub fn goto_line(&mut self, line: usize) {
        let row = line.clamp(1, self.line_count()) - 1;
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        self.editor.move_cursor(CursorMove::Jump(row, 0));
        self.ensure_cursor_visible();
    }

    /// Cycles the next sample snippet into the editor.
    pub fn next_sample(&mut self) {
        let index = samples::next_index(self.sample_index);
        self.sample_index = Some(index);
        self.load_text(SAMPLES[index].code);
        self.notify(format!("Loaded {} sample", SAMPLES[index].language.display_name()));
    }

    /// The language shown to the user: the service's, once it has answered,
    /// otherwise the local guess.
    pub fn display_language(&self) -> Option<Language> {
        self.session
            .result
            .as_ref()
            .and_then(|r| r.language())
            .or(self.heuristic_language)
    }

    /// Rebuilds the highlighted lines if the text or language changed.
    pub fn refresh_highlight(&mut self) {
        let key = (self.revision, self.display_language());
        if self.highlighted_for == Some(key) && self.highlighted.len() == self.line_count() {
            return;
        }
        self.highlighted = highlight::highlight(self.editor.lines(), key.1);
        self.highlighted_for = Some(key);
    }

    /// Stores a fresh controller snapshot, resetting result views when the
    /// result itself changed.
    pub fn sync_session(&mut self, snapshot: SessionSnapshot, retry_offered: bool) {
        if snapshot.result != self.session.result {
            self.explanation_scroll = 0;
            let has_bugs = snapshot.result.as_ref().is_some_and(|r| !r.bugs.is_empty());
            self.issues_state.select(has_bugs.then_some(0));
        }
        self.session = snapshot;
        self.retry_offered = retry_offered;
    }

    pub fn in_flight(&self) -> bool {
        self.session.status.is_in_flight()
    }

    pub fn bugs(&self) -> &[Bug] {
        self.session.result.as_ref().map_or(&[], |r| r.bugs.as_slice())
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notification = Some(Notification {
            text: text.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        self.notification = Some(Notification {
            text: text.into(),
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    /// Drops the notification once it has been visible long enough.
    pub fn expire_notification(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| now.duration_since(n.shown_at) >= NOTIFICATION_TTL)
        {
            self.notification = None;
        }
    }

    /// Shows the history overlay with `entries`, newest first.
    pub fn open_history(&mut self, entries: Vec<HistoryEntry>) {
        self.history_state.select(if entries.is_empty() { None } else { Some(0) });
        self.history = entries;
        self.mode = Mode::History;
    }

    /// Loads the selected history entry into the editor. Returns `false` when
    /// nothing is selected.
    pub fn restore_selected_history(&mut self) -> bool {
        let Some(entry) = self.history_state.selected().and_then(|i| self.history.get(i)) else {
            return false;
        };
        let code = entry.code.clone();
        self.load_text(&code);
        self.mode = Mode::Normal;
        self.focus = PanelFocus::Code;
        self.notify("Restored from history");
        true
    }

    /// Moves the editor cursor to the selected issue's line. Returns `false`
    /// when no issue is selected or it has no line.
    pub fn jump_to_selected_issue(&mut self) -> bool {
        let line = self
            .issues_state
            .selected()
            .and_then(|i| self.bugs().get(i))
            .and_then(|bug| bug.line);
        let Some(line) = line else {
            return false;
        };
        self.goto_line(line as usize);
        self.focus = PanelFocus::Code;
        true
    }

    /// Keeps the cursor row inside the Code panel viewport.
    pub fn ensure_cursor_visible(&mut self) {
        let (row, _) = self.editor.cursor();
        let height = usize::from(self.code_viewport_height.max(1));
        if row < self.code_scroll {
            self.code_scroll = row;
        } else if row >= self.code_scroll + height {
            self.code_scroll = row + 1 - height;
        }
    }

    /// Scrolls the focused panel down by `lines` rows.
    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Code => {
                let last = self.line_count().saturating_sub(1);
                self.code_scroll = (self.code_scroll + usize::from(lines)).min(last);
            }
            PanelFocus::Explanation => {
                self.explanation_scroll = self.explanation_scroll.saturating_add(lines);
            }
            PanelFocus::Issues => {
                self.issues_state.scroll_down_by(lines);
            }
        }
    }

    /// Scrolls the focused panel up by `lines` rows.
    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Code => {
                self.code_scroll = self.code_scroll.saturating_sub(usize::from(lines));
            }
            PanelFocus::Explanation => {
                self.explanation_scroll = self.explanation_scroll.saturating_sub(lines);
            }
            PanelFocus::Issues => {
                self.issues_state.scroll_up_by(lines);
            }
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Code => self.code_scroll = 0,
            PanelFocus::Explanation => self.explanation_scroll = 0,
            PanelFocus::Issues => self.issues_state.select_first(),
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Code => self.code_scroll = self.line_count().saturating_sub(1),
            // Clamped by the renderer.
            PanelFocus::Explanation => self.explanation_scroll = u16::MAX,
            PanelFocus::Issues => self.issues_state.select_last(),
        }
    }

    fn viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Code => self.code_viewport_height,
            PanelFocus::Explanation => self.explanation_viewport_height,
            PanelFocus::Issues => self.issues_viewport_height,
        }
    }

    /// Scrolls by half the focused panel's height (at least one row).
    pub fn half_page_down(&mut self) {
        self.scroll_down((self.viewport_height() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.viewport_height() / 2).max(1));
    }

    pub fn full_page_down(&mut self) {
        self.scroll_down(self.viewport_height().max(1));
    }

    pub fn full_page_up(&mut self) {
        self.scroll_up(self.viewport_height().max(1));
    }

    /// Shrinks the Code panel by 5%, giving the space to the Explanation panel.
    /// The Code panel will not shrink below 25%.
    pub fn shrink_code_panel(&mut self) {
        const MIN_LEFT: u16 = 25;
        let transfer = 5.min(self.left_pct.saturating_sub(MIN_LEFT));
        self.left_pct -= transfer;
        self.center_pct += transfer;
    }

    /// Grows the Code panel by 5%, taken from the Explanation panel.
    /// The Explanation panel will not shrink below 20%.
    pub fn grow_code_panel(&mut self) {
        const MIN_CENTER: u16 = 20;
        let transfer = 5.min(self.center_pct.saturating_sub(MIN_CENTER));
        self.center_pct -= transfer;
        self.left_pct += transfer;
    }

    /// True when the session ended in error with a status worth showing.
    pub fn failed(&self) -> bool {
        self.session.status == SessionStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codelens_core::types::{AnalysisResult, BugKind};

    fn result_with_bugs(lines: &[Option<u32>]) -> AnalysisResult {
        AnalysisResult {
            summary: "s".into(),
            detected_language: Some("python".into()),
            functions: vec![],
            variables: vec![],
            logic_flow: vec![],
            bugs: lines
                .iter()
                .map(|line| Bug {
                    kind: BugKind::Warning,
                    message: "m".into(),
                    line: *line,
                    suggestion: None,
                })
                .collect(),
        }
    }

    #[test]
    fn panel_focus_cycles() {
        assert_eq!(PanelFocus::Code.next().next().next(), PanelFocus::Code);
        assert_eq!(PanelFocus::Code.prev(), PanelFocus::Issues);
    }

    #[test]
    fn edits_redetect_language_and_mark_the_draft_pending() {
        let mut state = AppState::default();
        assert!(state.paste("def f():\n    print('x')"));
        assert_eq!(state.heuristic_language, Some(Language::Python));
        assert_eq!(state.draft_status, DraftStatus::Pending);
    }

    #[test]
    fn restored_draft_starts_saved() {
        let state = AppState::with_draft("let x = 1;", Some(1_700_000_000));
        assert_eq!(state.code_text(), "let x = 1;");
        assert_eq!(state.draft_status, DraftStatus::Saved(1_700_000_000));
        assert_eq!(state.saved_revision, state.revision());
    }

    #[test]
    fn service_language_wins_over_the_guess() {
        let mut state = AppState::with_draft("const x = () => 1;", None);
        assert_eq!(state.display_language(), Some(Language::JavaScript));
        let snapshot = SessionSnapshot {
            status: SessionStatus::Complete,
            result: Some(result_with_bugs(&[])),
            ..SessionSnapshot::default()
        };
        state.sync_session(snapshot, false);
        assert_eq!(state.display_language(), Some(Language::Python));
    }

    #[test]
    fn issue_jump_moves_the_cursor_to_the_reported_line() {
        let mut state = AppState::with_draft("a\nb\nc\nd", None);
        state.focus = PanelFocus::Issues;
        let snapshot = SessionSnapshot {
            status: SessionStatus::Complete,
            result: Some(result_with_bugs(&[Some(3), None])),
            ..SessionSnapshot::default()
        };
        state.sync_session(snapshot, false);
        assert_eq!(state.issues_state.selected(), Some(0));

        assert!(state.jump_to_selected_issue());
        assert_eq!(state.editor.cursor(), (2, 0));
        assert_eq!(state.focus, PanelFocus::Code);

        state.issues_state.select(Some(1));
        assert!(!state.jump_to_selected_issue(), "issue without a line");
    }

    #[test]
    fn history_restore_replaces_the_editor_text() {
        let mut state = AppState::default();
        state.open_history(vec![HistoryEntry {
            id: "1".into(),
            code: "print(1)".into(),
            language: Some("python".into()),
            summary: None,
            submitted_at: 0,
        }]);
        assert_eq!(state.mode, Mode::History);
        assert!(state.restore_selected_history());
        assert_eq!(state.code_text(), "print(1)");
        assert_eq!(state.mode, Mode::Normal);

        state.open_history(vec![]);
        assert!(!state.restore_selected_history());
    }

    const GO: &str = "package main\n\nfunc main() {\n\tfmt.Println(1)\n}";

    #[test]
    fn tab_indented_code_round_trips_unchanged() {
        let restored = AppState::with_draft(GO, None);
        assert_eq!(restored.code_text(), GO);

        let mut pasted = AppState::default();
        assert!(pasted.paste(GO));
        assert_eq!(pasted.code_text(), GO);

        let mut loaded = AppState::default();
        loaded.load_text(GO);
        assert_eq!(loaded.code_text(), GO);
    }

    #[test]
    fn pasted_crlf_becomes_plain_newlines() {
        let mut state = AppState::default();
        state.paste("a\r\nb");
        assert_eq!(state.code_text(), "a\nb");
        assert_eq!(state.line_count(), 2);
    }

    #[test]
    fn revision_moves_only_on_real_edits() {
        let mut state = AppState::with_draft("x", None);
        let before = state.revision();
        assert!(!state.record_edit(false));
        assert_eq!(state.revision(), before);
        assert!(state.paste("y"));
        assert_eq!(state.revision(), before + 1);
        assert_eq!(state.draft_status, DraftStatus::Pending);
    }

    #[test]
    fn goto_line_clamps_to_the_buffer() {
        let mut state = AppState::with_draft("a\nb\nc", None);
        state.goto_line(99);
        assert_eq!(state.editor.cursor(), (2, 0));
        state.goto_line(0);
        assert_eq!(state.editor.cursor(), (0, 0));
    }

    #[test]
    fn notifications_expire() {
        let mut state = AppState::default();
        state.notify("hello");
        let shown = state.notification.as_ref().unwrap().shown_at;
        state.expire_notification(shown + Duration::from_secs(1));
        assert!(state.notification.is_some());
        state.expire_notification(shown + NOTIFICATION_TTL);
        assert!(state.notification.is_none());
    }

    #[test]
    fn code_panel_resize_respects_minimums() {
        let mut state = AppState::default();
        for _ in 0..10 {
            state.shrink_code_panel();
        }
        assert_eq!(state.left_pct, 25);
        for _ in 0..20 {
            state.grow_code_panel();
        }
        assert_eq!(state.center_pct, 20);
        assert_eq!(state.left_pct + state.center_pct + state.right_pct, 100);
    }
}
