//! codelens: paste code, get an AI explanation and a list of issues.
//!
//! Entry point for the `codelens` binary. Wires together the terminal lifecycle
//! (`tui`), the event bus (`event`), the UI (`ui`), and the analysis controller,
//! draft cache, and history store from `codelens-core`.
//!
//! # Startup sequence
//!
//! 1. Create `.codelens/` and start file logging, so config warnings are captured.
//! 2. Load config and theme. Read-only, safe before terminal init.
//! 3. Open the database and restore the saved draft before the first frame.
//! 4. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 5. Create the event channel and `spawn_event_task()`.
//!
//! `restore_tui()` is called after the event loop exits (quit key, SIGTERM, or
//! channel close). Errors inside the loop break out of it rather than returning,
//! so the terminal is always restored.

mod app;
mod config;
mod event;
mod highlight;
mod logging;
mod samples;
mod theme;
mod tui;
mod ui;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::Context;
use codelens_core::backend::HttpBackend;
use codelens_core::db;
use codelens_core::draft::DraftCache;
use codelens_core::session::{AnalysisController, SessionEvent};
use tokio::sync::mpsc;
use tokio_rusqlite::Connection;

use crate::app::{AppState, DraftStatus};
use crate::config::Config;
use crate::event::AppEvent;
use crate::ui::keybindings::{self, KeyAction};

const DATA_DIR: &str = ".codelens";
const DB_PATH: &str = ".codelens/codelens.db";
const LOG_PATH: &str = ".codelens/codelens.log";

type Controller = AnalysisController<HttpBackend>;

/// Submits the editor text and records it in the history on success.
async fn analyze(
    state: &mut AppState,
    controller: &mut Controller,
    conn: &Connection,
    config: &Config,
) {
    let code = state.code_text();
    match controller.submit(&code).await {
        Ok(true) => record(state, controller, conn, config, &code).await,
        Ok(false) => state.notify("Nothing to analyse"),
        Err(e) => state.notify_error(e.to_string()),
    }
}

async fn retry(state: &mut AppState, controller: &mut Controller, conn: &Connection, config: &Config) {
    if !controller.retry().await {
        state.notify("Nothing to retry");
        return;
    }
    if let Some(code) = controller.last_code().map(str::to_owned) {
        record(state, controller, conn, config, &code).await;
    }
}

async fn record(
    state: &mut AppState,
    controller: &Controller,
    conn: &Connection,
    config: &Config,
    code: &str,
) {
    let language = codelens_core::language::detect(code).map(|l| l.as_str());
    match db::record_submission(conn, code, language, config.history_limit).await {
        Ok(entry) => state.pending_history = Some((controller.session_number(), entry.id)),
        Err(e) => {
            tracing::warn!(error = %e, "could not record submission in history");
            state.pending_history = None;
        }
    }
}

/// Saves the editor text when it changed since the last save.
async fn save_draft(state: &mut AppState, drafts: &mut DraftCache) {
    let revision = state.revision();
    if revision == state.saved_revision {
        return;
    }
    match drafts.save(&state.code_text(), state.heuristic_language).await {
        Ok(_) => {
            state.saved_revision = revision;
            state.draft_status = DraftStatus::Saved(db::now_secs());
        }
        Err(e) => {
            tracing::warn!(error = %e, "draft not saved");
            state.saved_revision = revision;
            state.draft_status = DraftStatus::NotSaved;
        }
    }
}

/// Applies a session event, storing the summary of a delivered result.
async fn on_session_event(
    event: SessionEvent,
    state: &mut AppState,
    controller: &mut Controller,
    conn: &Connection,
) {
    let session = event.session();
    let failure = match &event {
        SessionEvent::Failed { error, .. } => Some(error.to_string()),
        _ => None,
    };
    let delivered = matches!(event, SessionEvent::Delivered { .. });
    if !controller.handle(event) {
        return;
    }
    if let Some(message) = failure {
        state.notify_error(message);
        return;
    }
    if !delivered {
        return;
    }
    match (controller.result(), state.pending_history.take()) {
        (Some(result), Some((pending, id))) if pending == session => {
            if let Err(e) =
                db::attach_summary(conn, &id, &result.summary, result.detected_language.as_deref()).await
            {
                tracing::warn!(error = %e, "could not store summary in history");
            }
        }
        (_, pending) => state.pending_history = pending,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::fs::create_dir_all(DATA_DIR).context("creating .codelens directory")?;
    logging::init(Path::new(LOG_PATH))?;

    let config = Config::load();
    let theme = theme::Theme::from_name(&config.theme);
    tracing::info!(api = %config.api_base_url, "codelens starting");

    let conn = db::open_db(DB_PATH).await.context("opening the local database")?;
    let mut drafts = DraftCache::open(conn.clone()).await?;
    let mut state = match drafts.load().await {
        Ok(Some(draft)) => AppState::with_draft(&draft.text, draft.last_saved_at),
        Ok(None) => AppState::default(),
        Err(e) => {
            tracing::warn!(error = %e, "could not load saved draft");
            AppState::default()
        }
    };
    highlight::preload();

    let (session_tx, mut session_rx) = mpsc::unbounded_channel();
    let backend = HttpBackend::new(config.api_base_url.clone())?;
    let mut controller = AnalysisController::new(backend, config.controller_options(), session_tx);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let debounce_tx = handler.tx.clone();
    let mut gate =
        codelens_core::debounce::DebounceGate::new(config.debounce_window(), move |generation, code| {
            let _ = debounce_tx.send(AppEvent::DebounceElapsed { generation, code });
        });

    tracing::debug!(debounce_ms = gate.window().as_millis() as u64, "debounce gate ready");

    let mut loop_result: anyhow::Result<()> = Ok(());

    'event_loop: loop {
        tokio::select! {
            // Heartbeat: a quiescent terminal would otherwise never poll SIGTERM.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            Some(session_event) = session_rx.recv() => {
                on_session_event(session_event, &mut state, &mut controller, &conn).await;
                state.sync_session(controller.snapshot(), controller.can_retry(config.max_retries));
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        state.sync_session(controller.snapshot(), controller.can_retry(config.max_retries));
                        state.refresh_highlight();
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            loop_result = Err(e.into());
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => match keybindings::handle_key(key, &mut state) {
                        KeyAction::Quit => break 'event_loop,
                        KeyAction::Edited => {
                            if config.auto_analyze {
                                gate.schedule(state.code_text());
                            }
                        }
                        KeyAction::Analyze => {
                            gate.cancel();
                            analyze(&mut state, &mut controller, &conn, &config).await;
                        }
                        KeyAction::Retry => {
                            gate.cancel();
                            retry(&mut state, &mut controller, &conn, &config).await;
                        }
                        KeyAction::OpenHistory => match db::load_history(&conn, config.history_limit).await {
                            Ok(entries) => state.open_history(entries),
                            Err(e) => {
                                tracing::warn!(error = %e, "could not load history");
                                state.notify_error("Could not load history");
                            }
                        },
                        KeyAction::Continue => {}
                    },
                    Some(AppEvent::Mouse(mouse)) => keybindings::handle_mouse(mouse, &mut state),
                    Some(AppEvent::Paste(text)) => {
                        if state.paste(&text) && config.auto_analyze {
                            gate.schedule(state.code_text());
                        }
                    }
                    Some(AppEvent::DebounceElapsed { generation, code }) => {
                        // A cancel or reschedule since the send, or an edit the
                        // gate has not seen, makes the queued text stale.
                        if gate.is_current(generation) && code == state.code_text() {
                            analyze(&mut state, &mut controller, &conn, &config).await;
                        }
                    }
                    Some(AppEvent::Tick) => {
                        save_draft(&mut state, &mut drafts).await;
                        state.expire_notification(Instant::now());
                    }
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    gate.cancel();
    controller.shutdown().await;
    save_draft(&mut state, &mut drafts).await;
    tracing::info!(writes = drafts.write_count(), "codelens exiting");

    tui::restore_tui()?;
    loop_result
}
