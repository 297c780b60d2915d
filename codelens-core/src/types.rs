//! Data model shared by the controller, the store, and the UI.
//!
//! `AnalysisResult` is the only type built from untrusted input. It is decoded
//! from the streamed JSON through [`AnalysisResult::from_json`], which rejects
//! wrong field types and normalises `detected_language` to lowercase.

use serde::Deserialize;

use crate::error::AnalysisError;
use crate::language::Language;

/// The in-progress code text owned by the input surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeDraft {
    pub text: String,
    pub detected_language: Option<Language>,
    /// Unix timestamp seconds of the last successful save.
    pub last_saved_at: Option<i64>,
}

/// Severity of a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugKind {
    Error,
    Warning,
    Suggestion,
}

impl BugKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BugKind::Error => "error",
            BugKind::Warning => "warning",
            BugKind::Suggestion => "suggestion",
        }
    }
}

/// One issue found by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bug {
    #[serde(rename = "type")]
    pub kind: BugKind,
    pub message: String,
    /// 1-based line in the submitted code, when the service reports one.
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogicStep {
    pub step: u32,
    pub description: String,
}

/// The full explanation delivered by the result channel. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default, alias = "detectedLanguage")]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    #[serde(default)]
    pub variables: Vec<VariableInfo>,
    #[serde(default, alias = "logicFlow")]
    pub logic_flow: Vec<LogicStep>,
    #[serde(default)]
    pub bugs: Vec<Bug>,
}

/// Error payload the service may push instead of a result.
#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

impl AnalysisResult {
    /// Decodes and validates one streamed message.
    ///
    /// A `{ "error": "..." }` payload becomes [`AnalysisError::Channel`] with the
    /// service's detail; anything else that does not decode becomes
    /// [`AnalysisError::MalformedResult`].
    pub fn from_json(text: &str) -> Result<Self, AnalysisError> {
        match serde_json::from_str::<AnalysisResult>(text) {
            Ok(mut result) => {
                result.detected_language = result
                    .detected_language
                    .map(|l| l.trim().to_lowercase())
                    .filter(|l| !l.is_empty());
                Ok(result)
            }
            Err(e) => match serde_json::from_str::<ErrorPayload>(text) {
                Ok(payload) => Err(AnalysisError::Channel(payload.error)),
                Err(_) => Err(AnalysisError::MalformedResult(e.to_string())),
            },
        }
    }

    /// The reported language, when it is one the UI knows how to highlight.
    pub fn language(&self) -> Option<Language> {
        self.detected_language.as_deref().and_then(Language::from_tag)
    }

    /// Counts of (errors, warnings, suggestions).
    pub fn bug_counts(&self) -> (usize, usize, usize) {
        self.bugs.iter().fold((0, 0, 0), |(e, w, s), bug| match bug.kind {
            BugKind::Error => (e + 1, w, s),
            BugKind::Warning => (e, w + 1, s),
            BugKind::Suggestion => (e, w, s + 1),
        })
    }
}

/// Lifecycle of one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Complete,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Error)
    }

    /// True while a request or channel is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, SessionStatus::Connecting | SessionStatus::Streaming)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Complete => "complete",
            SessionStatus::Error => "error",
        }
    }
}

/// Read model of the current session, rebuilt for every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub analysis_id: Option<String>,
    pub progress_percent: f64,
    pub stage_label: String,
    pub result: Option<AnalysisResult>,
    pub retry_count: u32,
    pub error: Option<AnalysisError>,
}

/// A past submission kept in the local history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String, // UUID v4 text
    pub code: String,
    pub language: Option<String>,
    pub summary: Option<String>,
    pub submitted_at: i64, // Unix timestamp seconds
}
