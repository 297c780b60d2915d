//! Error taxonomy for codelens-core.
//!
//! Three families, one per boundary: [`AnalysisError`] for everything that can go
//! wrong talking to the analysis service, [`ValidationError`] for code rejected
//! before any request is made, and [`StorageError`] for the local SQLite store.

use std::time::Duration;

use thiserror::Error;

/// Which half of the exchange an [`AnalysisError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// The request that obtains an `analysis_id` failed.
    Submission,
    /// The result channel failed or delivered something unusable.
    Streaming,
}

/// Failures of a single analysis exchange.
///
/// `Clone` so the same error can be stored in the session snapshot and shown
/// in a notification without re-formatting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("could not reach the analysis service: {0}")]
    Transport(String),

    #[error("analysis service returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("analysis was not accepted: {0}")]
    Rejected(String),

    #[error("malformed response from the analysis service: {0}")]
    MalformedResponse(String),

    #[error("result channel failed: {0}")]
    Channel(String),

    #[error("result channel closed before a result arrived")]
    ChannelClosed,

    #[error("malformed analysis result: {0}")]
    MalformedResult(String),

    #[error("no result after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl AnalysisError {
    /// Classifies the error as a submission or streaming failure.
    pub fn stage(&self) -> ErrorStage {
        match self {
            AnalysisError::Transport(_)
            | AnalysisError::Http { .. }
            | AnalysisError::Rejected(_)
            | AnalysisError::MalformedResponse(_) => ErrorStage::Submission,
            AnalysisError::Channel(_)
            | AnalysisError::ChannelClosed
            | AnalysisError::MalformedResult(_)
            | AnalysisError::Timeout(_) => ErrorStage::Streaming,
        }
    }
}

/// Code rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("code is {chars} characters long (limit {limit})")]
    TooLarge { chars: usize, limit: usize },

    #[error("code has {lines} lines (limit {limit})")]
    TooManyLines { lines: usize, limit: usize },

    #[error("unbalanced '{open}{close}': {opened} opened, {closed} closed")]
    Unbalanced {
        open: char,
        close: char,
        opened: usize,
        closed: usize,
    },
}

/// Failures of the local SQLite store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local store error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),

    #[error("local store error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("local store directory: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_split_on_the_session_id_boundary() {
        assert_eq!(AnalysisError::Rejected("rate limited".into()).stage(), ErrorStage::Submission);
        assert_eq!(AnalysisError::Transport("refused".into()).stage(), ErrorStage::Submission);
        assert_eq!(AnalysisError::ChannelClosed.stage(), ErrorStage::Streaming);
        assert_eq!(
            AnalysisError::Timeout(Duration::from_secs(5)).stage(),
            ErrorStage::Streaming
        );
    }

    #[test]
    fn timeout_message_is_in_seconds() {
        let e = AnalysisError::Timeout(Duration::from_secs(120));
        assert_eq!(e.to_string(), "no result after 120s");
    }
}
