//! Structured session logging.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Session logger with consistent contextual fields.
///
/// Mirrors the stage methods so log lines carry the session id and the
/// operation being run without repeating boilerplate at every call site.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    operation: String,
}

impl SessionLogger {
    pub fn new(session_id: &Uuid, operation: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            "Stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            operation = %self.operation,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            operation = %self.operation,
            "Stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            "Stage completed: {}", message
        );
    }

    /// Create a tracing span carrying the session context.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            session_id = %self.session_id,
            operation = %self.operation
        )
    }
}
