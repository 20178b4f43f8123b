//! Stage progress publishing.

use slidecast_models::{Stage, StageStatus, StageUpdate};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Publishes [`StageUpdate`] events to the presentation layer.
///
/// Send failures are ignored: a dropped receiver just means nobody is
/// watching.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: UnboundedSender<StageUpdate>,
}

impl ProgressReporter {
    /// Create a reporter and the receiving end for the presentation layer.
    pub fn channel() -> (Self, UnboundedReceiver<StageUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Reporter with no listener.
    pub fn sink() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn publish(&self, stage: Stage, status: StageStatus, message: impl Into<String>, progress: u8) {
        let update = StageUpdate::new(stage, status, message, progress);
        debug!(
            stage = %update.stage,
            status = %update.status,
            progress = update.progress,
            "{}",
            update.message
        );
        let _ = self.tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_updates_reach_receiver() {
        let (reporter, mut rx) = ProgressReporter::channel();
        reporter.publish(Stage::Script, StageStatus::Processing, "Generating script...", 0);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.stage, Stage::Script);
        assert_eq!(update.status, StageStatus::Processing);
        assert_eq!(update.progress, 0);
    }

    #[test]
    fn test_sink_swallows_updates() {
        let reporter = ProgressReporter::sink();
        // No receiver; must not panic
        reporter.publish(Stage::Video, StageStatus::Completed, "done", 100);
    }
}
