use serde::{Deserialize, Serialize};

/// Snapshot of the thumbnail pipeline. Replaced wholesale on every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbQueueStats {
    #[serde(default)]
    pub pending: i64,
    #[serde(default)]
    pub processing: i64,
    #[serde(default)]
    pub done: i64,
    /// Failed items cooling down before they re-enter `pending`.
    #[serde(default)]
    pub waiting: i64,
    #[serde(default)]
    pub failed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStage {
    Waiting,
    Pending,
    Processing,
    Done,
}

impl QueueStage {
    /// Stages in pipeline order.
    pub const FLOW: [QueueStage; 4] = [
        QueueStage::Waiting,
        QueueStage::Pending,
        QueueStage::Processing,
        QueueStage::Done,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QueueStage::Waiting => "Waiting",
            QueueStage::Pending => "Pending",
            QueueStage::Processing => "Processing",
            QueueStage::Done => "Done",
        }
    }
}

impl ThumbQueueStats {
    pub fn count(&self, stage: QueueStage) -> i64 {
        match stage {
            QueueStage::Waiting => self.waiting,
            QueueStage::Pending => self.pending,
            QueueStage::Processing => self.processing,
            QueueStage::Done => self.done,
        }
    }
}
