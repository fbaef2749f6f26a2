//! Progress events emitted while a pipeline run is in flight.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Pipeline event for real-time status updates
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Run accepted and about to start the first stage
    Started {
        run_id: Uuid,
        topic: String,
        at: DateTime<Utc>,
    },
    /// Checkpoint reached
    Progress {
        run_id: Uuid,
        percent: u8,
        message: String,
    },
    /// All three stages finished
    Completed { run_id: Uuid, duration_ms: u64 },
    /// A stage failed; nothing further will run
    Failed {
        run_id: Uuid,
        error: String,
        duration_ms: u64,
    },
}

impl PipelineEvent {
    pub fn started(run_id: Uuid, topic: impl Into<String>) -> Self {
        PipelineEvent::Started {
            run_id,
            topic: topic.into(),
            at: Utc::now(),
        }
    }

    pub fn progress(run_id: Uuid, percent: u8, message: impl Into<String>) -> Self {
        PipelineEvent::Progress {
            run_id,
            percent: percent.min(100),
            message: message.into(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            PipelineEvent::Started { run_id, .. } => *run_id,
            PipelineEvent::Progress { run_id, .. } => *run_id,
            PipelineEvent::Completed { run_id, .. } => *run_id,
            PipelineEvent::Failed { run_id, .. } => *run_id,
        }
    }
}
