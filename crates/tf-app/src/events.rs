use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use tf_core::JobStatus;

/// Job lifecycle notifications for the UI/consumer layer.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Queued {
        id: Uuid,
        sequence_id: u64,
    },
    /// The backend accepted the workflow and queued it.
    Submitted {
        id: Uuid,
        prompt_id: String,
    },
    StatusChanged {
        id: Uuid,
        status: JobStatus,
    },
    Completed {
        id: Uuid,
        artifact_name: String,
        elapsed: Duration,
    },
    Failed {
        id: Uuid,
        reason: String,
    },
    /// The artifact was saved but the downstream consumer rejected it.
    /// The job still counts as completed.
    ConsumerFailed {
        id: Uuid,
        error: String,
    },
}

pub type EventSender = mpsc::UnboundedSender<JobEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<JobEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
