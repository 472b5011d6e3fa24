use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StateError;
use crate::params::GenerationParams;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Generating,
    Fetching,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Generating | Self::Fetching)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is reachable from `self` in one step. A status may
    /// always be re-asserted; terminal states accept nothing else.
    pub fn can_transition(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Generating)
                | (Self::Generating, Self::Fetching)
                | (Self::Generating, Self::Failed)
                | (Self::Fetching, Self::Completed)
                | (Self::Fetching, Self::Failed)
        )
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Generating => "Generating",
            Self::Fetching => "Fetching",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

/// One tracked generation request: the parameter snapshot taken at
/// submission time plus everything the polling engine mutates while the
/// job is in flight.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Opaque token matching a queued workflow to its polled result.
    /// Never changes, never reused.
    pub correlation_id: Uuid,
    /// Store-assigned ordering id for display.
    pub sequence_id: u64,
    pub params: GenerationParams,
    status: JobStatus,
    pub attempt_count: u32,
    pub created_at: Instant,
    pub created_wall: DateTime<Utc>,
    pub completed_at: Option<Instant>,
    /// File name of the saved artifact; empty until completed.
    pub artifact_name: String,
    /// Name of the mesh this texture is destined for. Set at creation,
    /// never mutated.
    pub mesh_name: String,
}

impl JobRecord {
    pub fn new(sequence_id: u64, params: GenerationParams, mesh_name: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            sequence_id,
            params,
            status: JobStatus::Pending,
            attempt_count: 0,
            created_at: Instant::now(),
            created_wall: Utc::now(),
            completed_at: None,
            artifact_name: String::new(),
            mesh_name: mesh_name.into(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Move the record along the status state machine. Re-asserting the
    /// current status is a no-op; leaving a terminal state is rejected.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), StateError> {
        if !self.status.can_transition(next) {
            return Err(StateError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Stamp the record as successfully completed with the saved
    /// artifact's name.
    pub fn complete(&mut self, artifact_name: String) -> Result<(), StateError> {
        self.transition(JobStatus::Completed)?;
        self.artifact_name = artifact_name;
        self.completed_at = Some(Instant::now());
        Ok(())
    }

    /// Reset counters and timestamps for a user-initiated retry, keeping
    /// the job's identity (correlation id, parameters, mesh). The record
    /// re-enters the state machine at `Pending` and goes through the
    /// normal submission path again. This is the one sanctioned way out
    /// of `Failed`.
    pub fn reset_for_retry(&mut self) {
        self.attempt_count = 0;
        self.created_at = Instant::now();
        self.created_wall = Utc::now();
        self.completed_at = None;
        self.artifact_name.clear();
        self.status = JobStatus::Pending;
    }

    /// Wall time spent from submission to completion, if completed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at
            .map(|done| done.duration_since(self.created_at))
    }
}
