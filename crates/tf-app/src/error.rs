use thiserror::Error;
use uuid::Uuid;

use tf_core::JobStatus;

/// Failures from a single backend HTTP call. One variant per cause the
/// polling engine distinguishes: no response at all vs. an unexpected
/// status code.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl BackendError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Failures while building a workflow graph from a template.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("workflow template is not valid JSON: {0}")]
    Template(#[from] serde_json::Error),

    #[error("workflow template has no node {0}")]
    MissingNode(String),
}

/// Failures of the submission step. The job record stays `Pending` and
/// polling is never registered; the caller decides what to do next.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("job {0} not found in store")]
    UnknownJob(Uuid),

    #[error("job {id} cannot be submitted while {status:?}")]
    NotSubmittable { id: Uuid, status: JobStatus },

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("backend rejected the workflow: {0}")]
    Backend(#[from] BackendError),
}

/// Failures while persisting a fetched artifact to disk.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("could not create output directory: {0}")]
    OutputDir(std::io::Error),

    #[error("could not write artifact: {0}")]
    Write(#[from] image::ImageError),
}
