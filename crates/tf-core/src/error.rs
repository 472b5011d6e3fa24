use thiserror::Error;

use crate::job::JobStatus;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition { from: JobStatus, to: JobStatus },
}
