pub mod error;
pub mod job;
pub mod naming;
pub mod params;
pub mod poll;

pub use error::StateError;
pub use job::{JobRecord, JobStatus};
pub use params::{DiffScheduler, GenerationParams, LoraConfig, Sampler};
pub use poll::{FailureReason, FetchSignal, PollDecision, PollPolicy};
