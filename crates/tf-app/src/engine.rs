//! The polling engine: one self-rescheduling cycle per in-flight job.
//!
//! Every registered job gets its own task that alternates between a
//! single fetch attempt and a policy-chosen pause. The decision logic
//! lives in [`tf_core::poll`] and is pure; this module only executes
//! decisions, so swapping the [`Scheduler`] for a no-delay test double
//! exercises the whole cycle without real waiting.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use tf_core::poll::{FailureReason, FetchSignal, PollDecision, PollPolicy};
use tf_core::{JobStatus, naming};

use crate::client::{ArtifactFetch, ArtifactQuery, BackendClient};
use crate::complete;
use crate::consumer::TextureConsumer;
use crate::error::BackendError;
use crate::events::{EventSender, JobEvent};
use crate::store::SharedStore;

/// Executes the pauses between fetch attempts.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Clone)]
pub struct PollingEngine {
    store: SharedStore,
    client: Arc<BackendClient>,
    policy: PollPolicy,
    output_dir: PathBuf,
    consumer: Arc<dyn TextureConsumer>,
    events: EventSender,
    scheduler: Arc<dyn Scheduler>,
    /// Correlation ids with a live polling cycle. Guards the invariant
    /// that no job ever has two overlapping cycles.
    active: Arc<Mutex<HashSet<Uuid>>>,
}

enum Gate {
    Gone,
    Exhausted,
    Proceed(ArtifactQuery),
}

enum Finish {
    Completed,
    Gone,
    PersistFailed,
}

impl PollingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SharedStore,
        client: Arc<BackendClient>,
        policy: PollPolicy,
        output_dir: PathBuf,
        consumer: Arc<dyn TextureConsumer>,
        events: EventSender,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            store,
            client,
            policy,
            output_dir,
            consumer,
            events,
            scheduler,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start the polling cycle for a job. Returns `None` when the record
    /// is missing, already terminal, or already has a cycle running.
    pub fn register(&self, id: Uuid) -> Option<JoinHandle<()>> {
        {
            let store = self.store.lock().unwrap();
            match store.get(&id) {
                Some(record) if !record.status().is_terminal() => {}
                _ => return None,
            }
        }
        if !self.active.lock().unwrap().insert(id) {
            debug!(%id, "polling already registered");
            return None;
        }
        let engine = self.clone();
        Some(tokio::spawn(async move { engine.run_cycle(id).await }))
    }

    pub fn is_active(&self, id: &Uuid) -> bool {
        self.active.lock().unwrap().contains(id)
    }

    async fn run_cycle(self, id: Uuid) {
        loop {
            let gate = self.open_gate(id);
            match gate {
                Gate::Gone => {
                    debug!(%id, "record gone or terminal; polling stops");
                    break;
                }
                Gate::Exhausted => {
                    self.fail(id, FailureReason::AttemptsExhausted);
                    break;
                }
                Gate::Proceed(query) => {
                    let outcome = self.client.fetch_artifact(&query).await;
                    let (signal, decoded) = observe(outcome);
                    match self.policy.decide(signal) {
                        PollDecision::Complete => {
                            let Some(img) = decoded else { break };
                            match self.finish(id, &img) {
                                Finish::Completed | Finish::Gone => break,
                                Finish::PersistFailed => {
                                    self.scheduler.sleep(self.policy.recheck_delay).await;
                                }
                            }
                        }
                        PollDecision::RetryAfter(delay) => {
                            self.scheduler.sleep(delay).await;
                        }
                        PollDecision::Fail(reason) => {
                            self.fail(id, reason);
                            break;
                        }
                    }
                }
            }
        }
        self.active.lock().unwrap().remove(&id);
    }

    /// Per-attempt bookkeeping under the store lock: bump the counter,
    /// enforce the bound and mark the record as fetching.
    fn open_gate(&self, id: Uuid) -> Gate {
        let mut store = self.store.lock().unwrap();
        match store.get_mut(&id) {
            None => Gate::Gone,
            Some(record) if record.status().is_terminal() => Gate::Gone,
            Some(record) => {
                if !self.policy.attempt_allowed(record.attempt_count) {
                    return Gate::Exhausted;
                }
                record.attempt_count += 1;
                let previous = record.status();
                if record.transition(JobStatus::Fetching).is_ok()
                    && previous != JobStatus::Fetching
                {
                    let _ = self.events.send(JobEvent::StatusChanged {
                        id,
                        status: JobStatus::Fetching,
                    });
                }
                Gate::Proceed(ArtifactQuery::for_job(id))
            }
        }
    }

    /// Successful fetch: derive a free artifact name, persist the image,
    /// finalize the record and hand off to the consumer.
    fn finish(&self, id: Uuid, img: &DynamicImage) -> Finish {
        let name = {
            let store = self.store.lock().unwrap();
            let Some(record) = store.get(&id) else {
                return Finish::Gone;
            };
            naming::artifact_name(&record.params.prompt, record.sequence_id, |candidate| {
                store.is_name_taken(candidate) || self.output_dir.join(candidate).exists()
            })
        };

        if let Err(err) = complete::persist_artifact(img, &self.output_dir, &name) {
            warn!(%id, "persisting artifact failed: {err}");
            return Finish::PersistFailed;
        }

        let (mesh_name, elapsed) = {
            let mut store = self.store.lock().unwrap();
            let Some(record) = store.get_mut(&id) else {
                return Finish::Gone;
            };
            if let Err(err) = record.complete(name.clone()) {
                warn!(%id, "could not finalize record: {err}");
                return Finish::Gone;
            }
            (record.mesh_name.clone(), record.elapsed().unwrap_or_default())
        };

        let _ = self.events.send(JobEvent::StatusChanged {
            id,
            status: JobStatus::Completed,
        });
        let _ = self.events.send(JobEvent::Completed {
            id,
            artifact_name: name.clone(),
            elapsed,
        });

        // Downstream hand-off failure is reported separately; the job
        // itself stays completed since the artifact is on disk.
        if let Err(err) = self.consumer.apply_texture(&mesh_name, &name) {
            warn!(%id, "consumer rejected artifact {name}: {err}");
            let _ = self.events.send(JobEvent::ConsumerFailed {
                id,
                error: err.to_string(),
            });
        }
        Finish::Completed
    }

    fn fail(&self, id: Uuid, reason: FailureReason) {
        let mut store = self.store.lock().unwrap();
        if let Some(record) = store.get_mut(&id)
            && record.transition(JobStatus::Failed).is_ok()
        {
            warn!(%id, "job failed: {reason}");
            let _ = self.events.send(JobEvent::StatusChanged {
                id,
                status: JobStatus::Failed,
            });
            let _ = self.events.send(JobEvent::Failed {
                id,
                reason: reason.to_string(),
            });
        }
    }
}

/// Map a fetch result to the signal the policy understands, decoding the
/// body when one arrived. A body that fails to decode was most likely
/// caught mid-write on the backend and is worth re-fetching.
fn observe(
    outcome: Result<ArtifactFetch, BackendError>,
) -> (FetchSignal, Option<DynamicImage>) {
    match outcome {
        Ok(ArtifactFetch::Ready(bytes)) if bytes.is_empty() => (FetchSignal::EmptyBody, None),
        Ok(ArtifactFetch::Ready(bytes)) => match image::load_from_memory(&bytes) {
            Ok(img) => (FetchSignal::Ready, Some(img)),
            Err(err) => {
                debug!("artifact bytes failed to decode: {err}");
                (FetchSignal::CorruptBody, None)
            }
        },
        Ok(ArtifactFetch::NotReady) => (FetchSignal::NotReady, None),
        Err(BackendError::Status { status, .. }) => (FetchSignal::UnexpectedStatus(status), None),
        Err(err @ BackendError::Transport(_)) => {
            warn!("fetch attempt got no response: {err}");
            (FetchSignal::Unreachable, None)
        }
    }
}
