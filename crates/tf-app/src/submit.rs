use std::sync::Arc;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use tf_core::{GenerationParams, JobStatus};

use crate::client::BackendClient;
use crate::engine::PollingEngine;
use crate::error::SubmitError;
use crate::events::{EventSender, JobEvent};
use crate::store::SharedStore;
use crate::workflow;

/// Seeds are drawn uniformly from this range when randomization is on.
pub const SEED_RANGE: std::ops::RangeInclusive<u32> = 1..=1_000_000;

fn draw_seed() -> u32 {
    rand::rng().random_range(SEED_RANGE)
}

/// The submission step: snapshots parameters into a job record, builds
/// the workflow payload and queues it on the backend. Polling is only
/// registered after the backend accepted the submission; on any failure
/// the record stays `Pending` and the error goes back to the caller.
pub struct Submitter {
    store: SharedStore,
    client: Arc<BackendClient>,
    engine: PollingEngine,
    events: EventSender,
}

impl Submitter {
    pub fn new(
        store: SharedStore,
        client: Arc<BackendClient>,
        engine: PollingEngine,
        events: EventSender,
    ) -> Self {
        Self {
            store,
            client,
            engine,
            events,
        }
    }

    /// Submit a new job for `mesh_name` built from the live parameters.
    ///
    /// With seed randomization enabled a fresh seed is drawn and written
    /// into the live parameters *before* the snapshot is taken, so the
    /// record, the payload and the user's settings all agree on it.
    pub async fn submit(
        &self,
        live: &mut GenerationParams,
        mesh_name: &str,
    ) -> Result<Uuid, SubmitError> {
        if live.random_seed {
            live.seed = draw_seed();
        }
        let snapshot = live.snapshot_for_submission();

        let (id, sequence_id) = {
            let mut store = self.store.lock().unwrap();
            let id = store.create(snapshot, mesh_name);
            let sequence_id = store.get(&id).map(|r| r.sequence_id).unwrap_or_default();
            (id, sequence_id)
        };
        let _ = self.events.send(JobEvent::Queued { id, sequence_id });

        self.dispatch(id, false).await?;
        Ok(id)
    }

    /// Re-run a failed job under its existing identity: counters and
    /// timestamps reset, correlation id, parameters and mesh preserved.
    pub async fn retry(&self, id: Uuid) -> Result<(), SubmitError> {
        {
            let mut store = self.store.lock().unwrap();
            let record = store.get_mut(&id).ok_or(SubmitError::UnknownJob(id))?;
            if record.status() != JobStatus::Failed {
                return Err(SubmitError::NotSubmittable {
                    id,
                    status: record.status(),
                });
            }
            record.reset_for_retry();
        }
        self.dispatch(id, true).await
    }

    /// Common tail of submit and retry: build the payload from the
    /// record's snapshot, send it, and on acceptance move the record to
    /// `Generating` and hand it to the polling engine.
    async fn dispatch(&self, id: Uuid, randomize: bool) -> Result<(), SubmitError> {
        let params = {
            let mut store = self.store.lock().unwrap();
            let record = store.get_mut(&id).ok_or(SubmitError::UnknownJob(id))?;
            if record.status() != JobStatus::Pending {
                return Err(SubmitError::NotSubmittable {
                    id,
                    status: record.status(),
                });
            }
            if randomize && record.params.random_seed {
                record.params.seed = draw_seed();
            }
            record.params.clone()
        };

        let graph = workflow::build_workflow(&params, id)?;
        let ack = self.client.submit_workflow(&graph).await?;

        {
            let mut store = self.store.lock().unwrap();
            if let Some(record) = store.get_mut(&id) {
                let _ = record.transition(JobStatus::Generating);
            }
        }
        let _ = self.events.send(JobEvent::StatusChanged {
            id,
            status: JobStatus::Generating,
        });
        let _ = self.events.send(JobEvent::Submitted {
            id,
            prompt_id: ack.prompt_id.clone(),
        });
        info!(%id, prompt_id = %ack.prompt_id, "workflow queued");

        self.engine.register(id);
        Ok(())
    }
}
