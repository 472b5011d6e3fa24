use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use tf_core::{GenerationParams, JobRecord};

/// In-memory collection of job records, keyed by correlation id.
///
/// The store itself is not synchronized; share it as a [`SharedStore`]
/// and keep lock scopes short. Records are never auto-expired: removal
/// only happens through [`remove`](Self::remove) or
/// [`clear_terminal`](Self::clear_terminal).
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<Uuid, JobRecord>,
    next_sequence: u64,
}

pub type SharedStore = Arc<Mutex<JobStore>>;

pub fn shared() -> SharedStore {
    Arc::new(Mutex::new(JobStore::new()))
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new record from a parameter snapshot. Returns the fresh
    /// correlation id; sequence ids are handed out monotonically and
    /// never reused.
    pub fn create(&mut self, params: GenerationParams, mesh_name: impl Into<String>) -> Uuid {
        let record = JobRecord::new(self.next_sequence, params, mesh_name);
        self.next_sequence += 1;
        let id = record.correlation_id;
        self.jobs.insert(id, record);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut JobRecord> {
        self.jobs.get_mut(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.jobs.contains_key(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<JobRecord> {
        self.jobs.remove(id)
    }

    /// All records ordered by sequence id (submission order).
    pub fn list(&self) -> Vec<&JobRecord> {
        let mut records: Vec<_> = self.jobs.values().collect();
        records.sort_by_key(|r| r.sequence_id);
        records
    }

    /// Drop completed and failed records, keeping in-flight ones.
    /// Returns how many were removed.
    pub fn clear_terminal(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, record| !record.status().is_terminal());
        before - self.jobs.len()
    }

    /// Whether any record already claimed this artifact name.
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.jobs
            .values()
            .any(|record| record.artifact_name == name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
