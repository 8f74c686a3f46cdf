//! In-memory job registry.
//!
//! Records live for the lifetime of the process: nothing is evicted and
//! nothing survives a restart.

use crate::models::Job;
use dashmap::DashMap;
use std::sync::Arc;

/// Cloneable handle to the shared job map.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<DashMap<String, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record stored under `job.id`.
    pub fn put(&self, job: Job) {
        self.jobs.insert(job.id.clone(), job);
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
