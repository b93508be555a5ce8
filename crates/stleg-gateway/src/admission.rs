use std::time::Instant;

use stleg_core::Tier;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::config::PrioritySplit;

/// Bounds the gateway's concurrent in-flight requests (spec §4.F). A request
/// that finds no permit available waits cooperatively rather than failing —
/// this is the only stage in the pipeline allowed to block on a shared
/// resource.
pub struct AdmissionController {
    sponsor: Semaphore,
    free: Option<Semaphore>,
}

pub struct AdmissionPermit<'a> {
    _permit: SemaphorePermit<'a>,
    pub wait_time: std::time::Duration,
}

impl AdmissionController {
    #[must_use]
    pub fn new(total_permits: usize, split: Option<PrioritySplit>) -> Self {
        match split {
            Some(split) => Self {
                sponsor: Semaphore::new(split.sponsor_permits),
                free: Some(Semaphore::new(split.free_permits)),
            },
            None => Self {
                sponsor: Semaphore::new(total_permits),
                free: None,
            },
        }
    }

    /// Acquire a permit for `tier`. A PL token draws from the sponsor pool;
    /// a PUL token (no tier) draws from the free pool when the controller is
    /// split, or the single shared pool otherwise.
    pub async fn acquire(&self, tier: Option<Tier>) -> AdmissionPermit<'_> {
        let start = Instant::now();
        let pool = match (&self.free, tier) {
            (Some(free), None) => free,
            _ => &self.sponsor,
        };
        let permit = pool
            .acquire()
            .await
            .expect("admission semaphore is never closed");
        AdmissionPermit {
            _permit: permit,
            wait_time: start.elapsed(),
        }
    }
}
