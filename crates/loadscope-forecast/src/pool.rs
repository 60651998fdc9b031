// ── Bounded pool of primed stats sessions ──
//
// `capacity` sessions are opened eagerly at connect time and each primed
// with the forecast library load. A weighted semaphore bounds concurrent
// leases; slot selection is first-fit over per-slot availability flags.
// Dropping a lease returns the slot and releases the permit, so a session
// is held by at most one computation at any moment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::error::ForecastError;
use crate::session::StatsSession;

/// Command issued once per session right after connect.
const LIBRARY_COMMAND: &str = "library(forecast)";

struct PooledSession {
    session: Mutex<StatsSession>,
    available: AtomicBool,
}

/// Bounded, blocking pool of stateful forecaster sessions.
pub struct SessionPool {
    slots: Vec<Arc<PooledSession>>,
    semaphore: Arc<Semaphore>,
}

/// Exclusive lease on one pooled session.
///
/// The permit and the availability flag are released on drop, including
/// the failure paths of an evaluation.
pub struct SessionLease {
    slot: Arc<PooledSession>,
    _permit: OwnedSemaphorePermit,
}

impl SessionPool {
    /// Open `capacity` sessions to the stats server and prime each one.
    ///
    /// Fails if any connection or priming command fails; a partially
    /// connected pool is not returned.
    pub async fn connect(host: &str, port: u16, capacity: usize) -> Result<Self, ForecastError> {
        let mut slots = Vec::with_capacity(capacity);
        for slot_index in 0..capacity {
            let mut session = StatsSession::connect(host, port).await?;
            session.eval(LIBRARY_COMMAND).await?;
            debug!(slot = slot_index, "stats session primed");
            slots.push(Arc::new(PooledSession {
                session: Mutex::new(session),
                available: AtomicBool::new(true),
            }));
        }
        info!(host, port, capacity, "stats session pool connected");
        Ok(Self {
            slots,
            semaphore: Arc::new(Semaphore::new(capacity)),
        })
    }

    /// Acquire a session, waiting until one is free.
    pub async fn acquire(&self) -> Result<SessionLease, ForecastError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ForecastError::PoolClosed)?;

        for slot in &self.slots {
            if slot
                .available
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(SessionLease {
                    slot: Arc::clone(slot),
                    _permit: permit,
                });
            }
        }
        // The permit guarantees a free slot; reaching this is a bug.
        Err(ForecastError::Exhausted)
    }

    /// Number of sessions the pool was built with.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Close all sessions and fail any future acquire.
    pub async fn close(&self) {
        self.semaphore.close();
        for slot in &self.slots {
            let mut session = slot.session.lock().await;
            if let Err(error) = session.shutdown().await {
                debug!(%error, "stats session shutdown failed");
            }
        }
        info!("stats session pool closed");
    }
}

impl SessionLease {
    /// Evaluate a command on the leased session.
    pub async fn eval(&self, command: &str) -> Result<String, ForecastError> {
        self.slot.session.lock().await.eval(command).await
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.slot.available.store(true, Ordering::Release);
    }
}
