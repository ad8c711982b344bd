//! Bounded worker pool with a one-way shutdown gate
//!
//! Tasks may submit further tasks while running, so the total number of tasks
//! is unbounded even though at most `workers` execute at once. Tasks beyond
//! that bound wait for a permit in FIFO order.
//!
//! The gate (`accepting`) and the live-task count share one mutex. Submission
//! checks the gate and bumps the count inside that critical section, and
//! [`WorkerPool::close_and_drain`] flips the gate inside it, so no task can be
//! accepted once draining has begun.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, Semaphore};

/// Gate and bookkeeping guarded by a single lock
#[derive(Debug)]
struct PoolState {
    accepting: bool,
    live: usize,
}

struct Shared {
    state: Mutex<PoolState>,
    permits: Arc<Semaphore>,
    idle: Notify,
    workers: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decrements the live count when a task ends, including by panic
struct LiveGuard {
    shared: Arc<Shared>,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.live -= 1;
        if state.live == 0 {
            self.shared.idle.notify_waiters();
        }
    }
}

/// Cloneable handle to a bounded task pool
///
/// Every clone refers to the same pool, so running tasks can hold a handle
/// and submit children through it.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Creates a pool that runs at most `workers` tasks at once
    ///
    /// Must be called from within a Tokio runtime before the first submit.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    accepting: true,
                    live: 0,
                }),
                permits: Arc::new(Semaphore::new(workers)),
                idle: Notify::new(),
                workers,
            }),
        }
    }

    /// Maximum number of tasks executing at once
    pub fn workers(&self) -> usize {
        self.shared.workers
    }

    /// Returns false once draining has begun
    pub fn is_accepting(&self) -> bool {
        self.shared.lock().accepting
    }

    /// Number of accepted tasks that have not finished yet
    pub fn live(&self) -> usize {
        self.shared.lock().live
    }

    /// Submits a task for execution
    ///
    /// Returns immediately. If the pool is draining the task is dropped
    /// unexecuted, a warning naming `label` is logged and `false` is returned.
    pub fn submit(&self, label: &str, task: BoxFuture<'static, ()>) -> bool {
        {
            let mut state = self.shared.lock();
            if !state.accepting {
                tracing::warn!("Pool is draining, dropping task: {}", label);
                return false;
            }
            state.live += 1;
        }

        let guard = LiveGuard {
            shared: Arc::clone(&self.shared),
        };
        let permits = Arc::clone(&self.shared.permits);
        let label = label.to_string();

        tokio::spawn(async move {
            let _guard = guard;
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Task {} panicked: {}", label, message);
            }
        });

        true
    }

    /// Waits until no accepted task is live, leaving the gate open
    ///
    /// Returns immediately if the pool is already idle. Since new tasks are
    /// only submitted by running ones (or by the caller), an idle pool stays
    /// idle until the caller submits again.
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.shared.idle.notified();
            if self.shared.lock().live == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Stops accepting tasks, then waits until every accepted task has finished
    ///
    /// Tasks accepted before the gate closed may still submit children while
    /// draining; those submissions are refused. Returns the number of tasks
    /// that were live when the gate closed.
    pub async fn close_and_drain(&self) -> usize {
        let live_at_close = {
            let mut state = self.shared.lock();
            state.accepting = false;
            state.live
        };
        tracing::info!(
            "Pool closed to new tasks, draining {} live task(s)",
            live_at_close
        );

        // Nothing can be accepted past this point, so idle means drained
        self.wait_idle().await;

        tracing::info!("Pool drained");
        live_at_close
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("WorkerPool")
            .field("workers", &self.shared.workers)
            .field("accepting", &state.accepting)
            .field("live", &state.live)
            .finish()
    }
}
