//! Backfill worker pool.
//!
//! Jobs are queued on a bounded channel and picked up by a fixed number of
//! tokio tasks. `submit` waits when the queue is full. Each submitted job gets
//! a [`JobHandle`] whose `cancel` is observed between days.
//!
//! Shutdown is not cancellation: in-flight runs are dropped where they stand
//! and stay RUNNING, queued jobs stay PENDING, and both are picked up again by
//! `resume_interrupted` / `submit_pending` on the next start.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::backfill::BackfillService;
use super::prices_model::PricePopulationJob;
use crate::errors::{DomainError, Result};
use crate::Error;

/// Cancellation handle for a submitted job.
#[derive(Clone)]
pub struct JobHandle {
    job_id: String,
    cancel: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("job_id", &self.job_id)
            .field("cancelled", &*self.cancel.borrow())
            .finish()
    }
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Asks the job to stop before its next day. The job ends FAILED with
    /// message "cancelled".
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

struct QueuedJob {
    job_id: String,
    cancel: watch::Receiver<bool>,
}

type HandleMap = Arc<Mutex<HashMap<String, JobHandle>>>;

fn lock_handles(handles: &HandleMap) -> MutexGuard<'_, HashMap<String, JobHandle>> {
    handles.lock().unwrap_or_else(|poisoned| {
        warn!("Backfill handle map mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

pub struct BackfillWorker {
    service: Arc<BackfillService>,
    sender: mpsc::Sender<QueuedJob>,
    handles: HandleMap,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl BackfillWorker {
    /// Spawns `workers` tasks serving a queue of `queue_capacity` jobs.
    /// Must be called inside a tokio runtime.
    pub fn start(service: Arc<BackfillService>, workers: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<QueuedJob>(queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let handles: HandleMap = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let tasks = (0..workers.max(1))
            .map(|worker_id| {
                let service = service.clone();
                let receiver = receiver.clone();
                let handles = handles.clone();
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    loop {
                        let next = tokio::select! {
                            next = async { receiver.lock().await.recv().await } => next,
                            _ = shutdown_rx.changed() => None,
                        };
                        let Some(queued) = next else {
                            break;
                        };
                        debug!("Worker {} picked up job {}", worker_id, queued.job_id);
                        tokio::select! {
                            result = service.run_job(&queued.job_id, queued.cancel) => match result {
                                Ok(job) => info!(
                                    "Worker {} finished job {} as {}",
                                    worker_id, job.id, job.status
                                ),
                                Err(e) => error!(
                                    "Worker {} stopped job {}: {}",
                                    worker_id, queued.job_id, e
                                ),
                            },
                            _ = shutdown_rx.changed() => {
                                info!(
                                    "Worker {} interrupted job {} for shutdown",
                                    worker_id, queued.job_id
                                );
                                break;
                            }
                        }
                        lock_handles(&handles).remove(&queued.job_id);
                    }
                    debug!("Backfill worker {} exiting", worker_id);
                })
            })
            .collect();

        info!(
            "Started {} backfill workers (queue capacity {})",
            workers.max(1),
            queue_capacity.max(1)
        );
        Self {
            service,
            sender,
            handles,
            shutdown,
            tasks,
        }
    }

    /// Queues a job. Submitting a job that is already queued or running
    /// returns the existing handle.
    pub async fn submit(&self, job_id: &str) -> Result<JobHandle> {
        let job = self.service.get_job(job_id)?;
        if job.is_terminal() {
            return Err(DomainError::JobTerminal {
                job_id: job.id,
                status: job.status.to_string(),
            }
            .into());
        }

        let (handle, receiver) = {
            let mut handles = lock_handles(&self.handles);
            if let Some(existing) = handles.get(job_id) {
                return Ok(existing.clone());
            }
            let (cancel, receiver) = watch::channel(false);
            let handle = JobHandle {
                job_id: job_id.to_string(),
                cancel: Arc::new(cancel),
            };
            handles.insert(job_id.to_string(), handle.clone());
            (handle, receiver)
        };

        let queued = QueuedJob {
            job_id: job_id.to_string(),
            cancel: receiver,
        };
        if self.sender.send(queued).await.is_err() {
            lock_handles(&self.handles).remove(job_id);
            return Err(Error::Unexpected(
                "Backfill worker is shut down".to_string(),
            ));
        }
        debug!("Queued backfill job {}", job_id);
        Ok(handle)
    }

    /// Handle for a queued or running job.
    pub fn handle(&self, job_id: &str) -> Option<JobHandle> {
        lock_handles(&self.handles).get(job_id).cloned()
    }

    async fn submit_all(&self, jobs: Vec<PricePopulationJob>) -> Result<Vec<JobHandle>> {
        let mut submitted = Vec::with_capacity(jobs.len());
        for job in jobs {
            submitted.push(self.submit(&job.id).await?);
        }
        Ok(submitted)
    }

    /// Re-queues jobs a previous process left RUNNING. They continue from
    /// their saved cursor.
    pub async fn resume_interrupted(&self) -> Result<Vec<JobHandle>> {
        let jobs = self.service.interrupted_jobs()?;
        if !jobs.is_empty() {
            info!("Resuming {} interrupted backfill jobs", jobs.len());
        }
        self.submit_all(jobs).await
    }

    pub async fn submit_pending(&self) -> Result<Vec<JobHandle>> {
        let jobs = self.service.pending_jobs()?;
        self.submit_all(jobs).await
    }

    /// Stops the workers and waits for them to exit. Unfinished jobs keep
    /// their persisted state.
    pub async fn shutdown(self) {
        let unfinished = lock_handles(&self.handles).len();
        self.shutdown.send_replace(true);
        drop(self.sender);
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                error!("Backfill worker task panicked: {}", e);
            }
        }
        info!(
            "Backfill workers stopped ({} jobs left for the next start)",
            unfinished
        );
    }
}
